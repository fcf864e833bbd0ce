//! Rewind engine.
//!
//! Every operation here starts by discarding buffered lookahead: the driver's
//! own lookahead token and everything queued inside the lexer. A token
//! buffered before a rewind was scanned in a lexer state that no longer
//! holds, so consuming it afterwards would desynchronize the automaton from
//! the cursor.
//!
//! Nothing here returns an error. Recovery records a diagnostic, moves the
//! cursor and lets the automaton carry on.

use super::Driver;
use crate::builder::Builder;
use crate::diagnostics::DiagnosticClass;
use crate::lexer::{Lexer, ResumeState, Token};
use crate::text::TextSize;
use crate::token_names::display_name;
use std::cmp::Ordering;

impl<L: Lexer, B: Builder> Driver<L, B> {
    /// Move the lexer cursor to `offset`, resuming in `state`
    pub fn rewind_to(&mut self, offset: TextSize, state: ResumeState) {
        self.clear_lookahead();
        let moved_back = self.scan_high_water - offset;
        self.stats.backtracks += 1;
        self.stats.bytes_reprocessed += moved_back.to_usize();
        self.stats.last_rewind = Some(offset);
        tracing::debug!(
            offset = %offset,
            ?state,
            moved_back = %moved_back,
            "rewinding lexer"
        );
        self.lexer.rewind_and_reset(offset, state);
        self.scan_high_water = offset;
    }

    /// Rewind to `offset` as if an expression just ended there
    pub fn rewind_and_reset(&mut self, offset: TextSize) {
        self.rewind_to(offset, ResumeState::ExprEnd);
    }

    /// Rewind to `offset` as if an expression may begin there
    pub fn rewind_and_reset_to_beg(&mut self, offset: TextSize) {
        self.rewind_to(offset, ResumeState::ExprBeg);
    }

    fn within_reprocess_limit(&self, offset: TextSize) -> bool {
        let Some(limit) = self.config.reprocess_limit else {
            return true;
        };
        let moved_back = (self.scan_high_water - offset).to_usize();
        self.stats.bytes_reprocessed + moved_back <= limit
    }

    /// Put `token` back so it is the next token the automaton sees
    pub fn unadvance(&mut self, token: Token) {
        self.clear_lookahead();
        self.stats.unadvances += 1;
        tracing::debug!(kind = ?token.kind, at = %token.range, "unadvancing token");
        self.lexer.unadvance(token);
    }

    /// Resume scanning at the start of `token`.
    ///
    /// There is nothing left to scan at end of file, so the sentinel is put
    /// back instead.
    pub fn rewind_to_tok_start(&mut self, token: &Token) {
        if token.is_eof() {
            self.unadvance(*token);
        } else {
            self.rewind_and_reset(token.start());
        }
    }

    /// Resume scanning right after `token`; the sentinel is put back instead
    pub fn rewind_to_tok_end(&mut self, token: &Token) {
        if token.is_eof() {
            self.unadvance(*token);
        } else {
            self.rewind_and_reset(token.end());
        }
    }

    /// Check that `end` closes the construct opened by `begin`.
    ///
    /// Only acts when the driver is indentation-aware or `force` is set. An
    /// `end` indented at least as far as `begin` is accepted. Otherwise the
    /// cursor goes back to the start of `end`, so an enclosing construct can
    /// claim it, and the construct is reported as unclosed.
    pub fn validate_end_indent(&mut self, begin: &Token, end: &Token, force: bool) {
        if !force && !self.config.indentation_aware {
            return;
        }

        if !end.is_eof() && self.lexer.compare_indent_level(begin, end) != Ordering::Greater {
            return;
        }

        self.rewind_to_tok_start(end);

        let name = display_name(begin.kind);
        if end.is_eof() {
            self.diagnostics
                .record(DiagnosticClass::EOFInsteadOfEnd, *begin, [name], None);
        } else {
            self.diagnostics
                .record(DiagnosticClass::DedentedEnd, *begin, [name], Some(*end));
        }
    }

    /// Check that `second` is on the same line as `first`.
    ///
    /// Returns true when it isn't and the driver recovered: the cursor is
    /// back at the end of `first` and a `DefMissingName` diagnostic names it.
    /// At end of file this records an internal error and returns false
    /// without touching the cursor.
    pub fn validate_same_line(&mut self, first: &Token, second: &Token) -> bool {
        if second.is_eof() {
            self.diagnostics.record(
                DiagnosticClass::InternalError,
                *second,
                ["validate_same_line called on the end-of-file sentinel"],
                None,
            );
            return false;
        }

        if !self.config.indentation_aware {
            return false;
        }

        if first.line_start == second.line_start {
            return false;
        }

        self.rewind_and_reset(first.end());

        self.diagnostics.record(
            DiagnosticClass::DefMissingName,
            *first,
            [display_name(first.kind)],
            Some(*second),
        );
        true
    }

    /// Reconcile a definition body with the indentation of its `end`.
    ///
    /// `begin` opened the construct, whose header ends at `header_end`.
    /// `body_start` is the first token of the body and `last_before_dedent`
    /// the last token before the first statement indented no deeper than
    /// `begin`, if there is one. `end` is the token that closed the body,
    /// possibly the end-of-file sentinel.
    ///
    /// When `end` is misplaced the body is cut back to what the indentation
    /// says belongs to the construct and the cursor is moved so the rest is
    /// parsed again by the enclosing construct:
    ///
    /// - no body: resume at `end`
    /// - body not indented past `begin`: empty body, resume after the header
    /// - a dedented statement: keep the statements before it and resume after
    ///   `last_before_dedent`; if the builder can't split the body, fall back
    ///   to an empty body and resume after the header
    /// - otherwise only `end` was misplaced: keep the body, resume at `end`
    ///
    /// Past the configured reprocessing limit the last case applies to every
    /// misplaced body.
    #[allow(clippy::too_many_arguments)]
    pub fn reconcile_body_indent(
        &mut self,
        root: &B::Root,
        begin: &Token,
        header_end: TextSize,
        body: Option<B::Node>,
        body_start: &Token,
        last_before_dedent: Option<&Token>,
        end: &Token,
    ) -> Option<B::Node> {
        if !self.config.indentation_aware {
            return body;
        }

        if !end.is_eof() && self.lexer.compare_indent_level(begin, end) != Ordering::Greater {
            return body;
        }

        let name = display_name(begin.kind);
        if end.is_eof() {
            self.diagnostics
                .record(DiagnosticClass::EOFInsteadOfEnd, *begin, [name], None);
        } else {
            self.diagnostics
                .record(DiagnosticClass::DedentedEnd, *begin, [name], Some(*end));
        }

        let Some(body) = body else {
            self.rewind_to_tok_start(end);
            return None;
        };

        let unindented = self.lexer.compare_indent_level(body_start, begin) != Ordering::Greater;
        let target = match last_before_dedent {
            _ if unindented => header_end,
            Some(marker) => marker.end(),
            None => end.start(),
        };
        if !self.within_reprocess_limit(target) {
            tracing::warn!(
                at = %begin.range,
                spent = self.stats.bytes_reprocessed,
                "reprocessing limit reached; keeping the body whole"
            );
            self.rewind_to_tok_start(end);
            return Some(body);
        }

        if unindented {
            self.rewind_and_reset(header_end);
            return Some(self.builder.empty_statement_list(root));
        }

        if let Some(marker) = last_before_dedent {
            if let Some(truncated) = self.builder.truncate_body_stmt(root, &body, marker) {
                self.rewind_and_reset(marker.end());
                return Some(truncated);
            }
            tracing::debug!(
                at = %begin.range,
                "body has clauses that can't be truncated; using an empty body"
            );
            self.rewind_and_reset(header_end);
            return Some(self.builder.empty_statement_list(root));
        }

        self.rewind_to_tok_start(end);
        Some(body)
    }
}
