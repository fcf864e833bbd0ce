//! Hand-written scanner for the Ruby subset.
//!
//! The scanner is context sensitive: the same spelling lexes differently
//! depending on [`LexState`]. A `-` where an expression may begin is unary,
//! after an operand it is binary; `foo -1` with a space before and none after
//! is read as a command argument, the way Ruby reads it.

use super::{Lexer, ResumeState, StackState, Token, TokenKind};
use crate::config::RubyVersion;
use crate::diagnostics::{DiagnosticClass, DiagnosticLevel, Diagnostics};
use crate::text::{LineIndex, TextRange, TextSize};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashSet;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Where the scanner is within an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexState {
    /// An expression may begin; newlines are insignificant
    Beg,
    /// After `return`: an expression may begin, but a newline ends the statement
    Mid,
    /// An operand just ended
    End,
    /// After a method name that may take command arguments
    Arg,
    /// After `def`; a method name follows
    Fname,
    /// After `.` or `::`; a method or constant name follows
    Dot,
}

type LocalSet = HashSet<CompactString, RandomState>;

/// Reference [`Lexer`] over a source string
#[derive(Debug)]
pub struct Scanner<'src> {
    source: &'src str,
    version: RubyVersion,
    line_index: LineIndex,
    cursor: usize,
    state: LexState,
    queue: VecDeque<Token>,
    cmdarg: StackState,
    cond: StackState,
    static_env: Vec<LocalSet>,
    emitted_before_eof: bool,
    trace: bool,
    indentation_warnings: bool,
    // Rescanning after a rewind must not report the same problem twice.
    reported: HashSet<(TextSize, DiagnosticClass), RandomState>,
}

#[inline]
const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

#[inline]
const fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

#[inline]
const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | 0x0b | 0x0c)
}

impl<'src> Scanner<'src> {
    #[must_use]
    pub fn new(source: &'src str, version: RubyVersion) -> Self {
        Self {
            source,
            version,
            line_index: LineIndex::new(source),
            cursor: 0,
            state: LexState::Beg,
            queue: VecDeque::new(),
            cmdarg: StackState::new(),
            cond: StackState::new(),
            static_env: Vec::new(),
            emitted_before_eof: false,
            trace: false,
            indentation_warnings: false,
            reported: HashSet::default(),
        }
    }

    /// Emit a `trace` event for every scanned token
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Warn about lines whose indentation mixes tabs and spaces
    #[must_use]
    pub fn with_indentation_warnings(mut self, enabled: bool) -> Self {
        self.indentation_warnings = enabled;
        self
    }

    #[must_use]
    pub const fn state(&self) -> LexState {
        self.state
    }

    pub fn set_state(&mut self, state: LexState) {
        self.state = state;
    }

    #[must_use]
    pub const fn version(&self) -> RubyVersion {
        self.version
    }

    /// Offset the next scan starts from
    #[must_use]
    pub fn cursor(&self) -> TextSize {
        TextSize::of(self.cursor)
    }

    #[must_use]
    pub const fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Width of the leading whitespace on the line `token` starts on.
    /// Sentinel tokens sit at column 0.
    fn indent_of(&self, token: &Token) -> usize {
        if token.is_eof() {
            return 0;
        }
        self.source.as_bytes()[token.line_start.to_usize()..]
            .iter()
            .take_while(|&&b| b == b' ' || b == b'\t')
            .count()
    }

    #[inline]
    fn byte_at(&self, pos: usize) -> Option<u8> {
        self.source.as_bytes().get(pos).copied()
    }

    fn make(&self, kind: TokenKind, start: usize, end: usize) -> Token {
        let start = TextSize::of(start);
        Token::new(
            kind,
            TextRange::new(start, TextSize::of(end)),
            self.line_index.line_start_of(start),
        )
    }

    fn report(
        &mut self,
        diagnostics: &mut Diagnostics,
        class: DiagnosticClass,
        primary: Token,
        args: &[&str],
    ) {
        if self.reported.insert((primary.start(), class)) {
            diagnostics.record(class, primary, args.iter().copied(), None);
        }
    }

    fn eof_token(&mut self) -> Token {
        let len = self.source.len();
        if self.emitted_before_eof {
            self.make(TokenKind::EndOfInput, len, len)
        } else {
            self.emitted_before_eof = true;
            self.make(TokenKind::BeforeEof, len, len)
        }
    }

    /// True where an operator spelling should take its prefix form:
    /// at the beginning of an expression, or after a command name with a
    /// space before the operator and none after it.
    fn prefix_position(&self, space_before: bool, after_op: usize) -> bool {
        match self.state {
            LexState::Beg | LexState::Mid => true,
            LexState::Arg => {
                space_before && self.byte_at(after_op).is_some_and(|b| !is_space(b) && b != b'\n')
            }
            _ => false,
        }
    }

    /// A newline followed by an indented `.method` continues the expression
    fn continues_with_dot(&self) -> bool {
        let bytes = self.source.as_bytes();
        let mut pos = self.cursor;
        while bytes.get(pos).is_some_and(|&b| is_space(b)) {
            pos += 1;
        }
        bytes.get(pos) == Some(&b'.') && bytes.get(pos + 1) != Some(&b'.')
    }

    fn scan(&mut self, diagnostics: &mut Diagnostics) -> Token {
        loop {
            let mut space_before = false;
            let c = loop {
                let Some(c) = self.byte_at(self.cursor) else {
                    return self.eof_token();
                };
                match c {
                    _ if is_space(c) => {
                        self.cursor += 1;
                        space_before = true;
                    }
                    b'\\' if self.byte_at(self.cursor + 1) == Some(b'\n') => {
                        self.cursor += 2;
                        space_before = true;
                    }
                    b'#' => {
                        while self.byte_at(self.cursor).is_some_and(|b| b != b'\n') {
                            self.cursor += 1;
                        }
                    }
                    b'\n' => {
                        let start = self.cursor;
                        self.cursor += 1;
                        if matches!(self.state, LexState::Beg | LexState::Fname | LexState::Dot)
                            || self.continues_with_dot()
                        {
                            space_before = true;
                            continue;
                        }
                        self.state = LexState::Beg;
                        return self.make(TokenKind::Newline, start, start + 1);
                    }
                    _ => break c,
                }
            };

            let start = self.cursor;
            let token = match c {
                b'0'..=b'9' => Some(self.scan_number(start)),
                b'"' | b'\'' => Some(self.scan_string(start, c, TokenKind::String, diagnostics)),
                b'@' => self.scan_ivar(start, diagnostics),
                b'$' => self.scan_gvar(start, diagnostics),
                b':' => self.scan_colon(start, space_before, diagnostics),
                _ if is_ident_start(c) => Some(self.scan_identifier(start)),
                _ => self.scan_punct(start, c, space_before, diagnostics),
            };

            if let Some(token) = token {
                if self.indentation_warnings {
                    self.check_indentation(&token, diagnostics);
                }
                return token;
            }
        }
    }

    fn check_indentation(&mut self, token: &Token, diagnostics: &mut Diagnostics) {
        let source = self.source;
        let leading = &source.as_bytes()[token.line_start.to_usize()..token.start().to_usize()];
        if !leading.iter().all(|&b| b == b' ' || b == b'\t') {
            return;
        }
        if leading.contains(&b' ')
            && leading.contains(&b'\t')
            && self
                .reported
                .insert((token.line_start, DiagnosticClass::InconsistentIndentation))
        {
            diagnostics.record_with_level(
                DiagnosticLevel::Warning,
                DiagnosticClass::InconsistentIndentation,
                *token,
                std::iter::empty::<&str>(),
                None,
            );
        }
    }

    fn scan_word(&self, start: usize) -> usize {
        let mut end = start;
        while self.byte_at(end).is_some_and(is_ident_char) {
            end += 1;
        }
        // predicate and bang method names, but not `foo!=`/`foo?=`
        if matches!(self.byte_at(end), Some(b'?' | b'!')) && self.byte_at(end + 1) != Some(b'=') {
            end += 1;
        }
        end
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        let end = self.scan_word(start);
        self.cursor = end;
        let source = self.source;
        let text = &source[start..end];
        let constant = text.as_bytes()[0].is_ascii_uppercase();
        let name_kind = if constant {
            TokenKind::Constant
        } else {
            TokenKind::Identifier
        };

        let (kind, next_state) = match self.state {
            LexState::Dot => (name_kind, LexState::Arg),
            LexState::Fname if text == "self" => (TokenKind::KwSelf, LexState::End),
            LexState::Fname => (name_kind, LexState::End),
            _ => match TokenKind::keyword(text) {
                Some(TokenKind::KwDo) if self.cond.is_active() => {
                    (TokenKind::KwDoCond, LexState::Beg)
                }
                Some(TokenKind::KwDef) => (TokenKind::KwDef, LexState::Fname),
                Some(kw @ (TokenKind::KwReturn | TokenKind::KwRescue)) => (kw, LexState::Mid),
                Some(
                    kw @ (TokenKind::KwEnd
                    | TokenKind::KwSelf
                    | TokenKind::KwNil
                    | TokenKind::KwTrue
                    | TokenKind::KwFalse),
                ) => (kw, LexState::End),
                Some(kw) => (kw, LexState::Beg),
                None if !constant && self.is_declared(text) => (name_kind, LexState::End),
                None => (name_kind, LexState::Arg),
            },
        };
        self.state = next_state;
        self.make(kind, start, end)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        let mut end = start;
        while self.byte_at(end).is_some_and(|b| b.is_ascii_digit() || b == b'_') {
            end += 1;
        }
        if self.byte_at(end) == Some(b'.')
            && self.byte_at(end + 1).is_some_and(|b| b.is_ascii_digit())
        {
            end += 1;
            while self.byte_at(end).is_some_and(|b| b.is_ascii_digit() || b == b'_') {
                end += 1;
            }
        }
        self.cursor = end;
        self.state = LexState::End;
        self.make(TokenKind::Integer, start, end)
    }

    fn scan_string(
        &mut self,
        start: usize,
        quote: u8,
        kind: TokenKind,
        diagnostics: &mut Diagnostics,
    ) -> Token {
        // `start` may point at a `:` prefix; the quote follows it
        let mut pos = if self.byte_at(start) == Some(quote) {
            start + 1
        } else {
            start + 2
        };
        loop {
            match self.byte_at(pos) {
                None => {
                    self.cursor = self.source.len();
                    self.state = LexState::End;
                    let token = self.make(kind, start, self.cursor);
                    self.report(diagnostics, DiagnosticClass::UnterminatedString, token, &[]);
                    return token;
                }
                Some(b'\\') => pos = (pos + 2).min(self.source.len()),
                Some(b) if b == quote => {
                    self.cursor = pos + 1;
                    self.state = LexState::End;
                    return self.make(kind, start, self.cursor);
                }
                Some(_) => pos += 1,
            }
        }
    }

    fn unexpected_char(&mut self, start: usize, diagnostics: &mut Diagnostics) {
        let source = self.source;
        let len = source[start..].chars().next().map_or(1, char::len_utf8);
        let end = start + len;
        let token = self.make(TokenKind::Identifier, start, end);
        self.report(
            diagnostics,
            DiagnosticClass::UnexpectedChar,
            token,
            &[&source[start..end]],
        );
        self.cursor = end;
    }

    fn scan_ivar(&mut self, start: usize, diagnostics: &mut Diagnostics) -> Option<Token> {
        let sigils = if self.byte_at(start + 1) == Some(b'@') { 2 } else { 1 };
        if !self.byte_at(start + sigils).is_some_and(is_ident_start) {
            self.unexpected_char(start, diagnostics);
            return None;
        }
        let mut end = start + sigils;
        while self.byte_at(end).is_some_and(is_ident_char) {
            end += 1;
        }
        self.cursor = end;
        self.state = LexState::End;
        Some(self.make(TokenKind::IVar, start, end))
    }

    fn scan_gvar(&mut self, start: usize, diagnostics: &mut Diagnostics) -> Option<Token> {
        let (kind, end) = match self.byte_at(start + 1) {
            Some(b'&' | b'`' | b'\'' | b'+') => (TokenKind::BackRef, start + 2),
            Some(b) if b.is_ascii_digit() => {
                let mut end = start + 1;
                while self.byte_at(end).is_some_and(|b| b.is_ascii_digit()) {
                    end += 1;
                }
                (TokenKind::BackRef, end)
            }
            Some(b) if is_ident_start(b) => {
                let mut end = start + 1;
                while self.byte_at(end).is_some_and(is_ident_char) {
                    end += 1;
                }
                (TokenKind::GVar, end)
            }
            _ => {
                self.unexpected_char(start, diagnostics);
                return None;
            }
        };
        self.cursor = end;
        self.state = LexState::End;
        Some(self.make(kind, start, end))
    }

    fn scan_colon(
        &mut self,
        start: usize,
        space_before: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Token> {
        match self.byte_at(start + 1) {
            Some(b':') => {
                let kind = if self.prefix_position(space_before, start + 2) {
                    TokenKind::Colon3
                } else {
                    TokenKind::Colon2
                };
                self.cursor = start + 2;
                self.state = LexState::Dot;
                Some(self.make(kind, start, start + 2))
            }
            Some(q @ (b'"' | b'\'')) => {
                Some(self.scan_string(start, q, TokenKind::Symbol, diagnostics))
            }
            Some(b) if is_ident_start(b) => {
                let mut end = self.scan_word(start + 1);
                if self.byte_at(end) == Some(b'=')
                    && !matches!(self.byte_at(end + 1), Some(b'=' | b'>'))
                {
                    end += 1;
                }
                self.cursor = end;
                self.state = LexState::End;
                Some(self.make(TokenKind::Symbol, start, end))
            }
            _ => {
                self.unexpected_char(start, diagnostics);
                None
            }
        }
    }

    fn scan_punct(
        &mut self,
        start: usize,
        c: u8,
        space_before: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<Token> {
        let next = self.byte_at(start + 1);
        let call_position =
            !space_before && matches!(self.state, LexState::Arg | LexState::End);

        let (kind, len, state) = match c {
            b'+' | b'-' => {
                let unary = self.prefix_position(space_before, start + 1);
                let kind = match (c, unary) {
                    (b'+', true) => TokenKind::UPlus,
                    (b'+', false) => TokenKind::Plus,
                    (_, true) => TokenKind::UMinus,
                    (_, false) => TokenKind::Minus,
                };
                (kind, 1, LexState::Beg)
            }
            b'*' if next == Some(b'*') => (TokenKind::Pow, 2, LexState::Beg),
            b'*' if self.prefix_position(space_before, start + 1) => {
                (TokenKind::Star, 1, LexState::Beg)
            }
            b'*' => (TokenKind::Star2, 1, LexState::Beg),
            b'&' if self.prefix_position(space_before, start + 1) => {
                (TokenKind::Amper, 1, LexState::Beg)
            }
            b'&' => (TokenKind::Amper2, 1, LexState::Beg),
            b'/' => (TokenKind::Divide, 1, LexState::Beg),
            b'.' if next == Some(b'.') => {
                let len = if self.byte_at(start + 2) == Some(b'.') { 3 } else { 2 };
                let beginless = self.version.has_beginless_ranges()
                    && self.prefix_position(space_before, start + len);
                let kind = match (len, beginless) {
                    (2, true) => TokenKind::BDot2,
                    (2, false) => TokenKind::Dot2,
                    (_, true) => TokenKind::BDot3,
                    (_, false) => TokenKind::Dot3,
                };
                (kind, len, LexState::Beg)
            }
            b'.' => (TokenKind::Dot, 1, LexState::Dot),
            b'(' if call_position => (TokenKind::LParen, 1, LexState::Beg),
            b'(' => (TokenKind::LParen2, 1, LexState::Beg),
            b')' => (TokenKind::RParen, 1, LexState::End),
            b'[' if call_position || self.state == LexState::End => {
                (TokenKind::LBrack, 1, LexState::Beg)
            }
            b'[' => (TokenKind::LBrack2, 1, LexState::Beg),
            b']' => (TokenKind::RBrack, 1, LexState::End),
            b',' => (TokenKind::Comma, 1, LexState::Beg),
            b';' => (TokenKind::Semi, 1, LexState::Beg),
            b'=' if next == Some(b'=') => (TokenKind::Eq, 2, LexState::Beg),
            b'=' if next == Some(b'>') => (TokenKind::Assoc, 2, LexState::Beg),
            b'=' => (TokenKind::Eql, 1, LexState::Beg),
            b'<' => (TokenKind::Lt, 1, LexState::Beg),
            b'>' => (TokenKind::Gt, 1, LexState::Beg),
            b'|' => (TokenKind::Pipe, 1, LexState::Beg),
            _ => {
                self.unexpected_char(start, diagnostics);
                return None;
            }
        };

        self.cursor = start + len;
        self.state = state;
        Some(self.make(kind, start, start + len))
    }
}

impl Lexer for Scanner<'_> {
    fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token {
        if let Some(token) = self.queue.pop_front() {
            return token;
        }
        let token = self.scan(diagnostics);
        if self.trace {
            tracing::trace!(
                kind = ?token.kind,
                range = %token.range,
                state = ?self.state,
                "scanned token"
            );
        }
        token
    }

    fn clear_queue(&mut self) {
        self.queue.clear();
    }

    fn rewind_and_reset(&mut self, offset: TextSize, state: ResumeState) {
        let mut cursor = offset.to_usize().min(self.source.len());
        while !self.source.is_char_boundary(cursor) {
            cursor -= 1;
        }
        self.cursor = cursor;
        self.state = match state {
            ResumeState::ExprBeg => LexState::Beg,
            ResumeState::ExprEnd => LexState::End,
        };
        self.queue.clear();
        self.emitted_before_eof = false;
    }

    /// Unadvanced tokens are returned before anything else in the queue
    fn unadvance(&mut self, token: Token) {
        self.queue.push_front(token);
    }

    fn compare_indent_level(&self, a: &Token, b: &Token) -> Ordering {
        self.indent_of(a).cmp(&self.indent_of(b))
    }

    fn cmdarg(&self) -> &StackState {
        &self.cmdarg
    }

    fn cond(&self) -> &StackState {
        &self.cond
    }

    fn push_cmdarg(&mut self, flag: bool) {
        self.cmdarg.push(flag);
    }

    fn pop_cmdarg(&mut self) {
        self.cmdarg.pop();
    }

    fn push_cond(&mut self, flag: bool) {
        self.cond.push(flag);
    }

    fn pop_cond(&mut self) {
        self.cond.pop();
    }

    fn extend_static(&mut self) {
        self.static_env.push(LocalSet::default());
    }

    fn unextend(&mut self) {
        self.static_env.pop();
    }

    fn declare(&mut self, name: &str) {
        if self.static_env.is_empty() {
            self.static_env.push(LocalSet::default());
        }
        if let Some(scope) = self.static_env.last_mut() {
            scope.insert(CompactString::from(name));
        }
    }

    /// Only the innermost scope is consulted; every scope the driver opens
    /// is a hard scope.
    fn is_declared(&self, name: &str) -> bool {
        self.static_env
            .last()
            .is_some_and(|scope| scope.contains(name))
    }

    fn source(&self) -> &str {
        self.source
    }
}
