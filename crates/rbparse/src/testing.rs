//! # Test Doubles
//!
//! [`ScriptedAutomaton`] replays a fixed list of driver calls instead of
//! recognizing a grammar. It lets tests exercise the rewind engine, the scope
//! stack and the diagnostics log through exactly the calls a real automaton
//! would make, and inspect what the driver handed back.
//!
//! Steps refer to tokens by their position in the list of tokens the script
//! consumed so far, so `Step::ValidateEndIndent { begin: 0, end: 3, .. }`
//! checks the fourth consumed token against the first.
//!
//! ```
//! use rbparse::builder::{AstBuilder, ParseRoot};
//! use rbparse::config::RubyVersion;
//! use rbparse::driver::Driver;
//! use rbparse::testing::{ScriptedAutomaton, Step};
//!
//! let mut driver = Driver::new(RubyVersion::Ruby31, "def f\nend", AstBuilder::new(), false, true);
//! let mut script = ScriptedAutomaton::<AstBuilder>::scripted(
//!     ParseRoot::default(),
//!     vec![Step::Advance, Step::Advance, Step::Advance, Step::Advance],
//! );
//! driver.parse_with(&mut script, false).unwrap();
//! assert_eq!(script.consumed().len(), 4);
//! ```

use crate::automaton::Automaton;
use crate::builder::Builder;
use crate::driver::Driver;
use crate::lexer::{Lexer, Token};
use crate::text::TextSize;
use compact_str::CompactString;

/// One scripted driver call. `N` is the builder's node handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<N> {
    /// Consume the next token
    Advance,
    /// Record the next token without consuming it
    Peek,
    EnterScope,
    ExitScope,
    Declare(CompactString),
    EnterDef,
    ExitDef,
    ReportUnexpected(usize),
    ClearPendingError,
    ValidateEndIndent {
        begin: usize,
        end: usize,
        force: bool,
    },
    ValidateSameLine {
        first: usize,
        second: usize,
    },
    /// `body` is `None` for a construct without a body; otherwise the
    /// statements are wrapped in a statement list
    ReconcileBodyIndent {
        begin: usize,
        header_end: usize,
        body: Option<Vec<N>>,
        body_start: usize,
        last_before_dedent: Option<usize>,
        end: usize,
    },
    RewindAndReset(TextSize),
    RewindAndResetToBeg(TextSize),
    RewindToTokStart(usize),
    RewindToTokEnd(usize),
    Unadvance(usize),
    /// Store an empty statement list as the result
    SetResult,
}

/// An [`Automaton`] replaying a list of [`Step`]s
pub struct ScriptedAutomaton<B: Builder> {
    root: B::Root,
    steps: Vec<Step<B::Node>>,
    trace_level: u8,
    consumed: Vec<Token>,
    peeked: Vec<Token>,
    same_line: Vec<bool>,
    bodies: Vec<Option<B::Node>>,
    skipped: usize,
}

impl<B: Builder> ScriptedAutomaton<B> {
    #[must_use]
    pub fn scripted(root: B::Root, steps: Vec<Step<B::Node>>) -> Self {
        Self {
            root,
            steps,
            trace_level: 0,
            consumed: Vec::new(),
            peeked: Vec::new(),
            same_line: Vec::new(),
            bodies: Vec::new(),
            skipped: 0,
        }
    }

    /// Tokens consumed by `Advance` steps, in order
    #[must_use]
    pub fn consumed(&self) -> &[Token] {
        &self.consumed
    }

    /// Tokens seen by `Peek` steps, in order
    #[must_use]
    pub fn peeked(&self) -> &[Token] {
        &self.peeked
    }

    /// Results of `ValidateSameLine` steps
    #[must_use]
    pub fn same_line_results(&self) -> &[bool] {
        &self.same_line
    }

    /// Bodies returned by `ReconcileBodyIndent` steps
    #[must_use]
    pub fn bodies(&self) -> &[Option<B::Node>] {
        &self.bodies
    }

    /// Steps skipped because they referred to a token never consumed
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub const fn trace_level(&self) -> u8 {
        self.trace_level
    }

    fn token(&self, index: usize) -> Option<Token> {
        self.consumed.get(index).copied()
    }

    fn replay<L: Lexer>(&mut self, driver: &mut Driver<L, B>, step: Step<B::Node>) -> Option<()> {
        match step {
            Step::Advance => self.consumed.push(driver.advance()),
            Step::Peek => self.peeked.push(driver.peek()),
            Step::EnterScope => driver.enter_scope(),
            Step::ExitScope => driver.exit_scope(),
            Step::Declare(name) => driver.declare_local(&name),
            Step::EnterDef => driver.enter_def(),
            Step::ExitDef => driver.exit_def(),
            Step::ReportUnexpected(index) => driver.report_unexpected(self.token(index)?),
            Step::ClearPendingError => driver.clear_pending_error(),
            Step::ValidateEndIndent { begin, end, force } => {
                let (begin, end) = (self.token(begin)?, self.token(end)?);
                driver.validate_end_indent(&begin, &end, force);
            }
            Step::ValidateSameLine { first, second } => {
                let (first, second) = (self.token(first)?, self.token(second)?);
                let recovered = driver.validate_same_line(&first, &second);
                self.same_line.push(recovered);
            }
            Step::ReconcileBodyIndent {
                begin,
                header_end,
                body,
                body_start,
                last_before_dedent,
                end,
            } => {
                let begin = self.token(begin)?;
                let header_end = self.token(header_end)?.end();
                let body_start = self.token(body_start)?;
                let marker = match last_before_dedent {
                    Some(index) => Some(self.token(index)?),
                    None => None,
                };
                let end = self.token(end)?;
                let body = body.map(|stmts| driver.builder_mut().compstmt(&self.root, stmts));
                let body = driver.reconcile_body_indent(
                    &self.root,
                    &begin,
                    header_end,
                    body,
                    &body_start,
                    marker.as_ref(),
                    &end,
                );
                self.bodies.push(body);
            }
            Step::RewindAndReset(offset) => driver.rewind_and_reset(offset),
            Step::RewindAndResetToBeg(offset) => driver.rewind_and_reset_to_beg(offset),
            Step::RewindToTokStart(index) => driver.rewind_to_tok_start(&self.token(index)?),
            Step::RewindToTokEnd(index) => driver.rewind_to_tok_end(&self.token(index)?),
            Step::Unadvance(index) => driver.unadvance(self.token(index)?),
            Step::SetResult => {
                let result = driver.builder_mut().empty_statement_list(&self.root);
                driver.set_result(result);
            }
        }
        Some(())
    }
}

impl<L: Lexer, B: Builder> Automaton<L, B> for ScriptedAutomaton<B> {
    fn new(root: B::Root) -> Self {
        Self::scripted(root, Vec::new())
    }

    fn set_trace_level(&mut self, level: u8) {
        self.trace_level = level;
    }

    fn run(&mut self, driver: &mut Driver<L, B>) {
        let steps = std::mem::take(&mut self.steps);
        for (index, step) in steps.into_iter().enumerate() {
            if self.trace_level > 0 {
                tracing::trace!(index, ?step, "replaying step");
            }
            if self.replay(driver, step).is_none() {
                tracing::warn!(index, "step refers to a token that was never consumed");
                self.skipped += 1;
            }
        }
    }
}

impl<B: Builder> std::fmt::Debug for ScriptedAutomaton<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedAutomaton")
            .field("steps", &self.steps.len())
            .field("consumed", &self.consumed)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}
