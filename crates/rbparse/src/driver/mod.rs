//! # Parser Driver
//!
//! The driver sits between a grammar automaton, a lexer and a builder.
//!
//! ## Overview
//!
//! The automaton pulls tokens through [`Driver::peek`] and
//! [`Driver::advance`], builds nodes through the builder, and calls back into
//! the driver when it recognizes a construct whose shape depends on
//! indentation. The driver then decides whether the construct is properly
//! closed and, if it isn't, moves the lexer cursor back so the automaton
//! re-reads the source with a better guess (see the rewind engine in
//! `rewind.rs`).
//!
//! The driver owns:
//!
//! - the lexer and the one-token lookahead buffered in front of it
//! - the [`Diagnostics`] log
//! - the [`ScopeStack`]
//! - the builder, and through it every node built during the parse
//!
//! A driver parses its source once. Everything it allocated is freed when it
//! is dropped.
//!
//! ## Cost
//!
//! Rewinding makes parsing super-linear on malformed input: `D` nested
//! constructs that all close at the wrong indentation can be scanned up to
//! `D` times each. [`ParseStats`] tracks how much was rescanned.

mod rewind;
mod stats;

pub use stats::ParseStats;

use crate::automaton::Automaton;
use crate::builder::Builder;
use crate::config::{DriverConfig, RubyVersion, Variant};
use crate::diagnostics::{DiagnosticClass, Diagnostics};
use crate::error::{DriverError, DriverResult};
use crate::lexer::{Lexer, Scanner, Token, TokenKind};
use crate::scope::ScopeStack;
use crate::text::TextSize;
use crate::token_names::display_name;
use compact_str::CompactString;

pub struct Driver<L: Lexer, B: Builder> {
    lexer: L,
    builder: B,
    diagnostics: Diagnostics,
    scopes: ScopeStack,
    config: DriverConfig,
    lookahead: Option<Token>,
    def_level: usize,
    pending_error: bool,
    ast: Option<B::Node>,
    parsed: bool,
    stats: ParseStats,
    // furthest offset scanned since the last rewind
    scan_high_water: TextSize,
}

impl<'src, B: Builder> Driver<Scanner<'src>, B> {
    /// Driver over the reference scanner
    #[must_use]
    pub fn new(
        version: RubyVersion,
        source: &'src str,
        builder: B,
        trace_lexer: bool,
        indentation_aware: bool,
    ) -> Self {
        let config = DriverConfig::new()
            .with_version(version)
            .with_trace_lexer(trace_lexer)
            .with_indentation_aware(indentation_aware);
        Self::from_source(source, builder, config)
    }

    #[must_use]
    pub fn from_source(source: &'src str, builder: B, config: DriverConfig) -> Self {
        let lexer = Scanner::new(source, config.version)
            .with_trace(config.trace_lexer)
            .with_indentation_warnings(config.indentation_aware);
        Self::with_lexer(lexer, builder, config)
    }
}

impl<L: Lexer, B: Builder> Driver<L, B> {
    #[must_use]
    pub fn with_lexer(lexer: L, builder: B, config: DriverConfig) -> Self {
        Self {
            lexer,
            builder,
            diagnostics: Diagnostics::new(),
            scopes: ScopeStack::new(),
            config,
            lookahead: None,
            def_level: 0,
            pending_error: false,
            ast: None,
            parsed: false,
            stats: ParseStats::new(),
            scan_high_water: TextSize::zero(),
        }
    }

    /// Run an automaton of type `A` constructed with `root` over the source.
    ///
    /// Returns the tree the automaton stored with [`set_result`](Self::set_result),
    /// if any. Source errors don't fail the parse; read them from
    /// [`diagnostics`](Self::diagnostics).
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyParsed`] if this driver already ran.
    pub fn parse<A: Automaton<L, B>>(
        &mut self,
        root: B::Root,
        trace_parser: bool,
    ) -> DriverResult<Option<B::Node>> {
        let mut automaton = A::new(root);
        self.parse_with(&mut automaton, trace_parser)
    }

    /// Like [`parse`](Self::parse), with an automaton the caller constructed
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::AlreadyParsed`] if this driver already ran.
    pub fn parse_with<A: Automaton<L, B>>(
        &mut self,
        automaton: &mut A,
        trace_parser: bool,
    ) -> DriverResult<Option<B::Node>> {
        if self.parsed {
            return Err(DriverError::AlreadyParsed);
        }
        self.parsed = true;

        if self.config.variant == Variant::Debug {
            automaton.set_trace_level(u8::from(trace_parser));
        }

        tracing::debug!(
            variant = ?self.config.variant,
            indentation_aware = self.config.indentation_aware,
            "parse started"
        );
        automaton.run(self);
        self.close_leftover_scopes();
        self.stats.max_depth = self.scopes.max_depth();
        tracing::debug!(
            diagnostics = self.diagnostics.len(),
            rewinds = self.stats.backtracks,
            "parse finished"
        );

        Ok(self.ast.take())
    }

    fn close_leftover_scopes(&mut self) {
        let leftover = self.scopes.depth();
        if leftover == 0 {
            return;
        }
        let at = self.peek();
        let detail = format!("{leftover} scope(s) still open when parsing finished");
        self.diagnostics
            .record(DiagnosticClass::InternalError, at, [detail], None);
        while !self.scopes.is_empty() {
            self.scopes.exit(&mut self.lexer);
        }
    }

    // ---- token flow ----

    /// The next token, without consuming it
    pub fn peek(&mut self) -> Token {
        if let Some(token) = self.lookahead {
            return token;
        }
        let token = self.lexer.next_token(&mut self.diagnostics);
        self.stats.tokens_lexed += 1;
        self.scan_high_water = self.scan_high_water.max(token.end());
        self.lookahead = Some(token);
        token
    }

    #[must_use]
    pub fn peek_kind(&mut self) -> TokenKind {
        self.peek().kind
    }

    /// Consume and return the next token
    pub fn advance(&mut self) -> Token {
        let token = self.peek();
        self.lookahead = None;
        self.stats.tokens_consumed += 1;
        token
    }

    /// Consume the next token if it has kind `kind`
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        (self.peek_kind() == kind).then(|| self.advance())
    }

    /// Drop the driver's lookahead token and everything queued in the lexer
    pub fn clear_lookahead(&mut self) {
        self.lookahead = None;
        self.lexer.clear_queue();
    }

    // ---- scopes ----

    pub fn enter_scope(&mut self) {
        self.scopes.enter(&mut self.lexer);
    }

    /// # Panics
    ///
    /// Panics if no scope is open.
    pub fn exit_scope(&mut self) {
        self.scopes.exit(&mut self.lexer);
    }

    pub fn declare_local(&mut self, name: &str) {
        self.scopes.declare(&mut self.lexer, name);
    }

    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes.is_declared(name)
    }

    /// Open a loop condition; a `do` read inside it closes the condition
    pub fn push_cond(&mut self, flag: bool) {
        self.scopes.push_cond(&mut self.lexer, flag);
    }

    pub fn pop_cond(&mut self) {
        self.scopes.pop_cond(&mut self.lexer);
    }

    /// Open command arguments; a `do` read inside them belongs to the command
    pub fn push_cmdarg(&mut self, flag: bool) {
        self.scopes.push_cmdarg(&mut self.lexer, flag);
    }

    pub fn pop_cmdarg(&mut self) {
        self.scopes.pop_cmdarg(&mut self.lexer);
    }

    #[must_use]
    pub const fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    // ---- definition nesting ----

    pub fn enter_def(&mut self) {
        self.def_level += 1;
    }

    pub fn exit_def(&mut self) {
        self.def_level = self.def_level.saturating_sub(1);
    }

    #[must_use]
    pub const fn def_level(&self) -> usize {
        self.def_level
    }

    #[must_use]
    pub const fn in_def(&self) -> bool {
        self.def_level > 0
    }

    // ---- errors ----

    /// Record an unexpected token unless an error is already pending.
    /// Either way an error is pending afterwards.
    pub fn report_unexpected(&mut self, token: Token) {
        if !self.pending_error {
            self.diagnostics.record(
                DiagnosticClass::UnexpectedToken,
                token,
                [display_name(token.kind)],
                None,
            );
        }
        self.pending_error = true;
    }

    /// End suppression of follow-on syntax errors
    pub fn clear_pending_error(&mut self) {
        self.pending_error = false;
    }

    #[must_use]
    pub const fn pending_error(&self) -> bool {
        self.pending_error
    }

    /// Append a diagnostic
    pub fn record<I, S>(
        &mut self,
        class: DiagnosticClass,
        primary: Token,
        args: I,
        secondary: Option<Token>,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.diagnostics.record(class, primary, args, secondary);
    }

    // ---- result ----

    /// Store the parse result. The first result stored wins; storing another
    /// one is reported as an internal error.
    pub fn set_result(&mut self, node: B::Node) {
        if self.ast.is_some() {
            let at = self.peek();
            self.diagnostics.record(
                DiagnosticClass::InternalError,
                at,
                ["parse result stored twice"],
                None,
            );
            return;
        }
        self.ast = Some(node);
    }

    // ---- accessors ----

    #[must_use]
    pub const fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    #[must_use]
    pub const fn indentation_aware(&self) -> bool {
        self.config.indentation_aware
    }

    #[must_use]
    pub const fn stats(&self) -> &ParseStats {
        &self.stats
    }

    #[must_use]
    pub const fn lexer(&self) -> &L {
        &self.lexer
    }

    #[must_use]
    pub const fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    #[must_use]
    pub fn source(&self) -> &str {
        self.lexer.source()
    }

    /// Source text of `token`
    #[must_use]
    pub fn text(&self, token: &Token) -> &str {
        token.text(self.lexer.source())
    }

    /// Split the driver into its builder and diagnostics
    #[must_use]
    pub fn into_parts(self) -> (B, Diagnostics) {
        (self.builder, self.diagnostics)
    }
}

impl<L: Lexer + std::fmt::Debug, B: Builder + std::fmt::Debug> std::fmt::Debug for Driver<L, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("config", &self.config)
            .field("lookahead", &self.lookahead)
            .field("def_level", &self.def_level)
            .field("pending_error", &self.pending_error)
            .field("scopes", &self.scopes.depth())
            .field("diagnostics", &self.diagnostics.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
