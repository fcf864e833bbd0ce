//! Statements, bodies and the constructs closed by `end`.

use super::Automaton;
use super::expressions::{LOWEST, can_start_operand};
use crate::builder::{AstBuilder, Builder, ConstScope, NodeId, NodeKind, ParamKind, ParseRoot};
use crate::diagnostics::DiagnosticClass;
use crate::driver::Driver;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use std::cmp::Ordering;

pub(super) type AstDriver<L> = Driver<L, AstBuilder>;

pub(super) fn text_of<L: Lexer>(d: &AstDriver<L>, token: &Token) -> CompactString {
    CompactString::from(d.text(token))
}

const fn is_separator(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Newline | TokenKind::Semi)
}

/// Tokens that close some construct
const fn is_closer(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::KwEnd
            | TokenKind::KwElse
            | TokenKind::KwElsif
            | TokenKind::KwRescue
            | TokenKind::KwEnsure
            | TokenKind::RParen
            | TokenKind::RBrack
    )
}

pub(super) struct StatementList {
    pub(super) stmts: Vec<NodeId>,
    /// First token of the list; the closer when the list is empty
    start: Token,
    /// Last token before the first statement indented no deeper than the opener
    last_before_dedent: Option<Token>,
}

/// A body with its optional `rescue`, `else` and `ensure` clauses
struct BodyParts {
    body: Option<NodeId>,
    start: Token,
    last_before_dedent: Option<Token>,
}

/// Reference automaton for the Ruby subset.
///
/// Recursive descent over statements and definitions, with expressions parsed
/// by precedence climbing. Method, class and module bodies are checked
/// against the indentation of their `end` through
/// [`Driver::reconcile_body_indent`]; conditionals, loops, `begin` and `do`
/// blocks through [`Driver::validate_end_indent`].
#[derive(Debug, Clone)]
pub struct DefinitionGrammar {
    pub(super) root: ParseRoot,
    trace_level: u8,
    depth: usize,
    // consumed tokens, trimmed back whenever the driver rewinds
    pub(super) history: Vec<Token>,
}

impl DefinitionGrammar {
    #[must_use]
    pub fn new(root: ParseRoot) -> Self {
        Self {
            root,
            trace_level: 0,
            depth: 0,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn trace_level(&self) -> u8 {
        self.trace_level
    }

    #[must_use]
    pub const fn root(&self) -> &ParseRoot {
        &self.root
    }

    fn enter_rule(&mut self, rule: &'static str) {
        if self.trace_level > 0 {
            tracing::trace!(
                rule,
                depth = self.depth,
                after = ?self.history.last().map(|t| t.range),
                "enter rule"
            );
        }
        self.depth += 1;
    }

    fn exit_rule(&mut self, rule: &'static str) {
        self.depth = self.depth.saturating_sub(1);
        if self.trace_level > 0 {
            tracing::trace!(rule, depth = self.depth, "exit rule");
        }
    }

    // ---- token flow ----

    pub(super) fn bump<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> Token {
        let token = d.advance();
        self.history.push(token);
        token
    }

    pub(super) fn eat<L: Lexer>(&mut self, d: &mut AstDriver<L>, kind: TokenKind) -> Option<Token> {
        if d.peek_kind() == kind {
            Some(self.bump(d))
        } else {
            None
        }
    }

    /// Consume a token of kind `kind`, reporting the next token otherwise
    pub(super) fn expect<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        kind: TokenKind,
    ) -> Option<Token> {
        let token = self.eat(d, kind);
        if token.is_none() {
            let next = d.peek();
            d.report_unexpected(next);
        }
        token
    }

    /// Forget consumed tokens the driver rewound over
    fn resync<L: Lexer>(&mut self, d: &mut AstDriver<L>) {
        let next = d.peek().start();
        while self.history.last().is_some_and(|t| t.start() >= next) {
            self.history.pop();
        }
    }

    fn last_significant(&self) -> Option<Token> {
        self.history
            .iter()
            .rev()
            .find(|t| !is_separator(t.kind) && !t.is_eof())
            .copied()
    }

    /// End of the last consumed token that isn't a separator
    pub(super) fn last_end(&self, fallback: &Token) -> TextSize {
        self.last_significant()
            .map_or_else(|| fallback.end(), |t| t.end())
    }

    fn skip_separators<L: Lexer>(&mut self, d: &mut AstDriver<L>) {
        while is_separator(d.peek_kind()) {
            self.bump(d);
            d.clear_pending_error();
        }
    }

    pub(super) fn skip_newlines<L: Lexer>(&mut self, d: &mut AstDriver<L>) {
        while d.peek_kind() == TokenKind::Newline {
            self.bump(d);
        }
    }

    // ---- statements ----

    /// Statements up to a token in `closers` or end of input.
    ///
    /// Outside the top level, `end` always stops the list so the enclosing
    /// construct can claim it. With an `opener`, the list also tracks where
    /// the body first dedents to the opener's indentation.
    pub(super) fn parse_statements<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        opener: Option<&Token>,
        closers: &[TokenKind],
    ) -> StatementList {
        let top_level = opener.is_none() && closers.is_empty();
        let mut stmts = Vec::new();
        let mut last_before_dedent = None;

        self.skip_separators(d);
        let start = d.peek();

        loop {
            self.skip_separators(d);
            let next = d.peek();
            if next.is_eof()
                || closers.contains(&next.kind)
                || (next.kind == TokenKind::KwEnd && !top_level)
            {
                break;
            }
            if is_closer(next.kind) {
                d.report_unexpected(next);
                self.bump(d);
                continue;
            }

            if let Some(opener) = opener
                && last_before_dedent.is_none()
                && d.lexer().compare_indent_level(&next, opener) != Ordering::Greater
            {
                last_before_dedent = self.last_significant();
            }

            stmts.push(self.parse_statement(d));

            let after = d.peek();
            if after.start() <= next.start() && !after.is_eof() {
                // nothing consumed; drop the token the statement choked on
                self.bump(d);
            } else if !is_separator(after.kind)
                && !after.is_eof()
                && !is_closer(after.kind)
                && !closers.contains(&after.kind)
            {
                d.report_unexpected(after);
            }
        }

        StatementList {
            stmts,
            start,
            last_before_dedent,
        }
    }

    fn parse_compstmt<L: Lexer>(&mut self, d: &mut AstDriver<L>, closers: &[TokenKind]) -> NodeId {
        let list = self.parse_statements(d, None, closers);
        d.builder_mut().compstmt(&self.root, list.stmts)
    }

    fn parse_statement<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("stmt");
        let mut node = if d.peek_kind() == TokenKind::KwReturn {
            self.parse_return(d)
        } else {
            self.parse_expr_stmt(d)
        };

        loop {
            let modifier = d.peek();
            let kind = match modifier.kind {
                TokenKind::KwIf | TokenKind::KwUnless | TokenKind::KwWhile => modifier.kind,
                _ => break,
            };
            self.bump(d);
            let cond = self.parse_expr_stmt(d);
            let range = d.builder().range(node).cover(d.builder().range(cond));
            let node_kind = match kind {
                TokenKind::KwIf => NodeKind::If {
                    cond,
                    then_body: Some(node),
                    else_body: None,
                },
                TokenKind::KwUnless => NodeKind::If {
                    cond,
                    then_body: None,
                    else_body: Some(node),
                },
                _ => NodeKind::While {
                    cond,
                    body: Some(node),
                },
            };
            node = d.builder_mut().alloc(node_kind, range);
        }

        self.exit_rule("stmt");
        node
    }

    fn parse_return<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let keyword = self.bump(d);
        let value = if can_start_operand(d.peek_kind()) {
            Some(self.parse_expr_stmt(d))
        } else {
            None
        };
        d.builder_mut().return_(&keyword, value)
    }

    fn parse_bodystmt<L: Lexer>(&mut self, d: &mut AstDriver<L>, opener: &Token) -> BodyParts {
        let main = self.parse_statements(
            d,
            Some(opener),
            &[
                TokenKind::KwRescue,
                TokenKind::KwElse,
                TokenKind::KwEnsure,
                TokenKind::KwEnd,
            ],
        );

        let mut rescues = Vec::new();
        while d.peek_kind() == TokenKind::KwRescue {
            rescues.push(self.parse_rescue(d));
        }
        let else_body =
            self.parse_clause(d, TokenKind::KwElse, &[TokenKind::KwEnsure, TokenKind::KwEnd]);
        let ensure_body = self.parse_clause(d, TokenKind::KwEnsure, &[TokenKind::KwEnd]);

        let body = if main.stmts.is_empty()
            && rescues.is_empty()
            && else_body.is_none()
            && ensure_body.is_none()
        {
            None
        } else {
            let stmts = d.builder_mut().compstmt(&self.root, main.stmts);
            Some(d.builder_mut().body_stmt(stmts, rescues, else_body, ensure_body))
        };

        BodyParts {
            body,
            start: main.start,
            last_before_dedent: main.last_before_dedent,
        }
    }

    fn parse_clause<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        keyword: TokenKind,
        closers: &[TokenKind],
    ) -> Option<NodeId> {
        self.eat(d, keyword)?;
        Some(self.parse_compstmt(d, closers))
    }

    fn parse_rescue<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("rescue");
        let rescue_tok = self.bump(d);

        let mut exceptions = Vec::new();
        if can_start_operand(d.peek_kind()) {
            loop {
                exceptions.push(self.parse_expr(d, LOWEST));
                if self.eat(d, TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        let mut binding = None;
        if self.eat(d, TokenKind::Assoc).is_some() {
            let var = d.peek();
            if var.kind == TokenKind::Identifier {
                self.bump(d);
                let name = text_of(d, &var);
                d.declare_local(&name);
                binding = Some(d.builder_mut().alloc(NodeKind::LocalVar(name), var.range));
            } else {
                d.report_unexpected(var);
            }
        }
        self.eat(d, TokenKind::KwThen);

        let body = self.parse_compstmt(
            d,
            &[
                TokenKind::KwRescue,
                TokenKind::KwElse,
                TokenKind::KwEnsure,
                TokenKind::KwEnd,
            ],
        );
        let node = d
            .builder_mut()
            .rescue_clause(&rescue_tok, exceptions, binding, body);
        self.exit_rule("rescue");
        node
    }

    // ---- definitions ----

    /// Hand a definition body to the driver together with its closer.
    ///
    /// The closer is the `end` or the end-of-file sentinel the body stopped
    /// at, already consumed. Without indentation awareness the driver won't
    /// reconcile, so a missing `end` is reported here instead.
    fn close_definition<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        opener: &Token,
        header_end: TextSize,
        parts: BodyParts,
        closer: &Token,
    ) -> Option<NodeId> {
        let body = d.reconcile_body_indent(
            &self.root,
            opener,
            header_end,
            parts.body,
            &parts.start,
            parts.last_before_dedent.as_ref(),
            closer,
        );
        if closer.is_eof() && !d.indentation_aware() {
            d.validate_end_indent(opener, closer, true);
        }
        body
    }

    pub(super) fn parse_def<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("def");
        let def_tok = self.bump(d);
        let (singleton, name) = self.parse_def_name(d, &def_tok);

        d.enter_scope();
        d.enter_def();
        let params = self.parse_def_params(d);
        let header_end = self.last_end(&def_tok);

        let parts = self.parse_bodystmt(d, &def_tok);
        let closer = self.bump(d);
        let body = self.close_definition(d, &def_tok, header_end, parts, &closer);
        d.exit_def();
        d.exit_scope();
        self.resync(d);

        let end = self.last_end(&def_tok);
        let node = d
            .builder_mut()
            .def_method(&def_tok, singleton, name, params, body, end);
        self.exit_rule("def");
        node
    }

    /// The method name, with its `self.` prefix for singleton methods.
    /// A name on a later line is left for the body.
    fn parse_def_name<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        def_tok: &Token,
    ) -> (Option<NodeId>, Option<CompactString>) {
        let next = d.peek();
        if !matches!(
            next.kind,
            TokenKind::Identifier | TokenKind::Constant | TokenKind::KwSelf
        ) {
            d.report_unexpected(next);
            return (None, None);
        }
        if d.validate_same_line(def_tok, &next) {
            self.resync(d);
            return (None, None);
        }

        self.bump(d);
        if next.kind == TokenKind::KwSelf && self.eat(d, TokenKind::Dot).is_some() {
            let singleton = d.builder_mut().leaf(&next, "self");
            let name_tok = d.peek();
            if !matches!(name_tok.kind, TokenKind::Identifier | TokenKind::Constant) {
                d.report_unexpected(name_tok);
                return (Some(singleton), None);
            }
            self.bump(d);
            return (Some(singleton), Some(text_of(d, &name_tok)));
        }
        (None, Some(text_of(d, &next)))
    }

    fn parse_def_params<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> Vec<NodeId> {
        match d.peek_kind() {
            TokenKind::LParen | TokenKind::LParen2 => {
                self.bump(d);
                self.skip_newlines(d);
                let params = self.parse_param_list(d);
                self.skip_newlines(d);
                self.expect(d, TokenKind::RParen);
                params
            }
            TokenKind::Identifier
            | TokenKind::Star
            | TokenKind::Star2
            | TokenKind::Amper
            | TokenKind::Amper2 => self.parse_param_list(d),
            _ => Vec::new(),
        }
    }

    /// Comma separated parameters, each declared as a local of the current scope
    fn parse_param_list<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> Vec<NodeId> {
        let mut params = Vec::new();
        loop {
            let first = d.peek();
            let kind = match first.kind {
                TokenKind::Identifier => ParamKind::Required,
                TokenKind::Star | TokenKind::Star2 => ParamKind::Rest,
                TokenKind::Amper | TokenKind::Amper2 => ParamKind::Block,
                _ => break,
            };
            if kind != ParamKind::Required {
                self.bump(d);
            }
            let name_tok = d.peek();
            if name_tok.kind != TokenKind::Identifier {
                d.report_unexpected(name_tok);
                break;
            }
            self.bump(d);
            let name = text_of(d, &name_tok);
            d.declare_local(&name);
            params.push(
                d.builder_mut()
                    .param(name, kind, first.range.cover(name_tok.range)),
            );
            if self.eat(d, TokenKind::Comma).is_none() {
                break;
            }
        }
        params
    }

    pub(super) fn parse_class<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("class");
        let class_tok = self.bump(d);
        if d.in_def() {
            d.record(DiagnosticClass::ClassInDef, class_tok, std::iter::empty::<&str>(), None);
        }
        let path = self.parse_cpath(d);
        let superclass = if self.eat(d, TokenKind::Lt).is_some() {
            Some(self.parse_expr(d, LOWEST))
        } else {
            None
        };
        let header_end = self.last_end(&class_tok);

        d.enter_scope();
        let parts = self.parse_bodystmt(d, &class_tok);
        let closer = self.bump(d);
        let body = self.close_definition(d, &class_tok, header_end, parts, &closer);
        d.exit_scope();
        self.resync(d);

        let end = self.last_end(&class_tok);
        let node = d
            .builder_mut()
            .def_class(&class_tok, path, superclass, body, end);
        self.exit_rule("class");
        node
    }

    pub(super) fn parse_module<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("module");
        let module_tok = self.bump(d);
        if d.in_def() {
            d.record(DiagnosticClass::ModuleInDef, module_tok, std::iter::empty::<&str>(), None);
        }
        let path = self.parse_cpath(d);
        let header_end = self.last_end(&module_tok);

        d.enter_scope();
        let parts = self.parse_bodystmt(d, &module_tok);
        let closer = self.bump(d);
        let body = self.close_definition(d, &module_tok, header_end, parts, &closer);
        d.exit_scope();
        self.resync(d);

        let end = self.last_end(&module_tok);
        let node = d.builder_mut().def_module(&module_tok, path, body, end);
        self.exit_rule("module");
        node
    }

    /// `Name`, `::Name` or `Outer::Name`
    fn parse_cpath<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let first = d.peek();
        let mut path = match first.kind {
            TokenKind::Constant => {
                self.bump(d);
                let name = text_of(d, &first);
                d.builder_mut()
                    .const_ref(ConstScope::Lexical, name, first.range)
            }
            TokenKind::Colon3 => {
                self.bump(d);
                let name_tok = d.peek();
                if name_tok.kind != TokenKind::Constant {
                    d.report_unexpected(name_tok);
                    return d.builder_mut().error_node(first.range);
                }
                self.bump(d);
                let name = text_of(d, &name_tok);
                d.builder_mut().const_ref(
                    ConstScope::TopLevel,
                    name,
                    first.range.cover(name_tok.range),
                )
            }
            _ => {
                d.report_unexpected(first);
                return d.builder_mut().error_node(TextRange::empty(first.start()));
            }
        };

        while self.eat(d, TokenKind::Colon2).is_some() {
            let name_tok = d.peek();
            if name_tok.kind != TokenKind::Constant {
                d.report_unexpected(name_tok);
                break;
            }
            self.bump(d);
            let name = text_of(d, &name_tok);
            path = d
                .builder_mut()
                .const_ref(ConstScope::Scoped(path), name, name_tok.range);
        }
        path
    }

    // ---- other constructs closed by `end` ----

    /// Consume the `end` (or sentinel) closing the construct opened by
    /// `keyword` and check its indentation
    fn close_construct<L: Lexer>(&mut self, d: &mut AstDriver<L>, keyword: &Token) -> TextSize {
        let closer = self.bump(d);
        d.validate_end_indent(keyword, &closer, closer.is_eof());
        self.resync(d);
        self.last_end(keyword)
    }

    pub(super) fn parse_if<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("if");
        let keyword = self.bump(d);
        let branch_closers = [TokenKind::KwElsif, TokenKind::KwElse, TokenKind::KwEnd];

        let cond = self.parse_expr_stmt(d);
        self.eat(d, TokenKind::KwThen);
        let body = self.parse_compstmt(d, &branch_closers);

        let mut elsifs = Vec::new();
        while let Some(elsif) = self.eat(d, TokenKind::KwElsif) {
            let cond = self.parse_expr_stmt(d);
            self.eat(d, TokenKind::KwThen);
            let body = self.parse_compstmt(d, &branch_closers);
            elsifs.push((elsif, cond, body));
        }
        let else_body = self.parse_clause(d, TokenKind::KwElse, &[TokenKind::KwEnd]);
        let end = self.close_construct(d, &keyword);

        let mut tail = else_body;
        for (elsif, cond, body) in elsifs.into_iter().rev() {
            tail = Some(d.builder_mut().condition(&elsif, cond, Some(body), tail, end));
        }
        let (then_body, else_body) = if keyword.kind == TokenKind::KwUnless {
            (tail, Some(body))
        } else {
            (Some(body), tail)
        };
        let node = d
            .builder_mut()
            .condition(&keyword, cond, then_body, else_body, end);
        self.exit_rule("if");
        node
    }

    pub(super) fn parse_while<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("while");
        let keyword = self.bump(d);

        // `do` after the condition closes it rather than opening a block
        d.push_cond(true);
        let cond = self.parse_expr_stmt(d);
        d.pop_cond();
        self.eat(d, TokenKind::KwDoCond);

        let body = self.parse_compstmt(d, &[TokenKind::KwEnd]);
        let end = self.close_construct(d, &keyword);
        let node = d.builder_mut().while_loop(&keyword, cond, Some(body), end);
        self.exit_rule("while");
        node
    }

    pub(super) fn parse_begin<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        self.enter_rule("begin");
        let keyword = self.bump(d);
        let parts = self.parse_bodystmt(d, &keyword);
        let end = self.close_construct(d, &keyword);
        let body = match parts.body {
            Some(body) => body,
            None => d.builder_mut().empty_statement_list(&self.root),
        };
        let node = d.builder_mut().kw_begin(&keyword, body, end);
        self.exit_rule("begin");
        node
    }

    pub(super) fn parse_do_block<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        call: NodeId,
    ) -> NodeId {
        self.enter_rule("block");
        let do_tok = self.bump(d);

        d.enter_scope();
        let mut params = Vec::new();
        if self.eat(d, TokenKind::Pipe).is_some() {
            params = self.parse_param_list(d);
            self.expect(d, TokenKind::Pipe);
        }
        let parts = self.parse_bodystmt(d, &do_tok);
        let closer = self.bump(d);
        d.validate_end_indent(&do_tok, &closer, closer.is_eof());
        d.exit_scope();
        self.resync(d);

        let end = self.last_end(&do_tok);
        let node = d.builder_mut().block(call, params, parts.body, end);
        self.exit_rule("block");
        node
    }
}

impl<L: Lexer> Automaton<L, AstBuilder> for DefinitionGrammar {
    fn new(root: ParseRoot) -> Self {
        DefinitionGrammar::new(root)
    }

    fn set_trace_level(&mut self, level: u8) {
        self.trace_level = level;
    }

    fn run(&mut self, d: &mut AstDriver<L>) {
        self.enter_rule("program");
        d.enter_scope();
        let list = self.parse_statements(d, None, &[]);
        d.exit_scope();

        let body = d.builder_mut().compstmt(&self.root, list.stmts);
        let program = d.builder_mut().program(&self.root, body);
        self.exit_rule("program");
        d.set_result(program);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RubyVersion;
    use crate::lexer::Scanner;

    fn parse(source: &str, aware: bool) -> (String, AstDriver<Scanner<'_>>) {
        let mut d = Driver::new(RubyVersion::Ruby31, source, AstBuilder::new(), false, aware);
        let ast = d
            .parse::<DefinitionGrammar>(ParseRoot::new("test.rb"), false)
            .unwrap()
            .unwrap();
        let sexp = d.builder().to_sexp(ast);
        (sexp, d)
    }

    #[test]
    fn test_def_with_params() {
        let (sexp, d) = parse("def add(a, b)\n  a + b\nend\n", true);
        assert_eq!(
            sexp,
            "(program (stmts (def add (args a b) (stmts (op + (lvar a) (lvar b))))))"
        );
        assert!(d.diagnostics().is_empty());
        assert!(d.scopes().is_empty());
    }

    #[test]
    fn test_singleton_def() {
        let (sexp, _) = parse("def self.build\nend", true);
        assert_eq!(sexp, "(program (stmts (defs (self) build (args) nil)))");
    }

    #[test]
    fn test_class_with_superclass() {
        let (sexp, d) = parse("class Foo < Bar\n  def x\n  end\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (class (const nil Foo) (const nil Bar) (stmts (def x (args) nil)))))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_scoped_module_path() {
        let (sexp, _) = parse("module A::B\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (module (const (const nil A) B) nil)))"
        );
    }

    #[test]
    fn test_class_in_def() {
        let (_, d) = parse("def f\n  class X\n  end\nend", true);
        assert_eq!(d.diagnostics().count(DiagnosticClass::ClassInDef), 1);
    }

    #[test]
    fn test_module_in_def() {
        let (_, d) = parse("def f\n  module X\n  end\nend", true);
        assert_eq!(d.diagnostics().count(DiagnosticClass::ModuleInDef), 1);
    }

    #[test]
    fn test_if_elsif_else() {
        let (sexp, d) = parse("if a\n  1\nelsif b\n  2\nelse\n  3\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (if (send nil :a) (stmts (int 1)) (if (send nil :b) (stmts (int 2)) (stmts (int 3))))))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_unless_swaps_branches() {
        let (sexp, _) = parse("unless a\n  1\nend", true);
        assert_eq!(sexp, "(program (stmts (if (send nil :a) nil (stmts (int 1)))))");
    }

    #[test]
    fn test_modifier_if() {
        let (sexp, _) = parse("x = 1 if y", true);
        assert_eq!(
            sexp,
            "(program (stmts (if (send nil :y) (asgn (lvar x) (int 1)) nil)))"
        );
    }

    #[test]
    fn test_while_do_is_loop_condition() {
        let (sexp, d) = parse("while x do\n  y\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (while (send nil :x) (stmts (send nil :y)))))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_do_block_declares_params() {
        let (sexp, d) = parse("items.each do |item|\n  item\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (block (send (send nil :items) :each) (args item) (stmts (lvar item)))))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_command_call_takes_the_do_block() {
        let (sexp, _) = parse("foo bar do\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (block (send nil :foo (send nil :bar)) (args) nil)))"
        );
    }

    #[test]
    fn test_parenthesized_statements() {
        let (sexp, d) = parse("(1)\n(2; 3)\n()", true);
        assert_eq!(
            sexp,
            "(program (stmts (int 1) (stmts (int 2) (int 3)) (nil)))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_loop_and_command_flags_are_released() {
        for source in [
            "while x do\n  y\nend",
            "foo bar do\n  baz\nend",
            "def f\n  while x do\n    foo bar do\n    end\n  end\nend",
        ] {
            let (_, d) = parse(source, true);
            assert!(d.diagnostics().is_empty(), "{source}");
            assert!(d.scopes().is_empty());
            assert_eq!(d.lexer().cond().depth(), 0, "{source}");
            assert_eq!(d.lexer().cmdarg().depth(), 0, "{source}");
        }
    }

    #[test]
    fn test_begin_rescue_ensure() {
        let (sexp, d) = parse("begin\n  x\nrescue Foo => e\n  e\nensure\n  y\nend", true);
        assert_eq!(
            sexp,
            "(program (stmts (begin (bodystmt (stmts (send nil :x)) (rescue (exceptions (const nil Foo)) (lvar e) (stmts (lvar e))) (ensure (stmts (send nil :y)))))))"
        );
        assert!(d.diagnostics().is_empty());
    }

    #[test]
    fn test_return_without_value() {
        let (sexp, _) = parse("def f\n  return\nend", true);
        assert_eq!(sexp, "(program (stmts (def f (args) (stmts (return)))))");
    }

    #[test]
    fn test_stray_end_at_top_level() {
        let (_, d) = parse("x\nend\ny", true);
        assert_eq!(d.diagnostics().count(DiagnosticClass::UnexpectedToken), 1);
    }

    #[test]
    fn test_missing_end_without_indentation_awareness() {
        let (sexp, d) = parse("def f\n  x", false);
        assert_eq!(sexp, "(program (stmts (def f (args) (stmts (send nil :x)))))");
        assert_eq!(d.diagnostics().count(DiagnosticClass::EOFInsteadOfEnd), 1);
    }

    #[test]
    fn test_history_resyncs_after_rewind() {
        let source = "  def f\n    1\nend";
        let mut d = Driver::new(RubyVersion::Ruby31, source, AstBuilder::new(), false, true);
        let mut grammar = DefinitionGrammar::new(ParseRoot::default());
        d.parse_with(&mut grammar, false).unwrap();
        // the rewound `end` was consumed again as a stray token
        assert!(grammar.history.iter().any(|t| t.kind == TokenKind::KwEnd));
        assert_eq!(
            grammar.history.iter().filter(|t| t.kind == TokenKind::KwEnd).count(),
            1
        );
    }

    #[test]
    fn test_trace_level_only_in_debug_variant() {
        use crate::config::{DriverConfig, Variant};
        let config = DriverConfig::new().with_variant(Variant::Release);
        let mut d = Driver::from_source("x", AstBuilder::new(), config);
        let mut grammar = DefinitionGrammar::new(ParseRoot::default());
        d.parse_with(&mut grammar, true).unwrap();
        assert_eq!(grammar.trace_level(), 0);

        let config = DriverConfig::new().with_variant(Variant::Debug);
        let mut d = Driver::from_source("x", AstBuilder::new(), config);
        let mut grammar = DefinitionGrammar::new(ParseRoot::default());
        d.parse_with(&mut grammar, true).unwrap();
        assert_eq!(grammar.trace_level(), 1);
    }
}
