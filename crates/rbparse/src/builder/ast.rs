use super::Builder;
use crate::arena::{Arena, ArenaStats, Idx};
use crate::lexer::{Token, TokenKind};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use std::fmt::Write;

pub type NodeId = Idx<Node>;

/// Root handle the automaton is constructed with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseRoot {
    /// Label recorded on the program node
    pub file: CompactString,
}

impl ParseRoot {
    #[must_use]
    pub fn new(file: impl Into<CompactString>) -> Self {
        Self { file: file.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Required,
    /// `*rest`
    Rest,
    /// `&blk`
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstScope {
    /// `Foo`
    Lexical,
    /// `::Foo`
    TopLevel,
    /// `Bar::Foo`
    Scoped(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Program {
        file: CompactString,
        body: NodeId,
    },
    Statements(Vec<NodeId>),
    /// A body with at least one `rescue`, `else` or `ensure` clause
    BodyStmt {
        body: NodeId,
        rescues: Vec<NodeId>,
        else_body: Option<NodeId>,
        ensure_body: Option<NodeId>,
    },
    Rescue {
        exceptions: Vec<NodeId>,
        binding: Option<NodeId>,
        body: NodeId,
    },
    Def {
        singleton: Option<NodeId>,
        /// Absent when the name was missing
        name: Option<CompactString>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },
    Param {
        name: CompactString,
        kind: ParamKind,
    },
    Class {
        path: NodeId,
        superclass: Option<NodeId>,
        body: Option<NodeId>,
    },
    Module {
        path: NodeId,
        body: Option<NodeId>,
    },
    If {
        cond: NodeId,
        then_body: Option<NodeId>,
        else_body: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: Option<NodeId>,
    },
    Begin {
        body: NodeId,
    },
    Block {
        call: NodeId,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },
    Send {
        receiver: Option<NodeId>,
        method: CompactString,
        args: Vec<NodeId>,
    },
    Index {
        receiver: NodeId,
        args: Vec<NodeId>,
    },
    LocalVar(CompactString),
    IVar(CompactString),
    GVar(CompactString),
    BackRef(CompactString),
    Const {
        scope: ConstScope,
        name: CompactString,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Integer(CompactString),
    Str(CompactString),
    Symbol(CompactString),
    Nil,
    True,
    False,
    SelfRef,
    Array(Vec<NodeId>),
    Pair {
        key: NodeId,
        value: NodeId,
    },
    Range {
        from: Option<NodeId>,
        to: Option<NodeId>,
        exclusive: bool,
    },
    Unary {
        op: TokenKind,
        operand: NodeId,
    },
    Binary {
        op: TokenKind,
        lhs: NodeId,
        rhs: NodeId,
    },
    Splat(NodeId),
    BlockPass(NodeId),
    Return(Option<NodeId>),
    /// Placeholder for an expression that failed to parse
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,
}

/// Reference [`Builder`] storing nodes in an arena
#[derive(Debug, Clone, Default)]
pub struct AstBuilder {
    arena: Arena<Node>,
}

const fn op_text(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::UPlus => "+@",
        TokenKind::UMinus => "-@",
        TokenKind::Star2 => "*",
        TokenKind::Pow => "**",
        TokenKind::Divide => "/",
        TokenKind::Amper2 => "&",
        TokenKind::Pipe => "|",
        TokenKind::Eq => "==",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        _ => "?",
    }
}

impl AstBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, range: TextRange) -> NodeId {
        self.arena.alloc(Node { kind, range })
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.arena.stats()
    }

    /// Range of `id`, or an empty range for a foreign handle
    #[must_use]
    pub fn range(&self, id: NodeId) -> TextRange {
        self.get(id).map_or_else(TextRange::default, |n| n.range)
    }

    fn cover_all(&self, ids: &[NodeId]) -> Option<TextRange> {
        ids.iter()
            .map(|&id| self.range(id))
            .reduce(TextRange::cover)
    }

    fn extend(&self, range: TextRange, id: Option<NodeId>) -> TextRange {
        id.map_or(range, |id| range.cover(self.range(id)))
    }

    pub fn program(&mut self, root: &ParseRoot, body: NodeId) -> NodeId {
        let range = self.range(body);
        self.alloc(
            NodeKind::Program {
                file: root.file.clone(),
                body,
            },
            range,
        )
    }

    /// A body with optional clauses. Without any clause this is just `stmts`.
    pub fn body_stmt(
        &mut self,
        stmts: NodeId,
        rescues: Vec<NodeId>,
        else_body: Option<NodeId>,
        ensure_body: Option<NodeId>,
    ) -> NodeId {
        if rescues.is_empty() && else_body.is_none() && ensure_body.is_none() {
            return stmts;
        }
        let mut range = self.range(stmts);
        if let Some(clauses) = self.cover_all(&rescues) {
            range = range.cover(clauses);
        }
        range = self.extend(range, else_body);
        range = self.extend(range, ensure_body);
        self.alloc(
            NodeKind::BodyStmt {
                body: stmts,
                rescues,
                else_body,
                ensure_body,
            },
            range,
        )
    }

    pub fn rescue_clause(
        &mut self,
        rescue_tok: &Token,
        exceptions: Vec<NodeId>,
        binding: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let range = self.extend(rescue_tok.range, Some(body));
        self.alloc(
            NodeKind::Rescue {
                exceptions,
                binding,
                body,
            },
            range,
        )
    }

    pub fn param(
        &mut self,
        name: impl Into<CompactString>,
        kind: ParamKind,
        range: TextRange,
    ) -> NodeId {
        self.alloc(
            NodeKind::Param {
                name: name.into(),
                kind,
            },
            range,
        )
    }

    pub fn def_method(
        &mut self,
        def_tok: &Token,
        singleton: Option<NodeId>,
        name: Option<CompactString>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let range = TextRange::new(def_tok.start(), end.max(def_tok.end()));
        self.alloc(
            NodeKind::Def {
                singleton,
                name,
                params,
                body,
            },
            range,
        )
    }

    pub fn def_class(
        &mut self,
        class_tok: &Token,
        path: NodeId,
        superclass: Option<NodeId>,
        body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let range = TextRange::new(class_tok.start(), end.max(class_tok.end()));
        self.alloc(
            NodeKind::Class {
                path,
                superclass,
                body,
            },
            range,
        )
    }

    pub fn def_module(
        &mut self,
        module_tok: &Token,
        path: NodeId,
        body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let range = TextRange::new(module_tok.start(), end.max(module_tok.end()));
        self.alloc(NodeKind::Module { path, body }, range)
    }

    pub fn condition(
        &mut self,
        keyword: &Token,
        cond: NodeId,
        then_body: Option<NodeId>,
        else_body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let range = TextRange::new(keyword.start(), end.max(keyword.end()));
        self.alloc(
            NodeKind::If {
                cond,
                then_body,
                else_body,
            },
            range,
        )
    }

    pub fn while_loop(
        &mut self,
        keyword: &Token,
        cond: NodeId,
        body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let range = TextRange::new(keyword.start(), end.max(keyword.end()));
        self.alloc(NodeKind::While { cond, body }, range)
    }

    pub fn kw_begin(&mut self, begin_tok: &Token, body: NodeId, end: TextSize) -> NodeId {
        let range = TextRange::new(begin_tok.start(), end.max(begin_tok.end()));
        self.alloc(NodeKind::Begin { body }, range)
    }

    pub fn block(
        &mut self,
        call: NodeId,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        end: TextSize,
    ) -> NodeId {
        let start = self.range(call).start();
        self.alloc(
            NodeKind::Block { call, params, body },
            TextRange::new(start, end.max(start)),
        )
    }

    pub fn call(
        &mut self,
        receiver: Option<NodeId>,
        method: impl Into<CompactString>,
        args: Vec<NodeId>,
        range: TextRange,
    ) -> NodeId {
        let range = self.extend(range, receiver);
        let range = self.cover_all(&args).map_or(range, |a| range.cover(a));
        self.alloc(
            NodeKind::Send {
                receiver,
                method: method.into(),
                args,
            },
            range,
        )
    }

    pub fn index(&mut self, receiver: NodeId, args: Vec<NodeId>, close: TextSize) -> NodeId {
        let start = self.range(receiver).start();
        self.alloc(
            NodeKind::Index { receiver, args },
            TextRange::new(start, close.max(start)),
        )
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let range = self.range(target).cover(self.range(value));
        self.alloc(NodeKind::Assign { target, value }, range)
    }

    pub fn binary(&mut self, op: TokenKind, lhs: NodeId, rhs: NodeId) -> NodeId {
        let range = self.range(lhs).cover(self.range(rhs));
        self.alloc(NodeKind::Binary { op, lhs, rhs }, range)
    }

    pub fn unary(&mut self, op: &Token, operand: NodeId) -> NodeId {
        let range = op.range.cover(self.range(operand));
        self.alloc(
            NodeKind::Unary {
                op: op.kind,
                operand,
            },
            range,
        )
    }

    pub fn range_op(
        &mut self,
        op: &Token,
        from: Option<NodeId>,
        to: Option<NodeId>,
    ) -> NodeId {
        let exclusive = matches!(op.kind, TokenKind::Dot3 | TokenKind::BDot3);
        let range = self.extend(self.extend(op.range, from), to);
        self.alloc(NodeKind::Range { from, to, exclusive }, range)
    }

    pub fn array(&mut self, elements: Vec<NodeId>, range: TextRange) -> NodeId {
        self.alloc(NodeKind::Array(elements), range)
    }

    pub fn pair(&mut self, key: NodeId, value: NodeId) -> NodeId {
        let range = self.range(key).cover(self.range(value));
        self.alloc(NodeKind::Pair { key, value }, range)
    }

    pub fn splat(&mut self, star: &Token, value: NodeId) -> NodeId {
        let range = star.range.cover(self.range(value));
        self.alloc(NodeKind::Splat(value), range)
    }

    pub fn block_pass(&mut self, amper: &Token, value: NodeId) -> NodeId {
        let range = amper.range.cover(self.range(value));
        self.alloc(NodeKind::BlockPass(value), range)
    }

    pub fn return_(&mut self, keyword: &Token, value: Option<NodeId>) -> NodeId {
        let range = self.extend(keyword.range, value);
        self.alloc(NodeKind::Return(value), range)
    }

    pub fn const_ref(
        &mut self,
        scope: ConstScope,
        name: impl Into<CompactString>,
        range: TextRange,
    ) -> NodeId {
        let range = match scope {
            ConstScope::Scoped(parent) => self.range(parent).cover(range),
            _ => range,
        };
        self.alloc(
            NodeKind::Const {
                scope,
                name: name.into(),
            },
            range,
        )
    }

    /// Leaf node for a literal or variable token with source text `text`
    pub fn leaf(&mut self, token: &Token, text: &str) -> NodeId {
        let text = CompactString::from(text);
        let kind = match token.kind {
            TokenKind::Identifier => NodeKind::LocalVar(text),
            TokenKind::IVar => NodeKind::IVar(text),
            TokenKind::GVar => NodeKind::GVar(text),
            TokenKind::BackRef => NodeKind::BackRef(text),
            TokenKind::Integer => NodeKind::Integer(text),
            TokenKind::String => NodeKind::Str(text),
            TokenKind::Symbol => NodeKind::Symbol(text),
            TokenKind::Constant => NodeKind::Const {
                scope: ConstScope::Lexical,
                name: text,
            },
            TokenKind::KwNil => NodeKind::Nil,
            TokenKind::KwTrue => NodeKind::True,
            TokenKind::KwFalse => NodeKind::False,
            TokenKind::KwSelf => NodeKind::SelfRef,
            _ => NodeKind::Error,
        };
        self.alloc(kind, token.range)
    }

    pub fn error_node(&mut self, range: TextRange) -> NodeId {
        self.alloc(NodeKind::Error, range)
    }

    /// S-expression rendering of the tree under `id`
    #[must_use]
    pub fn to_sexp(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, Some(id));
        out
    }

    fn write_list(&self, out: &mut String, ids: &[NodeId]) {
        for &id in ids {
            out.push(' ');
            self.write_sexp(out, Some(id));
        }
    }

    fn write_sexp(&self, out: &mut String, id: Option<NodeId>) {
        let Some(node) = id.and_then(|id| self.get(id)) else {
            out.push_str("nil");
            return;
        };
        match &node.kind {
            NodeKind::Program { body, .. } => {
                out.push_str("(program ");
                self.write_sexp(out, Some(*body));
                out.push(')');
            }
            NodeKind::Statements(stmts) => {
                out.push_str("(stmts");
                self.write_list(out, stmts);
                out.push(')');
            }
            NodeKind::BodyStmt {
                body,
                rescues,
                else_body,
                ensure_body,
            } => {
                out.push_str("(bodystmt ");
                self.write_sexp(out, Some(*body));
                self.write_list(out, rescues);
                if else_body.is_some() {
                    out.push_str(" (else ");
                    self.write_sexp(out, *else_body);
                    out.push(')');
                }
                if ensure_body.is_some() {
                    out.push_str(" (ensure ");
                    self.write_sexp(out, *ensure_body);
                    out.push(')');
                }
                out.push(')');
            }
            NodeKind::Rescue {
                exceptions,
                binding,
                body,
            } => {
                out.push_str("(rescue (exceptions");
                self.write_list(out, exceptions);
                out.push_str(") ");
                self.write_sexp(out, *binding);
                out.push(' ');
                self.write_sexp(out, Some(*body));
                out.push(')');
            }
            NodeKind::Def {
                singleton,
                name,
                params,
                body,
            } => {
                if singleton.is_some() {
                    out.push_str("(defs ");
                    self.write_sexp(out, *singleton);
                    out.push(' ');
                } else {
                    out.push_str("(def ");
                }
                out.push_str(name.as_deref().unwrap_or("?"));
                out.push_str(" (args");
                self.write_list(out, params);
                out.push_str(") ");
                self.write_sexp(out, *body);
                out.push(')');
            }
            NodeKind::Param { name, kind } => {
                let prefix = match kind {
                    ParamKind::Required => "",
                    ParamKind::Rest => "*",
                    ParamKind::Block => "&",
                };
                let _ = write!(out, "{prefix}{name}");
            }
            NodeKind::Class {
                path,
                superclass,
                body,
            } => {
                out.push_str("(class ");
                self.write_sexp(out, Some(*path));
                out.push(' ');
                self.write_sexp(out, *superclass);
                out.push(' ');
                self.write_sexp(out, *body);
                out.push(')');
            }
            NodeKind::Module { path, body } => {
                out.push_str("(module ");
                self.write_sexp(out, Some(*path));
                out.push(' ');
                self.write_sexp(out, *body);
                out.push(')');
            }
            NodeKind::If {
                cond,
                then_body,
                else_body,
            } => {
                out.push_str("(if ");
                self.write_sexp(out, Some(*cond));
                out.push(' ');
                self.write_sexp(out, *then_body);
                out.push(' ');
                self.write_sexp(out, *else_body);
                out.push(')');
            }
            NodeKind::While { cond, body } => {
                out.push_str("(while ");
                self.write_sexp(out, Some(*cond));
                out.push(' ');
                self.write_sexp(out, *body);
                out.push(')');
            }
            NodeKind::Begin { body } => {
                out.push_str("(begin ");
                self.write_sexp(out, Some(*body));
                out.push(')');
            }
            NodeKind::Block { call, params, body } => {
                out.push_str("(block ");
                self.write_sexp(out, Some(*call));
                out.push_str(" (args");
                self.write_list(out, params);
                out.push_str(") ");
                self.write_sexp(out, *body);
                out.push(')');
            }
            NodeKind::Send {
                receiver,
                method,
                args,
            } => {
                out.push_str("(send ");
                self.write_sexp(out, *receiver);
                let _ = write!(out, " :{method}");
                self.write_list(out, args);
                out.push(')');
            }
            NodeKind::Index { receiver, args } => {
                out.push_str("(index ");
                self.write_sexp(out, Some(*receiver));
                self.write_list(out, args);
                out.push(')');
            }
            NodeKind::LocalVar(name) => {
                let _ = write!(out, "(lvar {name})");
            }
            NodeKind::IVar(name) => {
                let _ = write!(out, "(ivar {name})");
            }
            NodeKind::GVar(name) => {
                let _ = write!(out, "(gvar {name})");
            }
            NodeKind::BackRef(name) => {
                let _ = write!(out, "(backref {name})");
            }
            NodeKind::Const { scope, name } => {
                out.push_str("(const ");
                match scope {
                    ConstScope::Lexical => out.push_str("nil"),
                    ConstScope::TopLevel => out.push_str("(cbase)"),
                    ConstScope::Scoped(parent) => self.write_sexp(out, Some(*parent)),
                }
                let _ = write!(out, " {name})");
            }
            NodeKind::Assign { target, value } => {
                out.push_str("(asgn ");
                self.write_sexp(out, Some(*target));
                out.push(' ');
                self.write_sexp(out, Some(*value));
                out.push(')');
            }
            NodeKind::Integer(text) => {
                let _ = write!(out, "(int {text})");
            }
            NodeKind::Str(text) => {
                let _ = write!(out, "(str {text})");
            }
            NodeKind::Symbol(text) => {
                let _ = write!(out, "(sym {text})");
            }
            NodeKind::Nil => out.push_str("(nil)"),
            NodeKind::True => out.push_str("(true)"),
            NodeKind::False => out.push_str("(false)"),
            NodeKind::SelfRef => out.push_str("(self)"),
            NodeKind::Array(elements) => {
                out.push_str("(array");
                self.write_list(out, elements);
                out.push(')');
            }
            NodeKind::Pair { key, value } => {
                out.push_str("(pair ");
                self.write_sexp(out, Some(*key));
                out.push(' ');
                self.write_sexp(out, Some(*value));
                out.push(')');
            }
            NodeKind::Range {
                from,
                to,
                exclusive,
            } => {
                out.push_str(if *exclusive { "(erange " } else { "(irange " });
                self.write_sexp(out, *from);
                out.push(' ');
                self.write_sexp(out, *to);
                out.push(')');
            }
            NodeKind::Unary { op, operand } => {
                let _ = write!(out, "(op {} ", op_text(*op));
                self.write_sexp(out, Some(*operand));
                out.push(')');
            }
            NodeKind::Binary { op, lhs, rhs } => {
                let _ = write!(out, "(op {} ", op_text(*op));
                self.write_sexp(out, Some(*lhs));
                out.push(' ');
                self.write_sexp(out, Some(*rhs));
                out.push(')');
            }
            NodeKind::Splat(value) => {
                out.push_str("(splat ");
                self.write_sexp(out, Some(*value));
                out.push(')');
            }
            NodeKind::BlockPass(value) => {
                out.push_str("(block-pass ");
                self.write_sexp(out, Some(*value));
                out.push(')');
            }
            NodeKind::Return(value) => {
                out.push_str("(return");
                if value.is_some() {
                    out.push(' ');
                    self.write_sexp(out, *value);
                }
                out.push(')');
            }
            NodeKind::Error => out.push_str("(error)"),
        }
    }
}

impl Builder for AstBuilder {
    type Node = NodeId;
    type Root = ParseRoot;

    fn compstmt(&mut self, _root: &ParseRoot, stmts: Vec<NodeId>) -> NodeId {
        let range = self.cover_all(&stmts).unwrap_or_default();
        self.alloc(NodeKind::Statements(stmts), range)
    }

    fn truncate_body_stmt(
        &mut self,
        root: &ParseRoot,
        body: &NodeId,
        marker: &Token,
    ) -> Option<NodeId> {
        let NodeKind::Statements(stmts) = &self.get(*body)?.kind else {
            return None;
        };
        let kept: Vec<NodeId> = stmts
            .iter()
            .copied()
            .filter(|&stmt| self.range(stmt).end() <= marker.end())
            .collect();
        Some(self.compstmt(root, kept))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, start: u32, end: u32) -> Token {
        Token::new(
            kind,
            TextRange::new(TextSize::new(start), TextSize::new(end)),
            TextSize::zero(),
        )
    }

    #[test]
    fn test_compstmt_covers_children() {
        let root = ParseRoot::default();
        let mut b = AstBuilder::new();
        let x = b.leaf(&tok(TokenKind::Identifier, 2, 3), "x");
        let y = b.leaf(&tok(TokenKind::Integer, 6, 8), "42");
        let stmts = b.compstmt(&root, vec![x, y]);
        assert_eq!(b.range(stmts), TextRange::new(TextSize::new(2), TextSize::new(8)));
        assert_eq!(b.to_sexp(stmts), "(stmts (lvar x) (int 42))");
    }

    #[test]
    fn test_empty_statement_list() {
        let root = ParseRoot::default();
        let mut b = AstBuilder::new();
        let empty = b.empty_statement_list(&root);
        assert_eq!(b.to_sexp(empty), "(stmts)");
    }

    #[test]
    fn test_truncate_keeps_statements_before_marker() {
        let root = ParseRoot::default();
        let mut b = AstBuilder::new();
        let x = b.leaf(&tok(TokenKind::Identifier, 10, 11), "x");
        let y = b.leaf(&tok(TokenKind::Identifier, 14, 15), "y");
        let body = b.compstmt(&root, vec![x, y]);
        let marker = tok(TokenKind::Identifier, 10, 11);
        let truncated = b.truncate_body_stmt(&root, &body, &marker);
        assert_eq!(truncated.map(|t| b.to_sexp(t)), Some("(stmts (lvar x))".to_string()));
    }

    #[test]
    fn test_truncate_refuses_bodies_with_clauses() {
        let root = ParseRoot::default();
        let mut b = AstBuilder::new();
        let x = b.leaf(&tok(TokenKind::Identifier, 10, 11), "x");
        let stmts = b.compstmt(&root, vec![x]);
        let z = b.leaf(&tok(TokenKind::Identifier, 25, 26), "z");
        let rescue_body = b.compstmt(&root, vec![z]);
        let rescue = b.rescue_clause(&tok(TokenKind::KwRescue, 16, 22), vec![], None, rescue_body);
        let body = b.body_stmt(stmts, vec![rescue], None, None);
        assert_ne!(body, stmts);
        let marker = tok(TokenKind::Identifier, 10, 11);
        assert_eq!(b.truncate_body_stmt(&root, &body, &marker), None);
    }

    #[test]
    fn test_body_stmt_without_clauses_is_plain_statements() {
        let root = ParseRoot::default();
        let mut b = AstBuilder::new();
        let stmts = b.compstmt(&root, vec![]);
        assert_eq!(b.body_stmt(stmts, vec![], None, None), stmts);
    }

    #[test]
    fn test_def_sexp() {
        let root = ParseRoot::new("test.rb");
        let mut b = AstBuilder::new();
        let def_tok = tok(TokenKind::KwDef, 0, 3);
        let range = TextRange::new(TextSize::new(8), TextSize::new(9));
        let param = b.param("a", ParamKind::Required, range);
        let body = b.compstmt(&root, vec![]);
        let def = b.def_method(
            &def_tok,
            None,
            Some("foo".into()),
            vec![param],
            Some(body),
            TextSize::new(14),
        );
        let stmts = b.compstmt(&root, vec![def]);
        let program = b.program(&root, stmts);
        assert_eq!(b.to_sexp(program), "(program (stmts (def foo (args a) (stmts))))");
        assert!(matches!(
            b.get(program).map(|n| &n.kind),
            Some(NodeKind::Program { file, .. }) if file == "test.rb"
        ));
    }

    #[test]
    fn test_missing_def_name_renders_placeholder() {
        let mut b = AstBuilder::new();
        let def_tok = tok(TokenKind::KwDef, 0, 3);
        let def = b.def_method(&def_tok, None, None, vec![], None, TextSize::new(3));
        assert_eq!(b.to_sexp(def), "(def ? (args) nil)");
    }
}
