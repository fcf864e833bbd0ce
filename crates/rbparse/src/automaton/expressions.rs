//! Expressions, parsed by precedence climbing.
//!
//! Prefix operators and primaries come first, then infix operators are folded
//! in while they bind at least as tightly as the caller's minimum precedence.
//! The right operand of a left-associative operator is parsed one level
//! tighter, so `a - b - c` groups as `(a - b) - c`; a right-associative one
//! reuses its own level, so `a ** b ** c` groups as `a ** (b ** c)`.

use super::definitions::{AstDriver, DefinitionGrammar, text_of};
use crate::builder::{Builder, ConstScope, Node, NodeId, NodeKind};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    None,
}

/// Binding information for an infix operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Precedence level (higher = binds tighter)
    pub precedence: u32,
    pub associativity: Associativity,
}

impl OperatorInfo {
    const fn new(precedence: u32, associativity: Associativity) -> Self {
        Self {
            precedence,
            associativity,
        }
    }

    /// Minimum precedence of the right operand
    #[must_use]
    pub const fn next_precedence(self) -> u32 {
        match self.associativity {
            Associativity::Right => self.precedence,
            Associativity::Left | Associativity::None => self.precedence + 1,
        }
    }
}

pub(super) const LOWEST: u32 = 0;
const RANGE_OPERAND: u32 = 3;
// `-a ** b` is `-(a ** b)`, `+a ** b` is `(+a) ** b`
const UMINUS_OPERAND: u32 = 9;
const UPLUS_OPERAND: u32 = 11;

/// Precedence and associativity of `kind` in infix position
#[must_use]
pub const fn infix_operator(kind: TokenKind) -> Option<OperatorInfo> {
    let info = match kind {
        TokenKind::Eql => OperatorInfo::new(1, Associativity::Right),
        TokenKind::Dot2 | TokenKind::Dot3 => OperatorInfo::new(2, Associativity::None),
        TokenKind::Eq => OperatorInfo::new(3, Associativity::None),
        TokenKind::Lt | TokenKind::Gt => OperatorInfo::new(4, Associativity::Left),
        TokenKind::Pipe => OperatorInfo::new(5, Associativity::Left),
        TokenKind::Amper2 => OperatorInfo::new(6, Associativity::Left),
        TokenKind::Plus | TokenKind::Minus => OperatorInfo::new(7, Associativity::Left),
        TokenKind::Star2 | TokenKind::Divide => OperatorInfo::new(8, Associativity::Left),
        TokenKind::Pow => OperatorInfo::new(10, Associativity::Right),
        _ => return None,
    };
    Some(info)
}

/// Tokens that can begin an operand
pub(super) const fn can_start_operand(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Constant
            | TokenKind::IVar
            | TokenKind::GVar
            | TokenKind::BackRef
            | TokenKind::Symbol
            | TokenKind::Integer
            | TokenKind::String
            | TokenKind::KwNil
            | TokenKind::KwTrue
            | TokenKind::KwFalse
            | TokenKind::KwSelf
            | TokenKind::UMinus
            | TokenKind::UPlus
            | TokenKind::LBrack2
            | TokenKind::LParen2
            | TokenKind::Colon3
            | TokenKind::BDot2
            | TokenKind::BDot3
    )
}

const fn can_start_command_arg(kind: TokenKind) -> bool {
    can_start_operand(kind) || matches!(kind, TokenKind::Star | TokenKind::Amper)
}

impl DefinitionGrammar {
    /// An expression whose infix operators all bind at least as tightly as
    /// `min_precedence`
    pub(super) fn parse_expr<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        min_precedence: u32,
    ) -> NodeId {
        let mut lhs = self.parse_prefix(d);
        let mut non_assoc: Option<u32> = None;

        loop {
            let op = d.peek();
            let Some(info) = infix_operator(op.kind) else {
                break;
            };
            if info.precedence < min_precedence {
                break;
            }
            // `a == b == c` and `a..b..c` don't chain
            if non_assoc == Some(info.precedence) {
                d.report_unexpected(op);
                break;
            }
            self.bump(d);

            lhs = match op.kind {
                TokenKind::Eql => self.parse_assignment(d, lhs, op, info),
                TokenKind::Dot2 | TokenKind::Dot3 => {
                    let to = if can_start_operand(d.peek_kind()) {
                        Some(self.parse_expr(d, info.next_precedence()))
                    } else {
                        None
                    };
                    d.builder_mut().range_op(&op, Some(lhs), to)
                }
                _ => {
                    let rhs = self.parse_expr(d, info.next_precedence());
                    d.builder_mut().binary(op.kind, lhs, rhs)
                }
            };
            non_assoc = (info.associativity == Associativity::None).then_some(info.precedence);
        }

        lhs
    }

    /// An expression statement, allowing a command call such as `puts x, y`
    pub(super) fn parse_expr_stmt<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let expr = self.parse_expr(d, LOWEST);
        self.maybe_command(d, expr)
    }

    fn parse_prefix<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let op = d.peek();
        match op.kind {
            TokenKind::UMinus | TokenKind::UPlus => {
                self.bump(d);
                let min = if op.kind == TokenKind::UMinus {
                    UMINUS_OPERAND
                } else {
                    UPLUS_OPERAND
                };
                let operand = self.parse_expr(d, min);
                d.builder_mut().unary(&op, operand)
            }
            TokenKind::BDot2 | TokenKind::BDot3 => {
                self.bump(d);
                let to = self.parse_expr(d, RANGE_OPERAND);
                d.builder_mut().range_op(&op, None, Some(to))
            }
            _ => {
                let primary = self.parse_primary(d);
                self.parse_postfix(d, primary)
            }
        }
    }

    fn parse_assignment<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        target: NodeId,
        op: Token,
        info: OperatorInfo,
    ) -> NodeId {
        let target = if let Some(name) = bare_call_name(d, target) {
            // declared before the value is scanned, so `x = x` reads the local
            d.declare_local(&name);
            let range = d.builder().range(target);
            d.builder_mut().alloc(NodeKind::LocalVar(name), range)
        } else {
            let assignable = matches!(
                d.builder().get(target).map(|n| &n.kind),
                Some(
                    NodeKind::LocalVar(_)
                        | NodeKind::IVar(_)
                        | NodeKind::GVar(_)
                        | NodeKind::Const { .. }
                        | NodeKind::Index { .. }
                        | NodeKind::Send {
                            receiver: Some(_),
                            ..
                        }
                )
            );
            if !assignable {
                d.report_unexpected(op);
            }
            target
        };
        let value = self.parse_expr(d, info.next_precedence());
        let value = self.maybe_command(d, value);
        d.builder_mut().assign(target, value)
    }

    pub(super) fn parse_primary<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let token = d.peek();
        match token.kind {
            TokenKind::Integer
            | TokenKind::String
            | TokenKind::Symbol
            | TokenKind::IVar
            | TokenKind::GVar
            | TokenKind::BackRef
            | TokenKind::KwNil
            | TokenKind::KwTrue
            | TokenKind::KwFalse
            | TokenKind::KwSelf => {
                self.bump(d);
                let text = text_of(d, &token);
                d.builder_mut().leaf(&token, &text)
            }
            TokenKind::Constant => {
                self.bump(d);
                let name = text_of(d, &token);
                if d.peek_kind() == TokenKind::LParen {
                    let (args, end) = self.parse_paren_args(d);
                    d.builder_mut()
                        .call(None, name, args, TextRange::new(token.start(), end))
                } else {
                    d.builder_mut()
                        .const_ref(ConstScope::Lexical, name, token.range)
                }
            }
            TokenKind::Colon3 => {
                self.bump(d);
                let name_tok = d.peek();
                if name_tok.kind != TokenKind::Constant {
                    d.report_unexpected(name_tok);
                    return d.builder_mut().error_node(token.range);
                }
                self.bump(d);
                let name = text_of(d, &name_tok);
                d.builder_mut().const_ref(
                    ConstScope::TopLevel,
                    name,
                    token.range.cover(name_tok.range),
                )
            }
            TokenKind::Identifier => self.parse_identifier(d, token),
            TokenKind::LParen2 => self.parse_parenthesized(d),
            TokenKind::LBrack2 => {
                self.bump(d);
                let (elements, end) = self.parse_delimited(d, TokenKind::RBrack);
                d.builder_mut()
                    .array(elements, TextRange::new(token.start(), end))
            }
            TokenKind::KwIf | TokenKind::KwUnless => self.parse_if(d),
            TokenKind::KwWhile => self.parse_while(d),
            TokenKind::KwBegin => self.parse_begin(d),
            TokenKind::KwDef => self.parse_def(d),
            TokenKind::KwClass => self.parse_class(d),
            TokenKind::KwModule => self.parse_module(d),
            _ => {
                d.report_unexpected(token);
                d.builder_mut().error_node(TextRange::empty(token.start()))
            }
        }
    }

    fn parse_identifier<L: Lexer>(&mut self, d: &mut AstDriver<L>, token: Token) -> NodeId {
        self.bump(d);
        let name = text_of(d, &token);
        if d.peek_kind() == TokenKind::LParen {
            let (args, end) = self.parse_paren_args(d);
            return d
                .builder_mut()
                .call(None, name, args, TextRange::new(token.start(), end));
        }
        if d.is_declared(&name) {
            d.builder_mut().alloc(NodeKind::LocalVar(name), token.range)
        } else {
            d.builder_mut().call(None, name, Vec::new(), token.range)
        }
    }

    fn parse_parenthesized<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let open = self.bump(d);
        let list = self.parse_statements(d, None, &[TokenKind::RParen]);
        let close = self.expect(d, TokenKind::RParen);
        let end = close.map_or_else(|| self.last_end(&open), |t| t.end());
        let range = TextRange::new(open.start(), end);

        let mut stmts = list.stmts;
        match stmts.len() {
            0 => d.builder_mut().alloc(NodeKind::Nil, range),
            1 => stmts.swap_remove(0),
            _ => d.builder_mut().compstmt(&self.root, stmts),
        }
    }

    fn parse_postfix<L: Lexer>(&mut self, d: &mut AstDriver<L>, mut node: NodeId) -> NodeId {
        loop {
            let token = d.peek();
            node = match token.kind {
                TokenKind::Dot => {
                    self.bump(d);
                    let name_tok = d.peek();
                    if !matches!(name_tok.kind, TokenKind::Identifier | TokenKind::Constant) {
                        d.report_unexpected(name_tok);
                        return node;
                    }
                    self.bump(d);
                    self.parse_method_call(d, Some(node), name_tok)
                }
                TokenKind::Colon2 => {
                    self.bump(d);
                    let name_tok = d.peek();
                    if !matches!(name_tok.kind, TokenKind::Identifier | TokenKind::Constant) {
                        d.report_unexpected(name_tok);
                        return node;
                    }
                    self.bump(d);
                    if name_tok.kind == TokenKind::Constant && d.peek_kind() != TokenKind::LParen {
                        let name = text_of(d, &name_tok);
                        d.builder_mut()
                            .const_ref(ConstScope::Scoped(node), name, name_tok.range)
                    } else {
                        self.parse_method_call(d, Some(node), name_tok)
                    }
                }
                TokenKind::LBrack => {
                    self.bump(d);
                    let (args, end) = self.parse_delimited(d, TokenKind::RBrack);
                    d.builder_mut().index(node, args, end)
                }
                TokenKind::KwDo if !d.lexer().cmdarg().is_active() && is_send(d, node) => {
                    self.parse_do_block(d, node)
                }
                _ => return node,
            };
        }
    }

    fn parse_method_call<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        receiver: Option<NodeId>,
        name_tok: Token,
    ) -> NodeId {
        let method = text_of(d, &name_tok);
        if d.peek_kind() == TokenKind::LParen {
            let (args, end) = self.parse_paren_args(d);
            d.builder_mut()
                .call(receiver, method, args, TextRange::new(name_tok.start(), end))
        } else {
            d.builder_mut()
                .call(receiver, method, Vec::new(), name_tok.range)
        }
    }

    fn parse_paren_args<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> (Vec<NodeId>, TextSize) {
        self.bump(d);
        self.parse_delimited(d, TokenKind::RParen)
    }

    /// Comma separated arguments up to `close`, whose opener was just consumed.
    /// Returns the arguments and where the list ends.
    fn parse_delimited<L: Lexer>(
        &mut self,
        d: &mut AstDriver<L>,
        close: TokenKind,
    ) -> (Vec<NodeId>, TextSize) {
        let mut args = Vec::new();
        loop {
            self.skip_newlines(d);
            if let Some(token) = self.eat(d, close) {
                return (args, token.end());
            }
            args.push(self.parse_arg(d));
            self.skip_newlines(d);
            let next = d.peek();
            if next.kind == close {
                continue;
            }
            if self.eat(d, TokenKind::Comma).is_none() {
                d.report_unexpected(next);
                return (args, self.last_end(&next));
            }
        }
    }

    fn parse_arg<L: Lexer>(&mut self, d: &mut AstDriver<L>) -> NodeId {
        let token = d.peek();
        match token.kind {
            TokenKind::Star => {
                self.bump(d);
                let value = self.parse_expr(d, LOWEST);
                d.builder_mut().splat(&token, value)
            }
            TokenKind::Amper => {
                self.bump(d);
                let value = self.parse_expr(d, LOWEST);
                d.builder_mut().block_pass(&token, value)
            }
            _ => {
                let key = self.parse_expr(d, LOWEST);
                if self.eat(d, TokenKind::Assoc).is_some() {
                    let value = self.parse_expr(d, LOWEST);
                    d.builder_mut().pair(key, value)
                } else {
                    key
                }
            }
        }
    }

    /// Turn a parenthesis-free call followed by an argument into a command
    /// call, attaching a trailing `do` block to it
    pub(super) fn maybe_command<L: Lexer>(&mut self, d: &mut AstDriver<L>, node: NodeId) -> NodeId {
        if !self.is_command_candidate(d, node) || !can_start_command_arg(d.peek_kind()) {
            return node;
        }

        // a `do` inside the arguments belongs to this command, not to them
        d.push_cmdarg(true);
        let mut args = vec![self.parse_arg(d)];
        while self.eat(d, TokenKind::Comma).is_some() {
            args.push(self.parse_arg(d));
        }
        d.pop_cmdarg();

        let Some(Node {
            kind: NodeKind::Send {
                receiver, method, ..
            },
            range,
        }) = d.builder().get(node).cloned()
        else {
            return node;
        };
        let command = d.builder_mut().call(receiver, method, args, range);

        if d.peek_kind() == TokenKind::KwDo && !d.lexer().cmdarg().is_active() {
            self.parse_do_block(d, command)
        } else {
            command
        }
    }

    /// A call written without parentheses or arguments, ending at the last
    /// consumed token
    fn is_command_candidate<L: Lexer>(&self, d: &AstDriver<L>, node: NodeId) -> bool {
        let Some(n) = d.builder().get(node) else {
            return false;
        };
        let NodeKind::Send { args, .. } = &n.kind else {
            return false;
        };
        args.is_empty()
            && self.history.last().is_some_and(|last| {
                matches!(last.kind, TokenKind::Identifier | TokenKind::Constant)
                    && last.end() == n.range.end()
            })
    }
}

/// Name of a receiver-less call without arguments or parentheses, which
/// becomes a local variable when assigned to
fn bare_call_name<L: Lexer>(d: &AstDriver<L>, node: NodeId) -> Option<CompactString> {
    let n = d.builder().get(node)?;
    match &n.kind {
        NodeKind::Send {
            receiver: None,
            method,
            args,
        } if args.is_empty() && n.range.len().to_usize() == method.len() => Some(method.clone()),
        _ => None,
    }
}

fn is_send<L: Lexer>(d: &AstDriver<L>, node: NodeId) -> bool {
    matches!(
        d.builder().get(node).map(|n| &n.kind),
        Some(NodeKind::Send { .. })
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_left_associative_binds_tighter_on_the_right() {
        let info = infix_operator(TokenKind::Minus).unwrap();
        assert_eq!(info.associativity, Associativity::Left);
        assert_eq!(info.next_precedence(), info.precedence + 1);
    }

    #[test]
    fn test_pow_is_right_associative() {
        let info = infix_operator(TokenKind::Pow).unwrap();
        assert_eq!(info.next_precedence(), info.precedence);
    }

    #[test]
    fn test_precedence_order() {
        let prec = |kind| infix_operator(kind).unwrap().precedence;
        assert!(prec(TokenKind::Eql) < prec(TokenKind::Dot2));
        assert!(prec(TokenKind::Eq) < prec(TokenKind::Plus));
        assert!(prec(TokenKind::Plus) < prec(TokenKind::Star2));
        assert!(prec(TokenKind::Star2) < UMINUS_OPERAND);
        assert!(UMINUS_OPERAND < prec(TokenKind::Pow));
        assert!(prec(TokenKind::Pow) < UPLUS_OPERAND);
    }

    #[test]
    fn test_prefix_forms_are_not_infix() {
        assert!(infix_operator(TokenKind::UMinus).is_none());
        assert!(infix_operator(TokenKind::Star).is_none());
        assert!(infix_operator(TokenKind::BDot2).is_none());
    }
}
