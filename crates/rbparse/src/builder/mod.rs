//! # AST Builders
//!
//! The driver treats AST nodes as opaque handles. It only ever asks the
//! builder for two things during recovery: a statement list, possibly empty,
//! and a body truncated before a dedented statement. Everything else the
//! builder offers is for the automaton.
//!
//! [`AstBuilder`] is the reference implementation, storing nodes in a typed
//! arena.

mod ast;

pub use ast::{AstBuilder, ConstScope, Node, NodeId, NodeKind, ParamKind, ParseRoot};

use crate::lexer::Token;
use std::fmt::Debug;

/// Node construction as seen by the driver
pub trait Builder {
    /// Handle to a built node
    type Node: Clone + Debug;

    /// Handle the automaton was constructed with, passed back on every call
    type Root;

    /// A statement list node over `stmts`
    fn compstmt(&mut self, root: &Self::Root, stmts: Vec<Self::Node>) -> Self::Node;

    /// The statements of `body` that end at or before `marker`.
    ///
    /// Returns `None` when `body` has clauses truncation can't split, such as
    /// `rescue`, `else` or `ensure`.
    fn truncate_body_stmt(
        &mut self,
        root: &Self::Root,
        body: &Self::Node,
        marker: &Token,
    ) -> Option<Self::Node>;

    fn empty_statement_list(&mut self, root: &Self::Root) -> Self::Node {
        self.compstmt(root, Vec::new())
    }
}
