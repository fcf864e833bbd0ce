//! # Lexer Module
//!
//! The lexer interface the driver coordinates, and the reference
//! [`Scanner`] implementing it.
//!
//! ## Overview
//!
//! The driver never tokenizes the whole file up front. It pulls tokens one at
//! a time and, when recovery needs to, moves the lexer's cursor back to an
//! earlier byte offset. The [`Lexer`] trait is the contract for that:
//!
//! - **Pulling**: [`Lexer::next_token`] returns queued tokens first, then scans
//! - **Rewinding**: [`Lexer::rewind_and_reset`] moves the cursor and resets the
//!   scanner state to expression-begin or expression-end
//! - **Unadvancing**: [`Lexer::unadvance`] puts a token back on the queue
//! - **Indentation**: [`Lexer::compare_indent_level`] orders two tokens by the
//!   indentation of the lines they start on
//! - **Scope context**: the `cmdarg`/`cond` stacks and the declaration scopes,
//!   which only the driver's scope stack mutates
//!
//! Malformed input is reported to the [`Diagnostics`] log passed into
//! `next_token`; the lexer always produces a token.

mod scanner;
mod token;

pub use scanner::{LexState, Scanner};
pub use token::{Token, TokenKind};

use crate::diagnostics::Diagnostics;
use crate::text::TextSize;
use smallvec::SmallVec;
use std::cmp::Ordering;

#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Scanner state to resume in after a rewind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub enum ResumeState {
    /// As if an expression may begin at the new cursor
    ExprBeg,
    /// As if an expression just ended before the new cursor
    ExprEnd,
}

/// A stack of boolean flags.
///
/// Only the top flag is observable; pushing and popping saves and restores
/// it. Popping an empty stack leaves it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackState {
    flags: SmallVec<[bool; 16]>,
}

impl StackState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, flag: bool) {
        self.flags.push(flag);
    }

    pub fn pop(&mut self) -> Option<bool> {
        self.flags.pop()
    }

    /// The top flag; false when empty
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.flags.last().copied().unwrap_or(false)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.flags.len()
    }
}

/// The lexer contract used by the driver
pub trait Lexer {
    /// Next token: the front of the queue if non-empty, else a freshly scanned
    /// one. After the end of the source this yields the
    /// [`BeforeEof`](TokenKind::BeforeEof) sentinel once, then
    /// [`EndOfInput`](TokenKind::EndOfInput) forever.
    fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token;

    /// Drop every queued token
    fn clear_queue(&mut self);

    /// Move the cursor to `offset` and reset the scanner state
    fn rewind_and_reset(&mut self, offset: TextSize, state: ResumeState);

    /// Put `token` back so the next call to `next_token` returns it
    fn unadvance(&mut self, token: Token);

    /// Compare the indentation of the lines `a` and `b` start on
    fn compare_indent_level(&self, a: &Token, b: &Token) -> Ordering;

    fn cmdarg(&self) -> &StackState;
    fn cond(&self) -> &StackState;

    /// Stack primitives. Parsers reach them through
    /// [`ScopeStack`](crate::scope::ScopeStack) so the flags stay paired with
    /// scope frames.
    fn push_cmdarg(&mut self, flag: bool);
    fn pop_cmdarg(&mut self);
    fn push_cond(&mut self, flag: bool);
    fn pop_cond(&mut self);

    /// Push fresh `cmdarg` and `cond` contexts
    fn push_context(&mut self) {
        self.push_cmdarg(false);
        self.push_cond(false);
    }

    fn pop_context(&mut self) {
        self.pop_cmdarg();
        self.pop_cond();
    }

    /// Open a new local-declaration scope
    fn extend_static(&mut self);

    /// Close the innermost local-declaration scope
    fn unextend(&mut self);

    /// Record `name` as a local in the innermost scope
    fn declare(&mut self, name: &str);

    fn is_declared(&self, name: &str) -> bool;

    /// The source buffer tokens point into
    fn source(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_state() {
        let mut stack = StackState::new();
        assert!(!stack.is_active());
        stack.push(true);
        stack.push(false);
        assert!(!stack.is_active());
        assert_eq!(stack.pop(), Some(false));
        assert!(stack.is_active());
        assert_eq!(stack.depth(), 1);
        stack.pop();
        assert_eq!(stack.pop(), None);
        assert_eq!(stack.depth(), 0);
    }
}
