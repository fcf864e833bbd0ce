//! # Scope Stack
//!
//! Nested local-declaration frames, one per definition or block body.
//!
//! ## Overview
//!
//! Entering a scope pushes a [`ScopeFrame`] here and, in lockstep, a fresh
//! `cmdarg`/`cond` context and declaration scope on the lexer. Exiting pops
//! all of them. Frames are strictly LIFO; the stack is empty before a parse
//! starts and after it ends.
//!
//! The lexer's side stacks are only ever mutated through this type, so the
//! two can't drift apart.

use crate::lexer::Lexer;
use compact_str::CompactString;
use smallvec::SmallVec;

/// Context bound to one nested definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    /// Locals in declaration order, without duplicates
    pub declared_locals: SmallVec<[CompactString; 4]>,
    pub is_static_context: bool,
    /// `cmdarg` flag pushed on the lexer when the frame was entered
    pub cmdarg_flag: bool,
    /// `cond` flag pushed on the lexer when the frame was entered
    pub cond_flag: bool,
}

impl ScopeFrame {
    #[must_use]
    pub fn new() -> Self {
        Self {
            declared_locals: SmallVec::new(),
            is_static_context: true,
            cmdarg_flag: false,
            cond_flag: false,
        }
    }

    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.declared_locals.iter().any(|local| local == name)
    }
}

impl Default for ScopeFrame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    enters: usize,
    exits: usize,
    max_depth: usize,
}

impl ScopeStack {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames: Vec::new(),
            enters: 0,
            exits: 0,
            max_depth: 0,
        }
    }

    /// Push a frame and the matching lexer contexts
    pub fn enter<L: Lexer + ?Sized>(&mut self, lexer: &mut L) {
        lexer.extend_static();
        lexer.push_context();
        self.frames.push(ScopeFrame::new());
        self.enters += 1;
        self.max_depth = self.max_depth.max(self.frames.len());
    }

    /// Pop the innermost frame and its lexer contexts.
    ///
    /// # Panics
    ///
    /// Panics if no scope is open. An unmatched exit is a bug in the
    /// automaton, not a property of the input.
    pub fn exit<L: Lexer + ?Sized>(&mut self, lexer: &mut L) {
        assert!(
            !self.frames.is_empty(),
            "exit_scope called without a matching enter_scope"
        );
        self.frames.pop();
        lexer.unextend();
        lexer.pop_context();
        self.exits += 1;
    }

    /// Declare `name` in the innermost frame and the lexer's declaration scope
    pub fn declare<L: Lexer + ?Sized>(&mut self, lexer: &mut L, name: &str) {
        if let Some(frame) = self.frames.last_mut()
            && !frame.declares(name)
        {
            frame.declared_locals.push(CompactString::from(name));
        }
        lexer.declare(name);
    }

    /// Push a `cond` flag on top of the current frame's context
    pub fn push_cond<L: Lexer + ?Sized>(&mut self, lexer: &mut L, flag: bool) {
        lexer.push_cond(flag);
    }

    pub fn pop_cond<L: Lexer + ?Sized>(&mut self, lexer: &mut L) {
        lexer.pop_cond();
    }

    /// Push a `cmdarg` flag on top of the current frame's context
    pub fn push_cmdarg<L: Lexer + ?Sized>(&mut self, lexer: &mut L, flag: bool) {
        lexer.push_cmdarg(flag);
    }

    pub fn pop_cmdarg<L: Lexer + ?Sized>(&mut self, lexer: &mut L) {
        lexer.pop_cmdarg();
    }

    /// Whether the innermost frame declares `name`
    #[must_use]
    pub fn is_declared(&self, name: &str) -> bool {
        self.frames.last().is_some_and(|frame| frame.declares(name))
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> Option<&ScopeFrame> {
        self.frames.last()
    }

    /// Total number of frames entered so far
    #[must_use]
    pub const fn enters(&self) -> usize {
        self.enters
    }

    /// Total number of frames exited so far
    #[must_use]
    pub const fn exits(&self) -> usize {
        self.exits
    }

    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}
