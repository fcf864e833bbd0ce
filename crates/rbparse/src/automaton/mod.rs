//! # Automata
//!
//! The grammar side of a parse.
//!
//! ## Overview
//!
//! An [`Automaton`] is constructed with the builder's root handle, bound to a
//! [`Driver`] for one [`run`](Automaton::run), and calls back into the driver
//! as it recognizes constructs: it pulls tokens, opens and closes scopes, and
//! asks the rewind engine to validate indentation. The driver treats it as a
//! black box, so any strategy can be injected, including the scripted double
//! in [`testing`](crate::testing).
//!
//! [`DefinitionGrammar`] is the reference automaton for the Ruby subset.

mod definitions;
mod expressions;

pub use definitions::DefinitionGrammar;
pub use expressions::{Associativity, OperatorInfo, infix_operator};

use crate::builder::Builder;
use crate::driver::Driver;
use crate::lexer::Lexer;

pub trait Automaton<L: Lexer, B: Builder> {
    /// Construct bound to the builder's root handle
    fn new(root: B::Root) -> Self
    where
        Self: Sized;

    /// Trace verbosity; 0 disables tracing. Only forwarded by the debug variant.
    fn set_trace_level(&mut self, level: u8);

    /// Drive one parse to completion
    fn run(&mut self, driver: &mut Driver<L, B>);
}
