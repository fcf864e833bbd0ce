//! # rbparse
//!
//! A recovering parser driver for a Ruby-like language.
//!
//! ## Overview
//!
//! The [`Driver`](driver::Driver) coordinates three collaborators:
//!
//! - a grammar [`Automaton`](automaton::Automaton) that recognizes constructs
//! - a hand-written, state-dependent [`Lexer`](lexer::Lexer) that supports
//!   rewinding its cursor
//! - a [`Builder`](builder::Builder) producing AST nodes
//!
//! When a construct is closed at the wrong indentation, or never closed at
//! all, the driver reports it and rewinds the lexer so the automaton re-reads
//! the misplaced tokens in the enclosing construct. A parse always produces a
//! tree; problems in the source go to the [`Diagnostics`](diagnostics::Diagnostics)
//! log.
//!
//! ## Quick Start
//!
//! ```
//! use rbparse::automaton::DefinitionGrammar;
//! use rbparse::builder::{AstBuilder, ParseRoot};
//! use rbparse::config::RubyVersion;
//! use rbparse::diagnostics::DiagnosticClass;
//! use rbparse::driver::Driver;
//!
//! let source = "class Foo\n  def bar\n    1\nend\n";
//! let mut driver = Driver::new(RubyVersion::Ruby31, source, AstBuilder::new(), false, true);
//! let ast = driver
//!     .parse::<DefinitionGrammar>(ParseRoot::new("foo.rb"), false)
//!     .unwrap()
//!     .unwrap();
//!
//! // `end` is dedented to the class's level, so it closes the class
//! assert_eq!(driver.diagnostics().count(DiagnosticClass::DedentedEnd), 1);
//! assert_eq!(driver.diagnostics().count(DiagnosticClass::EOFInsteadOfEnd), 0);
//! println!("{}", driver.builder().to_sexp(ast));
//! ```
//!
//! ## Features
//!
//! - `diagnostics`: `miette` reports for [`Diagnostic`](diagnostics::Diagnostic)
//!   and [`DriverError`]
//! - `serialize`: serde derives on tokens, ranges, diagnostics and configuration

pub mod arena;
pub mod automaton;
pub mod builder;
pub mod config;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod scope;
pub mod testing;
pub mod text;
pub mod token_names;

pub use config::{DriverConfig, RubyVersion, Variant};
pub use diagnostics::{Diagnostic, DiagnosticClass, DiagnosticLevel, Diagnostics};
pub use driver::{Driver, ParseStats};
pub use error::{DriverError, DriverResult};
pub use text::{TextRange, TextSize};
