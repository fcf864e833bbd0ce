//! Property-based tests for the driver
//!
//! Sources are assembled from Ruby-ish line fragments at random indentation,
//! so most inputs are malformed in some way and exercise recovery.

#![cfg(test)]

use proptest::prelude::*;
use rbparse::automaton::DefinitionGrammar;
use rbparse::builder::{AstBuilder, ParseRoot};
use rbparse::lexer::{Scanner, TokenKind};
use rbparse::{DiagnosticClass, Driver, DriverConfig};

const FRAGMENTS: &[&str] = &[
    "def f",
    "def g(a, *rest, &blk)",
    "def self.h",
    "def",
    "end",
    "class C < Base",
    "module M::N",
    "if x",
    "elsif y",
    "else",
    "unless z",
    "while w do",
    "begin",
    "rescue Error => e",
    "ensure",
    "x = 1",
    "foo bar, baz",
    "items.each do |item|",
    "1 + 2 * 3 ** 4",
    "a == b == c",
    "return x",
    "[1, 2",
    "(a",
    ")",
    "..5",
    "\"open",
    "@ivar",
    "$global",
    "::Top",
    "y if cond",
    "x[1]",
    "%",
    "\tz",
];

fn line() -> impl Strategy<Value = String> {
    (0usize..4, prop::sample::select(FRAGMENTS))
        .prop_map(|(indent, fragment)| format!("{}{}", "  ".repeat(indent), fragment))
}

fn ruby_ish_source() -> impl Strategy<Value = String> {
    prop::collection::vec(line(), 0..12).prop_map(|lines| lines.join("\n"))
}

type AstDriver<'src> = Driver<Scanner<'src>, AstBuilder>;

fn parse(source: &str, config: DriverConfig) -> (Option<String>, AstDriver<'_>) {
    let mut driver = Driver::from_source(source, AstBuilder::new(), config);
    let ast = driver
        .parse::<DefinitionGrammar>(ParseRoot::default(), false)
        .expect("fresh driver");
    let sexp = ast.map(|id| driver.builder().to_sexp(id));
    (sexp, driver)
}

proptest! {
    #[test]
    fn parse_terminates_with_balanced_scopes(source in ruby_ish_source()) {
        let (sexp, driver) = parse(&source, DriverConfig::default());
        prop_assert!(sexp.is_some());
        prop_assert!(driver.scopes().is_empty());
        prop_assert_eq!(driver.scopes().enters(), driver.scopes().exits());
        prop_assert_eq!(driver.diagnostics().count(DiagnosticClass::InternalError), 0);
    }

    #[test]
    fn diagnostics_point_into_the_source(source in ruby_ish_source()) {
        let (_, driver) = parse(&source, DriverConfig::default());
        for diagnostic in driver.diagnostics().iter() {
            prop_assert!(diagnostic.primary.end().to_usize() <= source.len());
            if let Some(secondary) = diagnostic.secondary {
                prop_assert!(secondary.start() >= diagnostic.primary.start());
            }
            prop_assert!(!diagnostic.message().is_empty());
        }
    }

    #[test]
    fn parse_is_deterministic(source in ruby_ish_source()) {
        let (first_sexp, first) = parse(&source, DriverConfig::default());
        let (second_sexp, second) = parse(&source, DriverConfig::default());
        prop_assert_eq!(first_sexp, second_sexp);
        prop_assert_eq!(first.diagnostics().as_slice(), second.diagnostics().as_slice());
        prop_assert_eq!(first.stats(), second.stats());
    }

    #[test]
    fn without_indentation_awareness_nothing_is_rescanned(source in ruby_ish_source()) {
        let config = DriverConfig::new().with_indentation_aware(false);
        let (_, driver) = parse(&source, config);
        prop_assert_eq!(driver.stats().backtracks, 0);
        prop_assert_eq!(driver.diagnostics().count(DiagnosticClass::DedentedEnd), 0);
        prop_assert_eq!(driver.diagnostics().count(DiagnosticClass::DefMissingName), 0);
        prop_assert_eq!(driver.diagnostics().count(DiagnosticClass::InconsistentIndentation), 0);
    }

    #[test]
    fn reprocess_limit_keeps_recovery_balanced(source in ruby_ish_source(), limit in 0usize..64) {
        let config = DriverConfig::new().with_reprocess_limit(limit);
        let (sexp, driver) = parse(&source, config);
        prop_assert!(sexp.is_some());
        prop_assert!(driver.scopes().is_empty());
    }

    #[test]
    fn no_token_from_before_a_rewind_is_consumed(
        source in ruby_ish_source(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut driver: AstDriver<'_> =
            Driver::from_source(&source, AstBuilder::new(), DriverConfig::default());
        let mut tokens = Vec::new();
        loop {
            let token = driver.advance();
            if token.kind == TokenKind::EndOfInput {
                break;
            }
            tokens.push(token);
        }
        let target = tokens[pick.index(tokens.len())];
        let _ = driver.peek();
        driver.rewind_to_tok_start(&target);
        let next = driver.advance();
        if target.is_eof() {
            prop_assert_eq!(next, target);
        } else {
            prop_assert!(next.start() >= target.start());
        }
    }
}
