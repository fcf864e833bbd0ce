//! Regression bounds on how much source recovery rescans

use rbparse::automaton::DefinitionGrammar;
use rbparse::builder::{AstBuilder, ParseRoot};
use rbparse::lexer::{Lexer, Scanner};
use rbparse::{DiagnosticClass, Diagnostics, Driver, DriverConfig, ParseStats, RubyVersion};

/// `depth` nested definitions, each indented one level deeper, closed by a
/// single `end` at column 0 after an unindented statement
fn nested_dedent(depth: usize) -> String {
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&"  ".repeat(level));
        source.push_str(&format!("def f{level}\n"));
    }
    source.push_str("x\nend\n");
    source
}

/// `depth` definitions at column 0 and no `end` at all
fn flat_unclosed(depth: usize) -> String {
    (0..depth).map(|level| format!("def f{level}\n")).collect::<String>() + "x\n"
}

fn token_count(source: &str) -> usize {
    let mut scanner = Scanner::new(source, RubyVersion::Ruby31);
    let mut diagnostics = Diagnostics::new();
    let mut count = 0;
    loop {
        count += 1;
        if scanner.next_token(&mut diagnostics).is_eof() {
            return count;
        }
    }
}

fn parse(source: &str, config: DriverConfig) -> (ParseStats, Diagnostics) {
    let mut driver = Driver::from_source(source, AstBuilder::new(), config);
    driver
        .parse::<DefinitionGrammar>(ParseRoot::default(), false)
        .unwrap();
    assert!(driver.scopes().is_empty());
    let stats = driver.stats().clone();
    let (_, diagnostics) = driver.into_parts();
    (stats, diagnostics)
}

#[test]
fn test_nested_dedent_reprocessing_is_bounded() {
    for depth in [1, 2, 4, 8, 16, 32] {
        let source = nested_dedent(depth);
        let tokens = token_count(&source);
        let (stats, diagnostics) = parse(&source, DriverConfig::default());

        assert!(
            stats.tokens_lexed <= (depth + 1) * tokens,
            "depth {depth}: lexed {} tokens for a {tokens}-token source",
            stats.tokens_lexed
        );
        assert!(stats.bytes_reprocessed <= depth * source.len());
        assert_eq!(diagnostics.count(DiagnosticClass::DedentedEnd), depth - 1);
        assert_eq!(stats.max_depth, depth + 1);
    }
}

#[test]
fn test_nested_dedent_rewinds_once_per_misplaced_level() {
    let (stats, _) = parse(&nested_dedent(10), DriverConfig::default());
    assert_eq!(stats.backtracks, 9);
}

#[test]
fn test_unclosed_column_zero_definitions_double_per_level() {
    // every enclosing definition rescans the ones after it
    let (at_10, _) = parse(&flat_unclosed(10), DriverConfig::default());
    let (at_12, _) = parse(&flat_unclosed(12), DriverConfig::default());
    assert_eq!(at_10.tokens_lexed, 7 * (1 << 10) - 4);
    assert_eq!(at_12.tokens_lexed, 7 * (1 << 12) - 4);
    assert_eq!(at_12.tokens_lexed + 4, 4 * (at_10.tokens_lexed + 4));
}

#[test]
fn test_reprocess_limit_bounds_unclosed_definitions() {
    let source = flat_unclosed(40);
    let limit = 4 * source.len();
    let config = DriverConfig::new().with_reprocess_limit(limit);
    let (stats, diagnostics) = parse(&source, config);
    assert!(stats.bytes_reprocessed <= limit);
    assert!(diagnostics.count(DiagnosticClass::EOFInsteadOfEnd) >= 40);
}

#[test]
fn test_reprocess_limit_only_cuts_work() {
    let source = flat_unclosed(8);
    let (unlimited, _) = parse(&source, DriverConfig::default());
    let (limited, _) = parse(&source, DriverConfig::new().with_reprocess_limit(source.len()));
    assert!(limited.bytes_reprocessed < unlimited.bytes_reprocessed);
    assert!(limited.tokens_lexed < unlimited.tokens_lexed);
}
