//! End-to-end recovery scenarios through the reference grammar

use rbparse::automaton::DefinitionGrammar;
use rbparse::builder::{AstBuilder, ParseRoot};
use rbparse::lexer::{Scanner, TokenKind};
use rbparse::{DiagnosticClass, Driver, DriverConfig, DriverError, RubyVersion, TextSize};

type AstDriver<'src> = Driver<Scanner<'src>, AstBuilder>;

fn parse_with_config(source: &str, config: DriverConfig) -> (String, AstDriver<'_>) {
    let mut driver = Driver::from_source(source, AstBuilder::new(), config);
    let ast = driver
        .parse::<DefinitionGrammar>(ParseRoot::new("test.rb"), false)
        .unwrap()
        .expect("the grammar always stores a program");
    let sexp = driver.builder().to_sexp(ast);
    (sexp, driver)
}

fn parse(source: &str) -> (String, AstDriver<'_>) {
    parse_with_config(source, DriverConfig::default())
}

fn classes(driver: &AstDriver<'_>) -> Vec<DiagnosticClass> {
    driver.diagnostics().iter().map(|d| d.class).collect()
}

#[test]
fn test_well_formed_source_has_no_diagnostics() {
    let source = "class Greeter\n  def greet(name)\n    puts name\n  end\nend\n";
    let (sexp, driver) = parse(source);
    assert_eq!(
        sexp,
        "(program (stmts (class (const nil Greeter) nil (stmts (def greet (args name) (stmts (send nil :puts (lvar name))))))))"
    );
    assert!(driver.diagnostics().is_empty());
    assert_eq!(driver.stats().backtracks, 0);
}

#[test]
fn test_nested_unclosed_defs_report_innermost_first() {
    let (sexp, driver) = parse("def f1\n  def f2\n    x");
    assert_eq!(
        classes(&driver),
        [DiagnosticClass::EOFInsteadOfEnd, DiagnosticClass::EOFInsteadOfEnd]
    );
    let diags = driver.diagnostics().as_slice();
    assert_eq!(diags[0].primary.start(), TextSize::new(9));
    assert_eq!(diags[1].primary.start(), TextSize::new(0));
    assert_eq!(
        sexp,
        "(program (stmts (def f1 (args) (stmts (def f2 (args) (stmts (send nil :x)))))))"
    );
    assert!(driver.scopes().is_empty());
}

#[test]
fn test_dedented_end_is_handed_to_the_enclosing_level() {
    let source = "  def f\n    1\nend";
    let (sexp, driver) = parse(source);

    let first = &driver.diagnostics().as_slice()[0];
    assert_eq!(first.class, DiagnosticClass::DedentedEnd);
    assert_eq!(first.primary.kind, TokenKind::KwDef);
    assert_eq!(first.secondary.map(|t| t.start()), Some(TextSize::new(14)));
    assert!(first.message().contains("dedented"));

    // resumed at the `end`, which the top level then rejects
    assert_eq!(driver.stats().last_rewind, Some(TextSize::new(14)));
    assert_eq!(driver.diagnostics().count(DiagnosticClass::UnexpectedToken), 1);
    assert!(sexp.starts_with("(program (stmts (def f (args) (stmts (int 1)))"));
}

#[test]
fn test_def_missing_name_leaves_the_name_for_the_body() {
    let (sexp, driver) = parse("def\n  foo");
    assert_eq!(
        classes(&driver),
        [DiagnosticClass::DefMissingName, DiagnosticClass::EOFInsteadOfEnd]
    );
    let missing = &driver.diagnostics().as_slice()[0];
    assert_eq!(missing.secondary.map(|t| t.start()), Some(TextSize::new(6)));
    assert_eq!(driver.stats().last_rewind, Some(TextSize::new(3)));
    assert_eq!(sexp, "(program (stmts (def ? (args) (stmts (send nil :foo)))))");
}

#[test]
fn test_dedented_statement_truncates_enclosing_bodies() {
    let source = "def f1\n  def f2\n    def f3\nx\nend\n";
    let (sexp, driver) = parse(source);
    assert_eq!(
        classes(&driver),
        [DiagnosticClass::DedentedEnd, DiagnosticClass::DedentedEnd]
    );
    assert_eq!(
        sexp,
        "(program (stmts (def f1 (args) (stmts (def f2 (args) (stmts (def f3 (args) (stmts)))) (send nil :x)))))"
    );
    assert!(driver.scopes().is_empty());
}

// A body with a `rescue` clause can't be split at the dedent, so the whole
// body is dropped and everything after the header is parsed again outside.
#[test]
fn test_untruncatable_body_falls_back_to_empty() {
    let source = "  def foo\n    x\n  y\n  rescue\n    z\nend";
    let (sexp, driver) = parse(source);
    assert_eq!(driver.stats().last_rewind, Some(TextSize::new(9)));
    assert_eq!(driver.diagnostics().count(DiagnosticClass::DedentedEnd), 1);
    assert_eq!(
        sexp,
        "(program (stmts (def foo (args) (stmts)) (send nil :x) (send nil :y) (send nil :z)))"
    );
}

#[test]
fn test_unindented_body_becomes_empty() {
    let (sexp, driver) = parse("  def f\n  g\n");
    assert_eq!(classes(&driver), [DiagnosticClass::EOFInsteadOfEnd]);
    assert_eq!(sexp, "(program (stmts (def f (args) (stmts)) (send nil :g)))");
}

#[test]
fn test_class_and_module_in_def() {
    let (_, driver) = parse("def f\n  class A\n  end\n  module B\n  end\nend\n");
    assert_eq!(
        classes(&driver),
        [DiagnosticClass::ClassInDef, DiagnosticClass::ModuleInDef]
    );
}

#[test]
fn test_missing_end_without_indentation_awareness() {
    let config = DriverConfig::new().with_indentation_aware(false);
    let (sexp, driver) = parse_with_config("  def f\n    1\nend", config);
    assert!(driver.diagnostics().is_empty());
    assert_eq!(driver.stats().backtracks, 0);
    assert_eq!(sexp, "(program (stmts (def f (args) (stmts (int 1)))))");
}

#[test]
fn test_block_recovers_like_a_definition() {
    let (_, driver) = parse("  each do |x|\n    x\nend\n");
    assert_eq!(driver.diagnostics().count(DiagnosticClass::DedentedEnd), 1);
    assert!(driver.scopes().is_empty());
}

#[test]
fn test_diagnostic_render_points_at_the_opener() {
    let source = "def f\n  if x\n    1\n";
    let (_, driver) = parse(source);
    let rendered: Vec<String> = driver
        .diagnostics()
        .iter()
        .map(|d| d.render(source, "test.rb"))
        .collect();
    assert_eq!(rendered.len(), 2);
    assert!(rendered[0].starts_with("test.rb:2:3: error:"));
    assert!(rendered[1].starts_with("test.rb:1:1: error:"));
}

#[test]
fn test_driver_parses_once() {
    let mut driver: AstDriver<'_> =
        Driver::new(RubyVersion::Ruby31, "x", AstBuilder::new(), false, true);
    assert!(driver
        .parse::<DefinitionGrammar>(ParseRoot::default(), false)
        .unwrap()
        .is_some());
    let second = driver.parse::<DefinitionGrammar>(ParseRoot::default(), false);
    assert!(matches!(second, Err(DriverError::AlreadyParsed)));
}

#[test]
fn test_into_parts_keeps_the_tree() {
    let mut driver: AstDriver<'_> =
        Driver::new(RubyVersion::Ruby31, "def f\nend\n", AstBuilder::new(), false, true);
    let ast = driver
        .parse::<DefinitionGrammar>(ParseRoot::default(), false)
        .unwrap()
        .unwrap();
    let (builder, diagnostics) = driver.into_parts();
    assert!(diagnostics.is_empty());
    assert_eq!(builder.to_sexp(ast), "(program (stmts (def f (args) nil)))");
}
