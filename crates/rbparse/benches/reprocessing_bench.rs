use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rbparse::automaton::DefinitionGrammar;
use rbparse::builder::{AstBuilder, ParseRoot};
use rbparse::{Driver, DriverConfig};
use std::hint::black_box;

fn nested_dedent(depth: usize) -> String {
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&"  ".repeat(level));
        source.push_str(&format!("def f{level}\n"));
        source.push_str(&"  ".repeat(level + 1));
        source.push_str(&format!("v{level} = {level}\n"));
    }
    source.push_str("x\nend\n");
    source
}

fn well_formed(depth: usize) -> String {
    let mut source = String::new();
    for level in 0..depth {
        source.push_str(&"  ".repeat(level));
        source.push_str(&format!("def f{level}(a, b)\n"));
    }
    for level in (0..depth).rev() {
        source.push_str(&"  ".repeat(level));
        source.push_str("end\n");
    }
    source
}

fn flat_unclosed(depth: usize) -> String {
    (0..depth).map(|level| format!("def f{level}\n")).collect::<String>() + "x\n"
}

fn parse(source: &str, config: DriverConfig) -> usize {
    let mut driver = Driver::from_source(source, AstBuilder::new(), config);
    let _ = driver.parse::<DefinitionGrammar>(ParseRoot::default(), false);
    driver.stats().tokens_lexed
}

fn bench_nested_dedent(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_dedent");
    for depth in [4, 16, 64] {
        let source = nested_dedent(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &source, |b, source| {
            b.iter(|| parse(black_box(source), DriverConfig::default()));
        });
    }
    group.finish();
}

fn bench_well_formed(c: &mut Criterion) {
    let mut group = c.benchmark_group("well_formed");
    for depth in [4, 16, 64] {
        let source = well_formed(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &source, |b, source| {
            b.iter(|| parse(black_box(source), DriverConfig::default()));
        });
    }
    group.finish();
}

fn bench_reprocess_limit(c: &mut Criterion) {
    let source = flat_unclosed(32);
    let limit = 8 * source.len();
    c.bench_function("flat_unclosed_with_limit", |b| {
        b.iter(|| {
            parse(
                black_box(&source),
                DriverConfig::new().with_reprocess_limit(limit),
            )
        });
    });
}

criterion_group!(
    benches,
    bench_nested_dedent,
    bench_well_formed,
    bench_reprocess_limit
);
criterion_main!(benches);
