use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use tessera_parse::{Language, Parser};
use tessera_tree::InputEdit;
use text_size::TextRange;

static QUEENS: &str = r#"include "alldifferent.mzn";

int: n = 8;
array[1..n] of var 1..n: q;

constraint alldifferent(q);
constraint alldifferent([q[i] + i | i in 1..n]);
constraint alldifferent([q[i] - i | i in 1..n]);
constraint forall(i, j in 1..n where i < j)(q[i] != q[j]);

solve :: int_search(q, first_fail, indomain_min) satisfy;
output [if fix(q[j]) == i then "Q" else "." endif ++ if j == n then "\n" else "" endif | i, j in 1..n];
"#;

static QUEENS_DATA: &str = "n = 8;\nq = [1, 5, 8, 6, 3, 7, 2, 4];\nrows = 1..8;\ngrid = [| 1, 0 | 0, 1 |];\n";

static MAGIC_SQUARE: &str = r#"language ESSENCE' 1.0
given n : int(1..)
letting N be n * n
letting RANGE be domain int(1..N)
find square : matrix indexed by [int(1..n), int(1..n)] of RANGE
such that
    allDiff(flatten(square)),
    forAll i : int(1..n) . sum([ square[i, j] | j : int(1..n) ]) = n * (N + 1) / 2,
    forAll j : int(1..n) . sum([ square[i, j] | i : int(1..n) ]) = n * (N + 1) / 2,
    sum k : int(1..n) . square[k, k] = n * (N + 1) / 2
heuristic sdf
"#;

fn candidates() -> Vec<(&'static str, Language, &'static str)> {
    vec![
        ("minizinc", tessera_minizinc::language().unwrap(), QUEENS),
        ("datazinc", tessera_datazinc::language().unwrap(), QUEENS_DATA),
        ("eprime", tessera_eprime::language().unwrap(), MAGIC_SQUARE),
    ]
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, language, source) in candidates() {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", name), &source, |b, &source| {
            let mut parser = Parser::new(language.clone());
            b.iter(|| black_box(parser.parse(source, None, &[])));
        });
    }

    group.finish();
}

/// Replaces the first `8` of each source and parses again against the old
/// tree.
fn benchmark_reparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Reparse Benchmark");

    for (name, language, source) in candidates() {
        let Some(offset) = source.find('8').or_else(|| source.find('1')) else { continue };
        let range = TextRange::at((offset as u32).into(), 1.into());
        let (edit, text) = InputEdit::replace(source, range, "12");

        let mut parser = Parser::new(language);
        let old = parser.parse(source, None, &[]);

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("reparse", name), &text, |b, text| {
            b.iter(|| black_box(parser.parse(text, Some(&old), &[edit])));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser, benchmark_reparse);
criterion_main!(benches);
