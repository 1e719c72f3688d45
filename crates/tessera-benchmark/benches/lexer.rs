use codspeed_criterion_compat::{
    Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use tessera_lexer::Lexer;

static KEYWORDS_AND_OPERATORS: &str = "
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
constraint forall(i in 1..n where i mod 2 = 0)(x[i] + y[i] <= z /\\ not b \\/ c -> d <-> e);
";

static STRINGS: &str = r#"
output ["x = \(x), y = \(y[i]) and z = \(f(z, g(w)))\n" | i in 1..n];
output ["x = \(x), y = \(y[i]) and z = \(f(z, g(w)))\n" | i in 1..n];
output ["x = \(x), y = \(y[i]) and z = \(f(z, g(w)))\n" | i in 1..n];
output ["x = \(x), y = \(y[i]) and z = \(f(z, g(w)))\n" | i in 1..n];
output ["plain strings are a single token, interpolated ones are split"];
output ["plain strings are a single token, interpolated ones are split"];
"#;

static CANDIDATES: [(&str, &str); 2] =
    [("keywords_and_operators", KEYWORDS_AND_OPERATORS), ("strings", STRINGS)];

fn bench_tokenize(c: &mut Criterion) {
    let language = tessera_minizinc::language().unwrap();
    let mut group = c.benchmark_group("tokenize");

    for (name, source) in CANDIDATES {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(name, &source, |b, &s| {
            b.iter(|| {
                for token in Lexer::new(s, language.grammar(), language.scanner()).tokenize() {
                    black_box(token);
                }
            });
        });
    }
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
