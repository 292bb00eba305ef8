use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tilec::*;

// Composition scenarios over 1-in/1-out links and a binary fork.
// All scenarios compose without warnings.

const PAIR: &str = "a + b";
const GROUPED: &str = "(a + b) + (c + (a + b))";
const TREE: &str = "fork ++ (a + b) (c +1 a)";
const NESTED_TREE: &str = "fork ++ (fork ++ a b +1 c) (fork ++ (a + b) c +1 a)";

fn scenarios() -> [(&'static str, &'static str); 4] {
    [
        ("pair", PAIR),
        ("grouped", GROUPED),
        ("tree", TREE),
        ("nested_tree", NESTED_TREE),
    ]
}

fn link() -> Tile {
    Tile::new("")
        .with_location(Location::new("in").with_role(Role::In).with_comment("x = 0"))
        .with_location(Location::new("mid").final_location())
        .with_location(Location::new("out").with_role(Role::Out))
        .with_transition(Transition::new("a", "in", "mid").with_guard("x < 4"))
        .with_transition(Transition::new("b", "mid", "out"))
}

fn fork() -> Tile {
    Tile::new("")
        .with_location(Location::new("in").with_role(Role::In))
        .with_location(Location::new("l").with_role(Role::Out))
        .with_location(Location::new("r").with_role(Role::Out))
        .with_transition(Transition::new("tl", "in", "l"))
        .with_transition(Transition::new("tr", "in", "r"))
}

fn create_session() -> Session<source::MemoryTileSource> {
    let src = source::MemoryTileSource::new()
        .with("a", TileClass::Accepting, link().with_parameter_bounds("0:5|8:inf"))
        .with("b", TileClass::Accepting, link().with_parameter_bounds("3:10"))
        .with("c", TileClass::Accepting, link())
        .with("fork", TileClass::Binary, fork());
    let catalog = src.catalog().expect("valid catalog");
    Session::new(src, catalog)
}

/// `a + a + ... + a` with `n` operands.
fn generate_chain(n: usize) -> String {
    vec!["a"; n].join(" + ")
}

fn bench_tokenize(c: &mut Criterion) {
    let session = create_session();
    let mut group = c.benchmark_group("tokenize");
    for (name, expr) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), expr, |b, expr| {
            b.iter(|| {
                let r = lexer::tokenize(black_box(expr), session.catalog());
                black_box(&r.tokens);
            });
        });
    }
    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");
    for (name, expr) in scenarios() {
        group.bench_with_input(BenchmarkId::from_parameter(name), expr, |b, expr| {
            b.iter_batched(
                create_session,
                |mut session| {
                    let r = session.compose("bench", black_box(expr)).expect("composes");
                    assert!(r.diagnostics.is_empty());
                    black_box(&r.tile);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

// Scaling vs number of operands in one size-matched chain.
fn bench_chain_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_scaling");
    for n in [2_usize, 8, 32, 128] {
        let expr = generate_chain(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}tiles", n)),
            &expr,
            |b, expr| {
                b.iter_batched(
                    create_session,
                    |mut session| {
                        let r = session.compose("bench", black_box(expr)).expect("composes");
                        black_box(&r.tile);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

// Tokenizing must stay linear in expression length.
fn bench_tokenize_scaling(c: &mut Criterion) {
    let session = create_session();
    let mut group = c.benchmark_group("tokenize_scaling");
    for n in [1_000_usize, 5_000, 20_000] {
        let expr = generate_chain(n);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}tiles", n)),
            &expr,
            |b, expr| {
                b.iter(|| {
                    let r = lexer::tokenize(black_box(expr), session.catalog());
                    black_box(&r.tokens);
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_tokenize_scaling,
    bench_compose,
    bench_chain_scaling
);
criterion_main!(benches);
