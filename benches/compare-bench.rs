use criterion::{criterion_group, criterion_main, Criterion};
use sindi::{Compare, Comparator, Frontend, RulesComparator, Simplifier};
use std::hint::black_box;

const PAIRS: &[(&str, &str, &str)] = &[
    ("strict", "x < y", "x <= y"),
    ("halved", "(a+1) > b / 2", "(a+1) > b"),
    ("scaled", "a > b * 2", "a > b * 1"),
    (
        "guard",
        "msg.sender == owner && amount >= limit && !paused",
        "msg.sender == owner && !paused",
    ),
    ("disjunction", "x > 10 || y > 10", "x > 5 || y > 5"),
    (
        "mapping",
        "balances[msg.sender].amount >= 1e18 && block.timestamp < deadline",
        "balances[msg.sender].amount > 10 ** 17",
    ),
];

fn benchmark_compare(c: &mut Criterion) {
    let frontend = Frontend::default();
    let simplifier = Simplifier::default();
    let full = Comparator::default();
    let rules = RulesComparator::default();

    for (name, first, second) in PAIRS {
        c.bench_function(&format!("prepare_{}", name), |b| {
            b.iter(|| frontend.prepare(black_box(first)).unwrap())
        });

        let prepared = frontend.prepare(first).unwrap();
        c.bench_function(&format!("simplify_{}", name), |b| {
            b.iter(|| simplifier.simplify(black_box(&prepared.canonical)).unwrap())
        });

        c.bench_function(&format!("rules_{}", name), |b| {
            b.iter(|| rules.compare(black_box(first), black_box(second)))
        });

        c.bench_function(&format!("full_{}", name), |b| {
            b.iter(|| full.compare(black_box(first), black_box(second)))
        });
    }
}

criterion_group!(benches, benchmark_compare);
criterion_main!(benches);
