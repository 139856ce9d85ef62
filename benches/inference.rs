//! Benchmarks for chromafuzz inference operations

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chromafuzz::{assemble, explain_all, parse_rules, Catalog, InferenceModel, ShapeKind};

const RULE_SETS: [(&str, &str); 3] = [
    ("rules_100", include_str!("../rules_data/rules_100.json")),
    ("rules_60", include_str!("../rules_data/rules_60.json")),
    ("rules_30", include_str!("../rules_data/rules_30.json")),
];

fn model(doc: &str, shape: ShapeKind) -> InferenceModel {
    let report = parse_rules(doc, &Catalog::canonical()).unwrap();
    assemble(report.rules, shape).unwrap()
}

fn assembly_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    for shape in ShapeKind::ALL {
        group.bench_with_input(BenchmarkId::new("rules_100", shape.as_str()), &shape, |b, shape| {
            b.iter(|| black_box(model(RULE_SETS[0].1, *shape)))
        });
    }

    group.finish();
}

fn inference_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer");

    for (name, doc) in RULE_SETS {
        let m = model(doc, ShapeKind::Triangular);
        group.bench_with_input(BenchmarkId::new(name, "grey"), &m, |b, m| {
            b.iter(|| black_box(m.infer(black_box(128.0), black_box(128.0), black_box(128.0))))
        });
    }

    group.finish();
}

fn explain_benchmark(c: &mut Criterion) {
    let m = model(RULE_SETS[0].1, ShapeKind::Trapezoidal);
    let mut group = c.benchmark_group("explain_all");

    for workers in [1, 4] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, workers| {
            b.iter(|| black_box(explain_all(&m, 200.0, 90.0, 30.0, *workers)))
        });
    }

    group.finish();
}

criterion_group!(benches, assembly_benchmark, inference_benchmark, explain_benchmark);

criterion_main!(benches);
