use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlpack::{PackOptions, build_statements, escape};

/// `n` rows shaped like the product dump: id, name, description, price, qty, date.
fn product_rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| {
            vec![
                i.to_string(),
                format!("product {i}"),
                format!("description of item {i}, with a \"quote\" and O'Neil's note"),
                format!("{}.{:02}", i % 1000, i % 100),
                (i % 50).to_string(),
                "2021-03-04 05:06:07".to_string(),
            ]
        })
        .collect()
}

fn bench_escape(c: &mut Criterion) {
    let mut group = c.benchmark_group("escape");

    let plain = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Cras nec metus.".repeat(8);
    let dirty = "it's a \"quoted\"\\path\nwith\r\0controls\x1A".repeat(8);
    group.bench_function("plain", |b| b.iter(|| black_box(escape(&plain))));
    group.bench_function("dirty", |b| b.iter(|| black_box(escape(&dirty))));

    group.finish();
}

fn bench_build_statements(c: &mut Criterion) {
    let mut group = c.benchmark_group("packer/build_statements");
    let opts = PackOptions::default();

    for n in [100, 1_000, 10_000] {
        let rows = product_rows(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| {
                black_box(
                    build_statements(rows, "REPLACE INTO `dummy_2` VALUES ", 64 * 1024, &opts)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

fn bench_limit_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("packer/limit");
    let rows = product_rows(5_000);
    let opts = PackOptions::default();

    for limit in [1024, 16 * 1024, 1024 * 1024, 16 * 1024 * 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(limit), &limit, |b, &limit| {
            b.iter(|| {
                black_box(
                    build_statements(&rows, "REPLACE INTO `dummy_2` VALUES ", limit, &opts)
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_escape, bench_build_statements, bench_limit_sweep);
criterion_main!(benches);
