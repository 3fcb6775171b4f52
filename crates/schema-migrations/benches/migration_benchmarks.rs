use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schema_migrations::*;

fn migrations(count: u32) -> Vec<Migration> {
    (2..count + 2)
        .rev()
        .map(|v| {
            let steps = vec![
                add_columns(AddColumnsArgs::new(
                    "posts",
                    vec![ColumnArgs::new(format!("col_{v}"), "string").optional()],
                ))
                .unwrap(),
                rename_column(RenameColumnArgs::new("posts", format!("col_{v}"), format!("c{v}")))
                    .unwrap(),
            ];
            Migration::new(v, steps)
        })
        .collect()
}

fn bench_validate_name(c: &mut Criterion) {
    let names = ["post_id", "ROWID", "__proto__", "foo' and delete * from users --"];
    c.bench_function("validate_name x4", |b| {
        b.iter(|| {
            for name in names {
                let _ = black_box(validate_name(black_box(name)));
            }
        })
    });
}

fn bench_create_table(c: &mut Criterion) {
    c.bench_function("create_table 20 columns", |b| {
        b.iter(|| {
            let columns = (0..20)
                .map(|i| ColumnArgs::new(format!("column_{i}"), "number"))
                .collect();
            black_box(create_table(CreateTableArgs::new("measurements", columns)).unwrap())
        })
    });
}

fn bench_schema_migrations(c: &mut Criterion) {
    let input = migrations(100);
    c.bench_function("schema_migrations 100 reversed", |b| {
        b.iter(|| black_box(schema_migrations(input.clone()).unwrap()))
    });
}

fn bench_steps_for_migration(c: &mut Criterion) {
    let spec = schema_migrations(migrations(1000)).unwrap();
    c.bench_function("steps_for_migration full range of 1000", |b| {
        b.iter(|| {
            black_box(steps_for_migration(&spec, spec.min_version(), spec.max_version()))
        })
    });

    c.bench_function("steps_for_migration last version of 1000", |b| {
        b.iter(|| {
            black_box(steps_for_migration(
                &spec,
                spec.max_version() - 1,
                spec.max_version(),
            ))
        })
    });
}

criterion_group!(
    benches,
    bench_validate_name,
    bench_create_table,
    bench_schema_migrations,
    bench_steps_for_migration,
);
criterion_main!(benches);
