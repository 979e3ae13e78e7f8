use std::fmt::Write as _;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use dataset_preview::{
    normalize::ResponseNormalizer,
    schema::{InferenceOptions, infer_schema},
};
use serde_json::{Value as JsonValue, json};

fn generate_orders(rows: usize) -> String {
    let mut text = String::from("id,ordered_at,customer,status,amount\n");
    for i in 0..rows {
        let status = match i % 3 {
            0 => "shipped",
            1 => "pending",
            _ => "processing",
        };
        let day = (i % 28) + 1;
        let _ = writeln!(
            text,
            "{i},2024-01-{day:02},\"Customer, {}\",{status},{}.{:02}",
            i % 17,
            i % 500,
            i % 100
        );
    }
    text
}

fn bench_normalize(c: &mut Criterion) {
    let normalizer = ResponseNormalizer::default();
    let options = InferenceOptions::default();

    for rows in [100usize, 5_000] {
        let payload = json!({ "content": generate_orders(rows) });
        c.bench_function(&format!("normalize_content_{rows}"), |b| {
            b.iter_batched(
                || payload.clone(),
                |payload: JsonValue| normalizer.normalize_value(payload),
                BatchSize::SmallInput,
            )
        });

        let table = normalizer.normalize_value(payload.clone()).table;
        c.bench_function(&format!("infer_schema_{rows}"), |b| {
            b.iter(|| infer_schema(&table.rows, &table.headers, &options))
        });

        let full_scan = InferenceOptions {
            window: 0,
            ..options
        };
        c.bench_function(&format!("infer_schema_full_scan_{rows}"), |b| {
            b.iter(|| infer_schema(&table.rows, &table.headers, &full_scan))
        });
    }
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
