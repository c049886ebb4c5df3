use blocktext_engine::editing::{Step, Transaction};
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_transaction_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction");
    group.sample_size(10);

    let doc = common::generate_document(500);

    group.bench_function("insert_text", |b| {
        b.iter(|| {
            let mut d = doc.clone();
            let tr = Transaction::new().step(Step::InsertText {
                block: std::hint::black_box(250),
                offset: 5,
                text: "test".to_string(),
            });
            std::hint::black_box(tr.apply(&mut d).unwrap());
        });
    });

    group.bench_function("split_then_join", |b| {
        b.iter(|| {
            let mut d = doc.clone();
            let tr = Transaction::new()
                .step(Step::SplitBlock {
                    block: std::hint::black_box(250),
                    offset: 10,
                })
                .step(Step::JoinBlocks { index: 250 });
            std::hint::black_box(tr.apply(&mut d).unwrap());
        });
    });

    group.bench_function("apply_then_invert", |b| {
        b.iter(|| {
            let mut d = doc.clone();
            let tr = Transaction::new().step(Step::DeleteBlock {
                index: std::hint::black_box(100),
            });
            let result = tr.apply(&mut d).unwrap();
            std::hint::black_box(result.inverse().apply(&mut d).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_transaction_operations);
criterion_main!(benches);
