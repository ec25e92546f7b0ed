use criterion::{criterion_group, criterion_main, Criterion};
use effigy_engine::{RasterEngine, RasterSpec};
use effigy_image::{Image, ImageCollection};
use effigy_test::TestEngine;
use std::hint::black_box;
use std::sync::Arc;

fn sample_collection(frames: usize) -> ImageCollection {
    let engine = TestEngine::shared();
    let mut collection = ImageCollection::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);
    for n in 0..frames {
        let image = Image::new(
            Arc::clone(&engine) as Arc<dyn RasterEngine>,
            &RasterSpec::solid(4, 4, [n as u8, 0, 0, 255]),
        )
        .unwrap();
        collection.push(image);
    }
    collection
}

fn bench_collection(c: &mut Criterion) {
    let mut group = c.benchmark_group("ImageCollection");

    group.bench_function("coalesce_16", |b| {
        b.iter_batched(
            || sample_collection(16),
            |mut collection| {
                black_box(&mut collection).coalesce().unwrap();
                collection
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("append_horizontally_16", |b| {
        b.iter_batched(
            || sample_collection(16),
            |mut collection| black_box(&mut collection).append_horizontally().unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });

    group.bench_function("write_64", |b| {
        b.iter_batched(
            || sample_collection(64),
            |mut collection| black_box(&mut collection).write().unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_collection);
criterion_main!(benches);
