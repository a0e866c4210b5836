use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use coa_atlas_core::prelude::*;
use rand::{Rng, SeedableRng};

fn generate_sources(count: usize, min_size: u32, max_size: u32) -> Vec<TexturedMesh> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            TexturedMesh::full_image(format!("tex_{}", i), w, h)
        })
        .collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");

    for count in [25, 50, 100] {
        let sources = generate_sources(count, 16, 96);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("pack", count), &sources, |b, sources| {
            let cfg = AtlasConfig::builder()
                .with_dimensions(128, 128)
                .with_max_dimensions(2048, 2048)
                .build();
            b.iter(|| black_box(pack(sources, &cfg)))
        });

        group.bench_with_input(
            BenchmarkId::new("pack_and_rewrite", count),
            &sources,
            |b, sources| {
                let cfg = AtlasConfig::default();
                b.iter(|| {
                    let atlas = pack(sources, &cfg).expect("pack");
                    black_box(rewrite(&atlas))
                })
            },
        );
    }

    group.finish();
}

fn bench_rescale(c: &mut Criterion) {
    let sources = generate_sources(40, 200, 400);
    c.bench_function("pack_with_rescale", |b| {
        let cfg = AtlasConfig::builder()
            .with_dimensions(256, 256)
            .with_max_dimensions(1024, 1024)
            .build();
        b.iter(|| black_box(pack(&sources, &cfg)))
    });
}

criterion_group!(benches, bench_pack, bench_rescale);
criterion_main!(benches);
