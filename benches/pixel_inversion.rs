//! Per-pixel inversion benchmarks.
//!
//! Run single-threaded for stable tile numbers:
//!   RAYON_NUM_THREADS=1 cargo bench --bench pixel_inversion

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use albedo_inversion::{
    accumulator::{AccumulatorRecord, FullAccumulator, SampleDate},
    constants::{ParamMatrix, ParamVector, NUM_ACCUMULATOR_BANDS},
    inversion::{entropy::entropy, invert_pixel, tile::invert_tile, InversionParams},
    prior::{PriorParams, PriorRecord, PriorSample, PriorTile},
};

/// Random symmetric positive definite normal equations.
fn random_record(rng: &mut StdRng) -> AccumulatorRecord {
    let a = ParamMatrix::from_fn(|_, _| rng.random_range(-1.0..1.0));
    AccumulatorRecord {
        m: a.transpose() * a + ParamMatrix::identity(),
        v: ParamVector::from_fn(|_, _| rng.random_range(-1.0..1.0)),
        e: rng.random_range(0.0..1.0),
        mask: rng.random_range(1.0..20.0),
    }
}

fn bench_invert_pixel(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xA1BED0);
    let prior = PriorRecord::from_sample(&PriorSample::uniform(0.3, 0.01), &PriorParams::default());

    c.bench_function("invert_pixel/with_prior", |b| {
        b.iter_batched(
            || (0..1_000).map(|_| random_record(&mut rng)).collect::<Vec<_>>(),
            |records| {
                for r in &records {
                    black_box(invert_pixel(Some((black_box(r), 2.0)), Some(&prior)));
                }
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("entropy/identity", |b| {
        let m = ParamMatrix::identity() * 3.0;
        b.iter(|| black_box(entropy(black_box(&m))))
    });
}

fn bench_invert_tile(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let (width, height) = (60, 60);
    let n = width * height;

    let records: Vec<AccumulatorRecord> = (0..n).map(|_| random_record(&mut rng)).collect();
    let mut sums = vec![0.0_f32; NUM_ACCUMULATOR_BANDS * n];
    for (p, record) in records.iter().enumerate() {
        let row_major_m = record.m.transpose();
        let values = row_major_m
            .iter()
            .chain(record.v.iter())
            .copied()
            .chain([record.e, record.mask]);
        for (band, value) in values.enumerate() {
            sums[band * n + p] = value as f32;
        }
    }
    let full = FullAccumulator::from_parts(
        SampleDate::new(2005, 121).expect("valid date"),
        width,
        height,
        sums,
        vec![1.0; n],
    )
    .expect("consistent dimensions");
    let prior = PriorTile::filled(width, height, &PriorSample::uniform(0.3, 0.01));
    let params = InversionParams::default();

    c.bench_function("invert_tile/60x60_with_prior", |b| {
        b.iter(|| {
            black_box(
                invert_tile(Some(&full), Some(&prior), &params, (width, height))
                    .expect("tile inversion"),
            )
        })
    });
}

criterion_group!(benches, bench_invert_pixel, bench_invert_tile);
criterion_main!(benches);
