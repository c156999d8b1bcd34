mod common;

use albedo_inversion::{
    accumulation::{
        accumulate, accumulate_directory,
        weight::{DayWeighting, ExponentialDecay},
        write_composites, AccumulationParams, DailyAccumulatorFile,
    },
    accumulator::{codec::read_full_accumulator, AccumulatorRecord, ByteOrder},
    constants::{
        m_band_index, v_band_index, ParamMatrix, ParamVector, E_BAND_INDEX, MASK_BAND_INDEX,
    },
};
use approx::assert_relative_eq;
use common::{date, diagonal_record, utf8_temp_dir, write_daily};

fn params(wings: u32, size: (usize, usize)) -> AccumulationParams {
    AccumulationParams::builder()
        .wings(wings)
        .raster_size(size.0, size.1)
        .build()
        .unwrap()
}

#[test]
fn two_days_around_target() {
    let (_guard, dir) = utf8_temp_dir();
    let size = (2, 2);
    // M = diag(1..=9), V = 1
    let record = AccumulatorRecord {
        m: ParamMatrix::from_diagonal(&ParamVector::from_fn(|i, _| (i + 1) as f64)),
        ..diagonal_record(0.0, 1.0, 0.0, 1.0)
    };
    let files: Vec<DailyAccumulatorFile> = [100, 103]
        .into_iter()
        .map(|doy| {
            let path =
                write_daily(&dir, date(2005, doy), size, ByteOrder::LittleEndian, |_| record);
            DailyAccumulatorFile::from_path(path).unwrap()
        })
        .collect();

    let weighting = ExponentialDecay::default();
    let composites = accumulate(&files, &[date(2005, 101)], &params(180, size), &weighting);
    let full = &composites[0].accumulator;

    let w = (weighting.weight(-1) + weighting.weight(2)) as f64;
    for pixel in 0..4 {
        let acc = full.record_at(pixel);
        for i in 0..9 {
            assert_relative_eq!(acc.m[(i, i)], w * (i + 1) as f64, max_relative = 1e-6);
            assert_relative_eq!(acc.v[i], w, max_relative = 1e-6);
        }
        assert_eq!(acc.m[(0, 1)], 0.0);
        assert_relative_eq!(acc.mask, w, max_relative = 1e-6);
        assert_eq!(full.days_to_closest_sample_at(pixel), 2.0);
    }
    assert_eq!(full.max_asymmetry(), 0.0);
}

#[test]
fn window_spans_year_boundary() {
    let (_guard, dir) = utf8_temp_dir();
    let size = (1, 1);
    let paths = [
        write_daily(&dir, date(2004, 360), size, ByteOrder::LittleEndian, |_| {
            diagonal_record(1.0, 1.0, 1.0, 1.0)
        }),
        write_daily(&dir, date(2005, 10), size, ByteOrder::LittleEndian, |_| {
            diagonal_record(1.0, 1.0, 1.0, 1.0)
        }),
        write_daily(&dir, date(2005, 40), size, ByteOrder::LittleEndian, |_| {
            diagonal_record(1.0, 1.0, 1.0, 1.0)
        }),
    ];
    let files: Vec<_> = paths
        .iter()
        .map(|p| DailyAccumulatorFile::from_path(p.clone()).unwrap())
        .collect();

    let uniform = |_: i32| 1.0_f32;
    let composites = accumulate(&files, &[date(2005, 1)], &params(15, size), &uniform);

    assert_eq!(composites[0].contributing_files, 2);
    let full = &composites[0].accumulator;
    assert_eq!(full.value(MASK_BAND_INDEX, 0, 0), 2.0);
    assert_eq!(full.value(E_BAND_INDEX, 0, 0), 2.0);
    assert_eq!(full.value(v_band_index(3), 0, 0), 2.0);
    // 2004-360 is 6 days before, 2005-010 is 9 days after
    assert_eq!(full.days_to_closest_sample_at(0), 7.0);
}

#[test]
fn partial_coverage_and_closest_sample() {
    let (_guard, dir) = utf8_temp_dir();
    let size = (3, 1);
    // pixel 0 observed at both dates, pixel 1 only far away, pixel 2 never
    let mask_of = |doy: u32, pixel: usize| match (doy, pixel) {
        (_, 0) => 1.0,
        (115, 1) => 1.0,
        _ => 0.0,
    };
    let files: Vec<_> = [115, 98]
        .into_iter()
        .map(|doy| {
            let path = write_daily(&dir, date(2005, doy), size, ByteOrder::LittleEndian, |p| {
                let mask = mask_of(doy, p);
                diagonal_record(mask, mask, 0.0, mask)
            });
            DailyAccumulatorFile::from_path(path).unwrap()
        })
        .collect();

    let composites = accumulate(
        &files,
        &[date(2005, 100)],
        &params(30, size),
        &ExponentialDecay::default(),
    );
    let full = &composites[0].accumulator;
    assert_eq!(full.days_to_closest_sample(), &[3.0, 16.0, 0.0]);
    assert_eq!(full.mask_plane()[2], 0.0);
    assert_eq!(full.value(m_band_index(4, 4), 0, 2), 0.0);
}

#[test]
fn composites_roundtrip_through_disk() {
    let (_guard, input) = utf8_temp_dir();
    let (_out_guard, output) = utf8_temp_dir();
    let size = (4, 3);

    for doy in [1, 5, 9, 13] {
        write_daily(&input, date(2005, doy), size, ByteOrder::BigEndian, |p| {
            diagonal_record(1.0 + p as f64, 0.5, 0.25, 1.0)
        });
    }
    let params = AccumulationParams::builder()
        .wings(8)
        .raster_size(size.0, size.1)
        .byte_order(ByteOrder::BigEndian)
        .targets_per_pass(2)
        .build()
        .unwrap();

    let targets = [date(2005, 1), date(2005, 9), date(2005, 17)];
    let files = DailyAccumulatorFile::discover(&input).unwrap();
    let composites = accumulate(&files, &targets, &params, &ExponentialDecay::default());
    let written = write_composites(&composites, &output, ByteOrder::BigEndian);
    assert_eq!(written.len(), 3);

    for (path, composite) in written.iter().zip(&composites) {
        let back =
            read_full_accumulator(path, composite.window.target, size.0, size.1, ByteOrder::BigEndian)
                .unwrap();
        assert_eq!(back, composite.accumulator);
        assert_eq!(back.max_asymmetry(), 0.0);
    }

    // same result through the batch entry point, processed two targets at a time
    let (_batch_guard, batch_output) = utf8_temp_dir();
    let batch_written = accumulate_directory(
        &input,
        &batch_output,
        &targets,
        &params,
        &ExponentialDecay::default(),
    )
    .unwrap();
    assert_eq!(batch_written.len(), 3);
    let last = read_full_accumulator(&batch_written[2], date(2005, 17), 4, 3, ByteOrder::BigEndian)
        .unwrap();
    assert_eq!(last, composites[2].accumulator);
    assert_eq!(composites[2].contributing_files, 2);
}
