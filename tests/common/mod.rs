#![allow(dead_code)]

use albedo_inversion::{
    accumulator::{
        codec::write_daily_accumulator, naming::daily_accumulator_file_name, AccumulatorRecord,
        ByteOrder, DailyAccumulator, SampleDate,
    },
    constants::{ParamMatrix, ParamVector},
};
use approx::assert_relative_eq;
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory and its UTF-8 path; the directory lives as long as the guard.
pub fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().expect("temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    (dir, path)
}

/// Record with `M = diag·I`, `V = v` everywhere, and the given `E` and mask.
pub fn diagonal_record(diag: f64, v: f64, e: f64, mask: f64) -> AccumulatorRecord {
    AccumulatorRecord {
        m: ParamMatrix::identity() * diag,
        v: ParamVector::from_element(v),
        e,
        mask,
    }
}

/// Write a daily accumulator of `width × height` pixels, `record_of(pixel)` giving the
/// terms of each pixel, and return its path.
pub fn write_daily(
    dir: &Utf8Path,
    date: SampleDate,
    (width, height): (usize, usize),
    byte_order: ByteOrder,
    record_of: impl Fn(usize) -> AccumulatorRecord,
) -> Utf8PathBuf {
    let mut daily = DailyAccumulator::zeros(date, width, height);
    for pixel in 0..width * height {
        daily.set_record(pixel, &record_of(pixel));
    }
    let path = dir.join(daily_accumulator_file_name(date.year, date.doy).expect("valid date"));
    write_daily_accumulator(&path, &daily, byte_order).expect("daily accumulator written");
    path
}

pub fn date(year: i32, doy: u32) -> SampleDate {
    SampleDate::new(year, doy).expect("valid date")
}

pub fn assert_matrix_close(actual: &ParamMatrix, expected: &ParamMatrix, epsilon: f64) {
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert_relative_eq!(*a, *e, epsilon = epsilon);
    }
}
