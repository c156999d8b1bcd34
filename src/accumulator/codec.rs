//! # Binary accumulator codec
//!
//! Daily and full accumulators are stored as raw, header-less sequences of 32-bit IEEE-754
//! floats, band-major then row-major: sample `(band, row, col)` is at float offset
//! `band·W·H + row·W + col`. A daily file carries `NUM_ACCUMULATOR_BANDS` planes, a full
//! file carries one extra trailing plane with the days to the closest sample.
//!
//! The raster dimensions are not stored in the file; the caller supplies them and the
//! file size is checked against `planes · W · H · 4` bytes before any value is decoded.
//! A file that does not match is rejected as a whole.
//!
//! Writing is the exact inverse of reading. Data is first written to a sibling temporary
//! file which is renamed onto the final path, so readers never see a partially written
//! accumulator.
//!
//! ## Byte order
//!
//! New files are written little-endian. [`ByteOrder::BigEndian`] reads and writes the
//! legacy files produced by JVM tooling.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use nom::{
    multi::count,
    number::complete::{be_f32, le_f32},
    IResult, Parser,
};
use serde::Deserialize;

use crate::{
    albedo_errors::AlbedoError,
    constants::NUM_ACCUMULATOR_BANDS,
};

use super::{daily::DailyAccumulator, full::FullAccumulator, naming::SampleDate};

/// Size in bytes of one stored sample
pub const SAMPLE_SIZE_BYTES: u64 = 4;

/// Number of planes in a full accumulator file
pub const NUM_FULL_ACCUMULATOR_PLANES: usize = NUM_ACCUMULATOR_BANDS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

/// Expected size in bytes of a file holding `planes` rasters of `width × height` samples.
pub fn expected_file_size(planes: usize, width: usize, height: usize) -> u64 {
    (planes * width * height) as u64 * SAMPLE_SIZE_BYTES
}

fn parse_samples(input: &[u8], n: usize, order: ByteOrder) -> IResult<&[u8], Vec<f32>> {
    match order {
        ByteOrder::LittleEndian => count(le_f32, n).parse(input),
        ByteOrder::BigEndian => count(be_f32, n).parse(input),
    }
}

/// Decode exactly `n` samples from `bytes`.
pub fn decode_samples(bytes: &[u8], n: usize, order: ByteOrder) -> Result<Vec<f32>, AlbedoError> {
    match parse_samples(bytes, n, order) {
        Ok(([], values)) => Ok(values),
        Ok((rest, _)) => Err(AlbedoError::BinaryDecodeError(format!(
            "{} trailing bytes after {n} samples",
            rest.len()
        ))),
        Err(e) => Err(AlbedoError::BinaryDecodeError(e.to_string())),
    }
}

/// Encode samples in the requested byte order.
pub fn encode_samples<'a>(values: impl IntoIterator<Item = &'a f32>, order: ByteOrder) -> Vec<u8> {
    let values = values.into_iter();
    let mut bytes = Vec::with_capacity(values.size_hint().0 * SAMPLE_SIZE_BYTES as usize);
    for v in values {
        match order {
            ByteOrder::LittleEndian => bytes.extend_from_slice(&v.to_le_bytes()),
            ByteOrder::BigEndian => bytes.extend_from_slice(&v.to_be_bytes()),
        }
    }
    bytes
}

/// Read `planes` rasters of `width × height` samples from `path`.
///
/// Arguments
/// -----------------
/// * `path`: File to read.
/// * `planes`: Number of stored planes.
/// * `width`, `height`: Raster dimensions.
/// * `order`: Byte order of the stored samples.
///
/// Return
/// ----------
/// * All samples, band-major, or
///   `AlbedoError::FileSizeMismatch` if the file length is not `planes · W · H · 4` bytes.
pub fn read_planes(
    path: &Utf8Path,
    planes: usize,
    width: usize,
    height: usize,
    order: ByteOrder,
) -> Result<Vec<f32>, AlbedoError> {
    let expected = expected_file_size(planes, width, height);
    let actual = fs::metadata(path)?.len();
    if actual != expected {
        return Err(AlbedoError::FileSizeMismatch {
            path: path.to_string(),
            expected,
            actual,
        });
    }

    let bytes = fs::read(path)?;
    if bytes.len() as u64 != expected {
        return Err(AlbedoError::FileSizeMismatch {
            path: path.to_string(),
            expected,
            actual: bytes.len() as u64,
        });
    }
    decode_samples(&bytes, planes * width * height, order)
}

/// Write `bytes` to `path` through a temporary sibling file and an atomic rename.
fn write_atomically(path: &Utf8Path, bytes: &[u8]) -> Result<(), AlbedoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temporary_path(path);
    if let Err(e) = fs::write(&tmp_path, bytes).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

fn temporary_path(path: &Utf8Path) -> Utf8PathBuf {
    let file_name = path.file_name().unwrap_or("accumulator");
    path.with_file_name(format!(".{file_name}.part"))
}

pub fn read_daily_accumulator(
    path: &Utf8Path,
    date: SampleDate,
    width: usize,
    height: usize,
    order: ByteOrder,
) -> Result<DailyAccumulator, AlbedoError> {
    let bands = read_planes(path, NUM_ACCUMULATOR_BANDS, width, height, order)?;
    DailyAccumulator::new(date, width, height, bands)
}

pub fn write_daily_accumulator(
    path: &Utf8Path,
    daily: &DailyAccumulator,
    order: ByteOrder,
) -> Result<(), AlbedoError> {
    write_atomically(path, &encode_samples(daily.bands(), order))
}

/// Read a full accumulator (summed bands followed by the closest-sample plane).
pub fn read_full_accumulator(
    path: &Utf8Path,
    date: SampleDate,
    width: usize,
    height: usize,
    order: ByteOrder,
) -> Result<FullAccumulator, AlbedoError> {
    let mut samples = read_planes(path, NUM_FULL_ACCUMULATOR_PLANES, width, height, order)?;
    let days = samples.split_off(NUM_ACCUMULATOR_BANDS * width * height);
    FullAccumulator::from_parts(date, width, height, samples, days)
}

pub fn write_full_accumulator(
    path: &Utf8Path,
    full: &FullAccumulator,
    order: ByteOrder,
) -> Result<(), AlbedoError> {
    let bytes = encode_samples(
        full.sum_matrices()
            .iter()
            .chain(full.days_to_closest_sample().iter()),
        order,
    );
    write_atomically(path, &bytes)
}
