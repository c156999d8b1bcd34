use crate::{
    albedo_errors::AlbedoError,
    constants::{MASK_BAND_INDEX, NUM_ACCUMULATOR_BANDS},
};

use super::{naming::SampleDate, record::AccumulatorRecord};

/// One day of per-pixel normal-equation contributions.
///
/// `bands` holds the `NUM_ACCUMULATOR_BANDS` planes back to back, each plane stored
/// row-major: sample `(band, row, col)` lives at `band·W·H + row·W + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAccumulator {
    pub date: SampleDate,
    width: usize,
    height: usize,
    bands: Vec<f32>,
}

impl DailyAccumulator {
    pub fn new(
        date: SampleDate,
        width: usize,
        height: usize,
        bands: Vec<f32>,
    ) -> Result<Self, AlbedoError> {
        let expected = NUM_ACCUMULATOR_BANDS * width * height;
        if bands.len() != expected {
            return Err(AlbedoError::DimensionMismatch(format!(
                "daily accumulator {date}: expected {expected} samples, got {}",
                bands.len()
            )));
        }
        Ok(DailyAccumulator {
            date,
            width,
            height,
            bands,
        })
    }

    /// A daily accumulator with every band set to zero (no observation at all).
    pub fn zeros(date: SampleDate, width: usize, height: usize) -> Self {
        DailyAccumulator {
            date,
            width,
            height,
            bands: vec![0.0; NUM_ACCUMULATOR_BANDS * width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    pub fn bands(&self) -> &[f32] {
        &self.bands
    }

    pub fn band_plane(&self, band: usize) -> &[f32] {
        let n = self.pixel_count();
        &self.bands[band * n..(band + 1) * n]
    }

    pub fn band_plane_mut(&mut self, band: usize) -> &mut [f32] {
        let n = self.pixel_count();
        &mut self.bands[band * n..(band + 1) * n]
    }

    pub fn mask_plane(&self) -> &[f32] {
        self.band_plane(MASK_BAND_INDEX)
    }

    /// Store the normal-equation terms of `record` at `pixel` (`row·W + col`).
    pub fn set_record(&mut self, pixel: usize, record: &AccumulatorRecord) {
        let n = self.pixel_count();
        for (band, value) in record_band_values(record).enumerate() {
            self.bands[band * n + pixel] = value;
        }
    }

    pub fn record_at(&self, pixel: usize) -> AccumulatorRecord {
        let n = self.pixel_count();
        AccumulatorRecord::from_bands(|band| self.bands[band * n + pixel])
    }

    pub fn into_bands(self) -> Vec<f32> {
        self.bands
    }
}

/// Band values of a record in accumulator band order.
pub(crate) fn record_band_values(record: &AccumulatorRecord) -> impl Iterator<Item = f32> + '_ {
    // nalgebra is column-major; the band layout is row-major
    let m = record.m.transpose();
    let m_values: Vec<f32> = m.iter().map(|&x| x as f32).collect();
    m_values
        .into_iter()
        .chain(record.v.iter().map(|&x| x as f32))
        .chain([record.e as f32, record.mask as f32])
}
