//! # Full accumulator
//!
//! A [`FullAccumulator`] is the temporally weighted sum of every daily accumulator falling
//! inside the compositing window of one target day. It keeps the same band layout as a
//! daily accumulator and adds a single plane holding, per pixel, the distance in days to
//! the closest contributing observation.
//!
//! ## Layout
//!
//! | planes                     | content                                   |
//! |----------------------------|-------------------------------------------|
//! | `0..81`                    | `M[row][col]`, row-major                  |
//! | `81..90`                   | `V[row]`                                  |
//! | `90`                       | `E`                                       |
//! | `91`                       | mask (weighted number of samples)         |
//! | `92` (on disk only)        | days to the closest sample                |
//!
//! See also
//! ------------
//! * [`crate::accumulator::codec`] – On-disk encoding of this layout.
//! * [`crate::accumulation`] – Builds full accumulators from daily files.

use crate::{
    albedo_errors::AlbedoError,
    constants::{MASK_BAND_INDEX, NUM_ACCUMULATOR_BANDS},
};

use super::{naming::SampleDate, record::AccumulatorRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct FullAccumulator {
    pub date: SampleDate,
    width: usize,
    height: usize,
    sum_matrices: Vec<f32>,
    days_to_closest_sample: Vec<f32>,
}

impl FullAccumulator {
    /// An all-zero accumulator: no contribution, mask zero everywhere.
    pub fn zeros(date: SampleDate, width: usize, height: usize) -> Self {
        let n = width * height;
        FullAccumulator {
            date,
            width,
            height,
            sum_matrices: vec![0.0; NUM_ACCUMULATOR_BANDS * n],
            days_to_closest_sample: vec![0.0; n],
        }
    }

    /// Assemble a full accumulator from its summed bands and its closest-sample plane.
    ///
    /// Return
    /// ----------
    /// * `Err(AlbedoError::DimensionMismatch)` if either buffer does not match `width × height`.
    pub fn from_parts(
        date: SampleDate,
        width: usize,
        height: usize,
        sum_matrices: Vec<f32>,
        days_to_closest_sample: Vec<f32>,
    ) -> Result<Self, AlbedoError> {
        let n = width * height;
        if sum_matrices.len() != NUM_ACCUMULATOR_BANDS * n {
            return Err(AlbedoError::DimensionMismatch(format!(
                "full accumulator {date}: expected {} summed samples, got {}",
                NUM_ACCUMULATOR_BANDS * n,
                sum_matrices.len()
            )));
        }
        if days_to_closest_sample.len() != n {
            return Err(AlbedoError::DimensionMismatch(format!(
                "full accumulator {date}: expected {n} closest-sample values, got {}",
                days_to_closest_sample.len()
            )));
        }
        Ok(FullAccumulator {
            date,
            width,
            height,
            sum_matrices,
            days_to_closest_sample,
        })
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

    pub fn sum_matrices(&self) -> &[f32] {
        &self.sum_matrices
    }

    pub fn band_plane(&self, band: usize) -> &[f32] {
        let n = self.pixel_count();
        &self.sum_matrices[band * n..(band + 1) * n]
    }

    pub fn mask_plane(&self) -> &[f32] {
        self.band_plane(MASK_BAND_INDEX)
    }

    pub fn days_to_closest_sample(&self) -> &[f32] {
        &self.days_to_closest_sample
    }

    /// Mutable access to both buffers at once, used by the accumulation fold.
    pub(crate) fn planes_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.sum_matrices, &mut self.days_to_closest_sample)
    }

    /// Sample of `band` at (`row`, `col`).
    pub fn value(&self, band: usize, row: usize, col: usize) -> f32 {
        self.sum_matrices[band * self.pixel_count() + row * self.width + col]
    }

    /// Normal-equation terms of the pixel at flat index `pixel` (`row·W + col`).
    pub fn record_at(&self, pixel: usize) -> AccumulatorRecord {
        let n = self.pixel_count();
        AccumulatorRecord::from_bands(|band| self.sum_matrices[band * n + pixel])
    }

    pub fn days_to_closest_sample_at(&self, pixel: usize) -> f32 {
        self.days_to_closest_sample[pixel]
    }

    /// Largest `|M[i][j] - M[j][i]|` over the whole raster.
    ///
    /// Summing symmetric daily matrices with scalar weights keeps `M` symmetric, so
    /// this is only expected to be non zero for corrupted inputs.
    pub fn max_asymmetry(&self) -> f64 {
        (0..self.pixel_count())
            .map(|p| self.record_at(p).asymmetry())
            .fold(0.0, f64::max)
    }

    pub fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.sum_matrices, self.days_to_closest_sample)
    }
}
