use crate::constants::{
    m_band_index, v_band_index, ParamMatrix, ParamVector, E_BAND_INDEX, MASK_BAND_INDEX,
    NUM_PARAMETERS,
};

/// Normal-equation terms of one pixel: `M`, `V`, `E` and the weighted sample count.
///
/// A record is a view lifted out of the flat accumulator bands of a raster, promoted to
/// `f64` so the inversion can run on fixed-size `nalgebra` types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorRecord {
    pub m: ParamMatrix,
    pub v: ParamVector,
    pub e: f64,
    pub mask: f64,
}

impl AccumulatorRecord {
    pub fn zeros() -> Self {
        AccumulatorRecord {
            m: ParamMatrix::zeros(),
            v: ParamVector::zeros(),
            e: 0.0,
            mask: 0.0,
        }
    }

    /// Build a record from a band accessor (`band index -> sample value`).
    pub fn from_bands(band_value: impl Fn(usize) -> f32) -> Self {
        let m = ParamMatrix::from_fn(|row, col| band_value(m_band_index(row, col)) as f64);
        let v = ParamVector::from_fn(|row, _| band_value(v_band_index(row)) as f64);
        AccumulatorRecord {
            m,
            v,
            e: band_value(E_BAND_INDEX) as f64,
            mask: band_value(MASK_BAND_INDEX) as f64,
        }
    }

    /// `true` when at least one observation contributed to this pixel.
    pub fn has_samples(&self) -> bool {
        self.mask > 0.0
    }

    /// Maximum absolute asymmetry `|M[i][j] - M[j][i]|`.
    pub fn asymmetry(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for i in 0..NUM_PARAMETERS {
            for j in (i + 1)..NUM_PARAMETERS {
                worst = worst.max((self.m[(i, j)] - self.m[(j, i)]).abs());
            }
        }
        worst
    }
}

impl Default for AccumulatorRecord {
    fn default() -> Self {
        Self::zeros()
    }
}
