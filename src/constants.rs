//! # Constants and type definitions for albedo inversion
//!
//! This module centralizes the **model dimensions**, **sentinel values**, and **common type
//! definitions** used throughout the crate, together with the pure index helpers that map
//! (spectral band, kernel parameter) pairs onto flat sample positions.
//!
//! ## Overview
//!
//! - BRDF model dimensions (wave bands × kernel parameters)
//! - Accumulator band layout (`M`, `V`, `E`, mask)
//! - No-data sentinel and tile geometry defaults
//! - Fixed-size `nalgebra` aliases for per-pixel linear algebra
//!
//! The fixed-size aliases are stack allocated, so every per-pixel computation owns its own
//! scratch buffers and the pixel loop can run on any number of threads.

use nalgebra::{SMatrix, SVector};

// -------------------------------------------------------------------------------------------------
// Model dimensions
// -------------------------------------------------------------------------------------------------

/// Number of broadband spectral bands (VIS, NIR, SW)
pub const NUM_BBDR_WAVE_BANDS: usize = 3;

/// Number of BRDF kernel parameters per band (isotropic, volumetric, geometric)
pub const NUM_ALBEDO_PARAMETERS: usize = 3;

/// Total number of model parameters `P`
pub const NUM_PARAMETERS: usize = NUM_BBDR_WAVE_BANDS * NUM_ALBEDO_PARAMETERS;

/// Number of flattened accumulator bands: `P² + P + 2` (M, V, E, mask)
pub const NUM_ACCUMULATOR_BANDS: usize = NUM_PARAMETERS * NUM_PARAMETERS + NUM_PARAMETERS + 2;

/// Band index of the first `V` entry
pub const V_BAND_OFFSET: usize = NUM_PARAMETERS * NUM_PARAMETERS;

/// Band index of the residual energy `E`
pub const E_BAND_INDEX: usize = V_BAND_OFFSET + NUM_PARAMETERS;

/// Band index of the validity mask (always the last band)
pub const MASK_BAND_INDEX: usize = NUM_ACCUMULATOR_BANDS - 1;

/// Number of upper-triangular covariance entries, `P(P+1)/2`
pub const NUM_UNCERTAINTY_BANDS: usize = NUM_PARAMETERS * (NUM_PARAMETERS + 1) / 2;

/// Spectral band labels, in parameter order
pub const BBDR_WAVE_BANDS: [&str; NUM_BBDR_WAVE_BANDS] = ["VIS", "NIR", "SW"];

// -------------------------------------------------------------------------------------------------
// Sentinels and numeric policy
// -------------------------------------------------------------------------------------------------

/// No-data value written to every unsolved output sample
pub const NO_DATA_VALUE: f64 = -9999.0;

/// Sample count assigned to a prior pixel whose mean is set but whose spread is zero
pub const PRIOR_NEAR_ZERO_SAMPLES: f64 = 1.0e-20;

/// Half-life (days) of the default exponential day-difference weight
pub const WEIGHT_HALF_LIFE_DAYS: f64 = 11.54;

/// Snow fraction at or below which a pixel is rejected in snow mode
pub const PRIOR_SNOW_FRACTION_MIN: f64 = 0.03;

/// Snow fraction at or above which a pixel is rejected in no-snow mode
pub const PRIOR_SNOW_FRACTION_MAX: f64 = 0.93;

/// Days per year used for cross-year day differences (leap days ignored)
pub const DAYS_PER_YEAR: i32 = 365;

/// Largest valid day of year
pub const MAX_DAY_OF_YEAR: u32 = 366;

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Default temporal half-width of the compositing window (days)
pub const DEFAULT_WINGS: u32 = 180;

/// Default multiplier applied to prior standard deviations
pub const DEFAULT_PRIOR_SCALE_FACTOR: f64 = 30.0;

/// Native MODIS tile width in pixels
pub const MODIS_TILE_WIDTH: usize = 1200;

/// Native MODIS tile height in pixels
pub const MODIS_TILE_HEIGHT: usize = 1200;

/// Accepted tile scale factors with regard to the native 1200x1200 tile
pub const TILE_SCALE_FACTORS: [f64; 9] = [0.5, 1.0, 2.0, 4.0, 6.0, 10.0, 12.0, 20.0, 60.0];

/// Spacing of composite target days in a batch (8-day products)
pub const COMPOSITE_PERIOD_DAYS: u32 = 8;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Day of year, 1..=366
pub type DayOfYear = u32;

/// Calendar year
pub type Year = i32;

/// Symmetric `P×P` matrix of one pixel (design matrix, precision or covariance)
pub type ParamMatrix = SMatrix<f64, NUM_PARAMETERS, NUM_PARAMETERS>;

/// `P×1` vector of one pixel (right-hand side, parameters, prior mean)
pub type ParamVector = SVector<f64, NUM_PARAMETERS>;

// -------------------------------------------------------------------------------------------------
// Index helpers
// -------------------------------------------------------------------------------------------------

/// Flat position of a (band, parameter) pair for a given stride.
///
/// With `stride = NUM_ALBEDO_PARAMETERS` this is the parameter-vector index
/// (`band * 3 + parameter`); it is also used to address prior raster planes.
#[inline]
pub const fn band_parameter_index(band: usize, parameter: usize, stride: usize) -> usize {
    band * stride + parameter
}

/// Accumulator band index of `M[row][col]`.
#[inline]
pub const fn m_band_index(row: usize, col: usize) -> usize {
    row * NUM_PARAMETERS + col
}

/// Accumulator band index of `V[row]`.
#[inline]
pub const fn v_band_index(row: usize) -> usize {
    V_BAND_OFFSET + row
}

/// Position of `(i, j)`, `i <= j`, in the row-major upper triangle of a `P×P` matrix.
#[inline]
pub const fn upper_triangle_index(i: usize, j: usize) -> usize {
    i * NUM_PARAMETERS - i * (i + 1) / 2 + j
}
