//! # Prior knowledge
//!
//! A prior is a per-pixel Gaussian belief on the `P` BRDF parameters, given as a mean and a
//! spread for each (band, parameter) pair plus a snow fraction, a land/water flag and a
//! sample count. It regularizes the inversion: its precision and precision-weighted mean
//! are added to the normal equations of the observations.
//!
//! ## Construction of a [`PriorRecord`]
//!
//! For every (band `b`, parameter `j`) entry, at index `i = b·3 + j`:
//!
//! 1. a positive mean with a zero spread is forced valid: the spread becomes `1.0` and
//!    the sample count is set to [`PRIOR_NEAR_ZERO_SAMPLES`],
//! 2. the spread is scaled, `s = min(1, sd · scale_factor)`, and `C[i][i] = s²`,
//! 3. `C` is inverted through an LU decomposition. When it is singular the identity is
//!    used instead, provided every mean and scaled spread lies in `(0, 1]`; otherwise the
//!    pixel is rejected,
//! 4. `V = diag(C⁻¹) ⊙ mean`.
//!
//! The pixel is then validated (see [`validation`]) and its mask is `1` if accepted,
//! `0` otherwise.
//!
//! See also
//! ------------
//! * [`crate::inversion::invert_pixel`] – Combines a prior record with the observations.

pub mod validation;

use itertools::iproduct;
use serde::Deserialize;

use crate::{
    albedo_errors::AlbedoError,
    constants::{
        band_parameter_index, ParamMatrix, ParamVector, DEFAULT_PRIOR_SCALE_FACTOR,
        NUM_ALBEDO_PARAMETERS, NUM_BBDR_WAVE_BANDS, NUM_PARAMETERS, PRIOR_NEAR_ZERO_SAMPLES,
    },
};

use self::validation::{validate_prior_pixel, PriorValidity};

/// Which validity codes let a prior pixel through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorAcceptance {
    /// Only fully valid pixels
    #[default]
    Strict,
    /// Also pixels whose mean exceeds one
    Relaxed,
}

/// How the spread planes of a prior are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorUncertainty {
    #[default]
    StandardDeviation,
    Variance,
}

/// Parameters of the prior construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorParams {
    /// Multiplier applied to the standard deviations before clamping to 1
    pub scale_factor: f64,
    /// Validate against the snow prior instead of the no-snow prior
    pub compute_snow: bool,
    pub acceptance: PriorAcceptance,
    pub uncertainty: PriorUncertainty,
}

impl Default for PriorParams {
    fn default() -> Self {
        PriorParams {
            scale_factor: DEFAULT_PRIOR_SCALE_FACTOR,
            compute_snow: false,
            acceptance: PriorAcceptance::Strict,
            uncertainty: PriorUncertainty::StandardDeviation,
        }
    }
}

/// Raw prior values of one pixel, indexed `[band][parameter]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorSample {
    pub mean: [[f64; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS],
    pub spread: [[f64; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS],
    pub n_samples: f64,
    pub snow_fraction: f64,
    pub land_water_type: i32,
}

impl PriorSample {
    /// A land pixel with the same mean and spread for every entry.
    pub fn uniform(mean: f64, spread: f64) -> Self {
        PriorSample {
            mean: [[mean; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS],
            spread: [[spread; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS],
            n_samples: 1.0,
            snow_fraction: 0.0,
            land_water_type: 1,
        }
    }
}

/// Prior terms of one pixel, ready to be combined with the observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorRecord {
    /// Precision matrix `C⁻¹`
    pub precision: ParamMatrix,
    /// Precision-weighted mean `diag(C⁻¹) ⊙ mean`
    pub weighted_mean: ParamVector,
    pub mean: ParamVector,
    pub n_samples: f64,
    /// `1` if the prior is usable, `0` otherwise
    pub mask: f64,
    pub validity: PriorValidity,
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

fn in_unit_interval(x: f64) -> bool {
    x > 0.0 && x <= 1.0
}

impl PriorRecord {
    fn rejected(mean: ParamVector, n_samples: f64, validity: PriorValidity) -> Self {
        PriorRecord {
            precision: ParamMatrix::zeros(),
            weighted_mean: ParamVector::zeros(),
            mean,
            n_samples,
            mask: 0.0,
            validity,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.mask > 0.0
    }

    /// Build the prior terms of one pixel.
    ///
    /// Arguments
    /// -----------------
    /// * `sample`: Raw prior values of the pixel.
    /// * `params`: Scale factor, snow mode, acceptance mode and spread convention.
    ///
    /// Return
    /// ----------
    /// * A record whose `mask` is `1` when the prior can be used. Rejected pixels keep
    ///   their mean and the reason of the rejection in `validity`.
    pub fn from_sample(sample: &PriorSample, params: &PriorParams) -> Self {
        let mut mean = ParamVector::zeros();
        let mut sd = ParamVector::zeros();
        let mut forced_valid = false;

        for (band, parameter) in iproduct!(0..NUM_BBDR_WAVE_BANDS, 0..NUM_ALBEDO_PARAMETERS) {
            let i = band_parameter_index(band, parameter, NUM_ALBEDO_PARAMETERS);
            let m = finite_or_zero(sample.mean[band][parameter]);
            let spread = finite_or_zero(sample.spread[band][parameter]);
            let mut s = match params.uncertainty {
                PriorUncertainty::StandardDeviation => spread,
                PriorUncertainty::Variance => spread.max(0.0).sqrt(),
            };
            if m > 0.0 && s == 0.0 {
                s = 1.0;
                forced_valid = true;
            }
            mean[i] = m;
            sd[i] = s;
        }
        let n_samples = if forced_valid {
            PRIOR_NEAR_ZERO_SAMPLES
        } else {
            sample.n_samples
        };

        let validity = validate_prior_pixel(
            &mean,
            sample.snow_fraction,
            sample.land_water_type,
            params.compute_snow,
        );
        if !validity.is_accepted(params.acceptance) {
            return Self::rejected(mean, n_samples, validity);
        }

        let scaled = sd.map(|s| (s * params.scale_factor).min(1.0));
        let covariance = ParamMatrix::from_diagonal(&scaled.component_mul(&scaled));

        let inverse = covariance
            .lu()
            .try_inverse()
            .filter(|inverse| inverse.iter().all(|x| x.is_finite()));
        let precision = match inverse {
            Some(inverse) => inverse,
            None => {
                let in_range = (0..NUM_PARAMETERS)
                    .all(|i| in_unit_interval(mean[i]) && in_unit_interval(scaled[i]));
                if !in_range {
                    return Self::rejected(mean, n_samples, PriorValidity::DegenerateSpread);
                }
                ParamMatrix::identity()
            }
        };

        PriorRecord {
            precision,
            weighted_mean: precision.diagonal().component_mul(&mean),
            mean,
            n_samples,
            mask: 1.0,
            validity,
        }
    }
}

/// Prior rasters of a tile.
///
/// `mean` and `spread` hold `P` planes each, plane `band·3 + parameter`; the other rasters
/// hold a single plane. All planes are row-major `width × height`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorTile {
    width: usize,
    height: usize,
    mean: Vec<f32>,
    spread: Vec<f32>,
    n_samples: Vec<f32>,
    snow_fraction: Vec<f32>,
    land_water_type: Vec<f32>,
}

impl PriorTile {
    pub fn new(
        width: usize,
        height: usize,
        mean: Vec<f32>,
        spread: Vec<f32>,
        n_samples: Vec<f32>,
        snow_fraction: Vec<f32>,
        land_water_type: Vec<f32>,
    ) -> Result<Self, AlbedoError> {
        let n = width * height;
        let check = |name: &str, len: usize, expected: usize| {
            if len == expected {
                Ok(())
            } else {
                Err(AlbedoError::DimensionMismatch(format!(
                    "prior {name}: expected {expected} samples, got {len}"
                )))
            }
        };
        check("mean", mean.len(), NUM_PARAMETERS * n)?;
        check("spread", spread.len(), NUM_PARAMETERS * n)?;
        check("sample count", n_samples.len(), n)?;
        check("snow fraction", snow_fraction.len(), n)?;
        check("land/water", land_water_type.len(), n)?;

        Ok(PriorTile {
            width,
            height,
            mean,
            spread,
            n_samples,
            snow_fraction,
            land_water_type,
        })
    }

    /// A tile where every pixel holds `sample`.
    pub fn filled(width: usize, height: usize, sample: &PriorSample) -> Self {
        let n = width * height;
        let planes = |values: &[[f64; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS]| {
            iproduct!(0..NUM_BBDR_WAVE_BANDS, 0..NUM_ALBEDO_PARAMETERS)
                .flat_map(|(b, j)| std::iter::repeat(values[b][j] as f32).take(n))
                .collect::<Vec<f32>>()
        };
        PriorTile {
            width,
            height,
            mean: planes(&sample.mean),
            spread: planes(&sample.spread),
            n_samples: vec![sample.n_samples as f32; n],
            snow_fraction: vec![sample.snow_fraction as f32; n],
            land_water_type: vec![sample.land_water_type as f32; n],
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

    /// Raw prior values of the pixel at flat index `pixel` (`row·W + col`).
    pub fn sample_at(&self, pixel: usize) -> PriorSample {
        let n = self.pixel_count();
        let mut mean = [[0.0; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS];
        let mut spread = [[0.0; NUM_ALBEDO_PARAMETERS]; NUM_BBDR_WAVE_BANDS];
        for (b, j) in iproduct!(0..NUM_BBDR_WAVE_BANDS, 0..NUM_ALBEDO_PARAMETERS) {
            let plane = band_parameter_index(b, j, NUM_ALBEDO_PARAMETERS);
            mean[b][j] = self.mean[plane * n + pixel] as f64;
            spread[b][j] = self.spread[plane * n + pixel] as f64;
        }
        PriorSample {
            mean,
            spread,
            n_samples: self.n_samples[pixel] as f64,
            snow_fraction: self.snow_fraction[pixel] as f64,
            land_water_type: self.land_water_type[pixel] as i32,
        }
    }
}

#[cfg(test)]
mod test_prior {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regular_prior() {
        let params = PriorParams {
            scale_factor: 2.0,
            ..PriorParams::default()
        };
        let record = PriorRecord::from_sample(&PriorSample::uniform(0.25, 0.1), &params);

        assert!(record.is_usable());
        assert_eq!(record.validity, PriorValidity::Valid);
        // C[i][i] = (0.1 · 2)² = 0.04
        assert_relative_eq!(record.precision[(3, 3)], 25.0, epsilon = 1e-9);
        assert_relative_eq!(record.precision[(0, 1)], 0.0);
        assert_relative_eq!(record.weighted_mean[3], 6.25, epsilon = 1e-9);
        assert_eq!(record.n_samples, 1.0);
    }

    #[test]
    fn test_scaled_spread_is_clamped() {
        let record =
            PriorRecord::from_sample(&PriorSample::uniform(0.5, 0.2), &PriorParams::default());
        // 0.2 · 30 clamps to 1
        assert_eq!(record.precision, ParamMatrix::identity());
        assert_relative_eq!(record.weighted_mean[0], 0.5);
    }

    #[test]
    fn test_zero_spread_is_forced_valid() {
        let record =
            PriorRecord::from_sample(&PriorSample::uniform(0.5, 0.0), &PriorParams::default());

        assert!(record.is_usable());
        assert_eq!(record.n_samples, PRIOR_NEAR_ZERO_SAMPLES);
        assert_eq!(record.precision[(0, 0)], 1.0);
        assert!(record.precision.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_variance_convention() {
        let params = PriorParams {
            scale_factor: 1.0,
            uncertainty: PriorUncertainty::Variance,
            ..PriorParams::default()
        };
        let record = PriorRecord::from_sample(&PriorSample::uniform(0.5, 0.04), &params);
        // sd = 0.2, C = 0.04
        assert_relative_eq!(record.precision[(8, 8)], 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_acceptance_modes() {
        let sample = PriorSample::uniform(1.5, 0.01);
        let strict = PriorRecord::from_sample(&sample, &PriorParams::default());
        assert!(!strict.is_usable());
        assert_eq!(strict.validity, PriorValidity::MeanAboveOne);
        assert_eq!(strict.precision, ParamMatrix::zeros());

        let relaxed = PriorRecord::from_sample(
            &sample,
            &PriorParams {
                acceptance: PriorAcceptance::Relaxed,
                ..PriorParams::default()
            },
        );
        assert!(relaxed.is_usable());
        assert_eq!(relaxed.validity, PriorValidity::MeanAboveOne);
    }

    #[test]
    fn test_singular_covariance_fallback() {
        // an underflowing spread leaves C singular
        let params = PriorParams {
            scale_factor: 1.0,
            ..PriorParams::default()
        };
        let record = PriorRecord::from_sample(&PriorSample::uniform(0.5, 1e-200), &params);
        assert!(record.is_usable());
        assert_eq!(record.precision, ParamMatrix::identity());

        let record = PriorRecord::from_sample(&PriorSample::uniform(0.5, -1e-200), &params);
        assert_eq!(record.validity, PriorValidity::DegenerateSpread);
        assert!(!record.is_usable());

        // a subnormal variance inverts to an infinite precision
        let record = PriorRecord::from_sample(&PriorSample::uniform(0.5, 1e-160), &params);
        assert!(record.is_usable());
        assert_eq!(record.precision, ParamMatrix::identity());
        assert!(record.weighted_mean.iter().all(|x| x.is_finite()));

        let sample = PriorSample::uniform(0.5, f64::NAN);
        let record = PriorRecord::from_sample(&sample, &params);
        // a non-finite spread is read as zero, hence forced valid
        assert!(record.is_usable());
        assert_eq!(record.n_samples, PRIOR_NEAR_ZERO_SAMPLES);
    }

    #[test]
    fn test_tile_sampling() {
        let (w, h) = (2, 2);
        let n = w * h;
        let mean: Vec<f32> = (0..NUM_PARAMETERS * n).map(|i| i as f32).collect();
        let tile = PriorTile::new(
            w,
            h,
            mean,
            vec![0.1; NUM_PARAMETERS * n],
            vec![3.0; n],
            vec![0.2; n],
            vec![1.0, 0.0, 1.0, 1.0],
        )
        .unwrap();

        let sample = tile.sample_at(1);
        assert_eq!(sample.mean[0][0], 1.0);
        assert_eq!(sample.mean[1][2], (5 * n + 1) as f64);
        assert_eq!(sample.land_water_type, 0);
        assert_eq!(sample.n_samples, 3.0);

        let filled = PriorTile::filled(w, h, &PriorSample::uniform(0.5, 0.25));
        assert_eq!(filled.sample_at(3), PriorSample::uniform(0.5, 0.25));

        assert!(matches!(
            PriorTile::new(w, h, vec![], vec![], vec![], vec![], vec![]),
            Err(AlbedoError::DimensionMismatch(_))
        ));
    }
}
