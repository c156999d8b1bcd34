//! # Per-pixel regularized inversion
//!
//! Solve, for every pixel, the normal equations `M·p = V` accumulated over a compositing
//! window, optionally regularized by a prior, and report the BRDF kernel parameters `p`,
//! their covariance `M⁻¹`, the entropy of the posterior and a goodness of fit.
//!
//! ## Decision per pixel
//!
//! | accumulator        | prior (if used)  | result                                         |
//! |--------------------|------------------|------------------------------------------------|
//! | mask > 0           | usable or unused | full inversion ([`InversionOutcome::Solved`])  |
//! | absent or mask ≤ 0 | usable           | prior only ([`InversionOutcome::PriorOnly`])   |
//! | anything else      |                  | no data ([`InversionOutcome::NoData`])         |
//!
//! A full inversion adds the prior precision to `M` and the precision-weighted prior mean
//! to `V`, inverts `M` through an LU decomposition and solves for `p`. When `M` is singular
//! or its inverse is degenerate (non-finite, or with a zero on the diagonal), the pixel is
//! [`InversionOutcome::Unsolved`]: every estimate is no-data and the mask drops to zero.
//!
//! ## Goodness of fit
//!
//! With the (prior-augmented) `M`, `V`, `E` and the solution `p`:
//!
//! ```text
//! gof = pᵀ·M·p + pᵀ·V − 2·E
//! ```
//!
//! The three terms are reported separately in [`PixelInversion::goodness_of_fit_terms`].
//!
//! ## Modules
//!
//! - [`entropy`] – Entropy of a Gaussian from its precision matrix.
//! - [`tile`] – Parallel inversion of a whole tile and output plane layout.

pub mod entropy;
pub mod tile;

use std::cmp::Ordering::Greater;

use crate::{
    accumulator::AccumulatorRecord,
    albedo_errors::AlbedoError,
    constants::{
        upper_triangle_index, ParamMatrix, ParamVector, NO_DATA_VALUE, NUM_PARAMETERS,
        NUM_UNCERTAINTY_BANDS,
    },
    prior::{
        validation::PriorValidity, PriorAcceptance, PriorParams, PriorRecord, PriorUncertainty,
    },
};

use self::entropy::entropy;

/// Which branch produced a [`PixelInversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InversionOutcome {
    /// Observations (and prior, if used) were inverted
    Solved,
    /// Observations were present but the system could not be inverted
    Unsolved,
    /// No observation, the prior alone provides the estimate
    PriorOnly,
    /// Neither observations nor a usable prior
    NoData,
}

/// Inversion result of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelInversion {
    pub parameters: ParamVector,
    pub covariance: ParamMatrix,
    pub entropy: f64,
    pub relative_entropy: f64,
    /// Weighted number of samples; also the output mask
    pub weighted_number_of_samples: f64,
    pub goodness_of_fit: f64,
    /// `[pᵀ·M·p, pᵀ·V, E]`
    pub goodness_of_fit_terms: [f64; 3],
    pub days_to_closest_sample: f64,
    /// Validity of the prior pixel, `None` when no prior is used
    pub prior_validity: Option<PriorValidity>,
    pub outcome: InversionOutcome,
}

impl PixelInversion {
    /// Every output at the no-data value and a zero mask.
    pub fn no_data() -> Self {
        PixelInversion {
            parameters: ParamVector::from_element(NO_DATA_VALUE),
            covariance: ParamMatrix::from_element(NO_DATA_VALUE),
            entropy: NO_DATA_VALUE,
            relative_entropy: NO_DATA_VALUE,
            weighted_number_of_samples: 0.0,
            goodness_of_fit: NO_DATA_VALUE,
            goodness_of_fit_terms: [NO_DATA_VALUE; 3],
            days_to_closest_sample: NO_DATA_VALUE,
            prior_validity: None,
            outcome: InversionOutcome::NoData,
        }
    }

    pub fn mask(&self) -> f64 {
        self.weighted_number_of_samples
    }

    /// Upper triangle of the covariance, row-major, `i ≤ j`.
    pub fn covariance_upper_triangle(&self) -> [f64; NUM_UNCERTAINTY_BANDS] {
        let mut values = [0.0; NUM_UNCERTAINTY_BANDS];
        for i in 0..NUM_PARAMETERS {
            for j in i..NUM_PARAMETERS {
                values[upper_triangle_index(i, j)] = self.covariance[(i, j)];
            }
        }
        values
    }
}

/// Parameters of the inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InversionParams {
    pub use_prior: bool,
    pub prior: PriorParams,
}

impl InversionParams {
    pub fn builder() -> InversionParamsBuilder {
        InversionParamsBuilder::new()
    }
}

impl Default for InversionParams {
    fn default() -> Self {
        InversionParams {
            use_prior: true,
            prior: PriorParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InversionParamsBuilder {
    params: InversionParams,
}

impl Default for InversionParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl InversionParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: InversionParams::default(),
        }
    }

    pub fn use_prior(mut self, v: bool) -> Self {
        self.params.use_prior = v;
        self
    }

    pub fn prior_scale_factor(mut self, v: f64) -> Self {
        self.params.prior.scale_factor = v;
        self
    }

    pub fn compute_snow(mut self, v: bool) -> Self {
        self.params.prior.compute_snow = v;
        self
    }

    pub fn prior_acceptance(mut self, v: PriorAcceptance) -> Self {
        self.params.prior.acceptance = v;
        self
    }

    pub fn prior_uncertainty(mut self, v: PriorUncertainty) -> Self {
        self.params.prior.uncertainty = v;
        self
    }

    /// Validate and produce the parameters; the prior scale factor must be finite and
    /// strictly positive (default
    /// [`DEFAULT_PRIOR_SCALE_FACTOR`](crate::constants::DEFAULT_PRIOR_SCALE_FACTOR)).
    pub fn build(self) -> Result<InversionParams, AlbedoError> {
        let scale = self.params.prior.scale_factor;
        if scale.partial_cmp(&0.0) != Some(Greater) || !scale.is_finite() {
            return Err(AlbedoError::InvalidParameter(format!(
                "prior scale factor must be finite and positive, got {scale}"
            )));
        }
        Ok(self.params)
    }
}

fn is_usable_inverse(inverse: &ParamMatrix) -> bool {
    inverse.iter().all(|x| x.is_finite()) && inverse.diagonal().iter().all(|&d| d != 0.0)
}

/// Invert one pixel.
///
/// Arguments
/// -----------------
/// * `accumulator`: Normal-equation terms of the pixel and its days to the closest
///   sample, `None` when no full accumulator is available.
/// * `prior`: Prior terms of the pixel, `None` when no prior is used.
///
/// Return
/// ----------
/// * The [`PixelInversion`] of the pixel; see the module documentation for the branch
///   taken in each situation.
pub fn invert_pixel(
    accumulator: Option<(&AccumulatorRecord, f64)>,
    prior: Option<&PriorRecord>,
) -> PixelInversion {
    let prior_ok = prior.map_or(true, PriorRecord::is_usable);

    let result = match accumulator {
        Some((record, days)) if record.has_samples() && prior_ok => {
            invert_observations(record, days, prior.filter(|p| p.is_usable()))
        }
        _ => match prior {
            Some(p) if p.is_usable() => prior_only(p),
            _ => PixelInversion::no_data(),
        },
    };
    PixelInversion {
        prior_validity: prior.map(|p| p.validity),
        ..result
    }
}

fn invert_observations(
    record: &AccumulatorRecord,
    days: f64,
    prior: Option<&PriorRecord>,
) -> PixelInversion {
    let mut m = record.m;
    let mut v = record.v;
    if let Some(p) = prior {
        m += p.precision;
        v += p.weighted_mean;
    }

    let lu = m.lu();
    let solved = lu
        .try_inverse()
        .filter(is_usable_inverse)
        .and_then(|inverse| lu.solve(&v).map(|parameters| (inverse, parameters)))
        .filter(|(_, parameters)| parameters.iter().all(|x| x.is_finite()));

    let Some((covariance, parameters)) = solved else {
        return PixelInversion {
            weighted_number_of_samples: 0.0,
            goodness_of_fit: 0.0,
            goodness_of_fit_terms: [0.0; 3],
            days_to_closest_sample: days,
            outcome: InversionOutcome::Unsolved,
            ..PixelInversion::no_data()
        };
    };

    let posterior_entropy = entropy(&m);
    let relative_entropy = match (prior, posterior_entropy) {
        (Some(p), Some(h)) => entropy(&p.precision).map_or(NO_DATA_VALUE, |hp| hp - h),
        _ => NO_DATA_VALUE,
    };

    let quadratic = parameters.dot(&(m * parameters));
    let linear = parameters.dot(&v);
    PixelInversion {
        parameters,
        covariance,
        entropy: posterior_entropy.unwrap_or(NO_DATA_VALUE),
        relative_entropy,
        weighted_number_of_samples: record.mask,
        goodness_of_fit: quadratic + linear - 2.0 * record.e,
        goodness_of_fit_terms: [quadratic, linear, record.e],
        days_to_closest_sample: days,
        prior_validity: None,
        outcome: InversionOutcome::Solved,
    }
}

fn prior_only(prior: &PriorRecord) -> PixelInversion {
    let covariance = prior
        .precision
        .lu()
        .try_inverse()
        .unwrap_or_else(|| ParamMatrix::from_element(NO_DATA_VALUE));
    PixelInversion {
        parameters: prior.mean,
        covariance,
        entropy: entropy(&prior.precision).unwrap_or(NO_DATA_VALUE),
        relative_entropy: 0.0,
        weighted_number_of_samples: 0.0,
        goodness_of_fit: 0.0,
        goodness_of_fit_terms: [0.0; 3],
        days_to_closest_sample: 0.0,
        prior_validity: None,
        outcome: InversionOutcome::PriorOnly,
    }
}
