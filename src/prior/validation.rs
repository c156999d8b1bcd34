use crate::constants::{
    ParamVector, NO_DATA_VALUE, NUM_PARAMETERS, PRIOR_SNOW_FRACTION_MAX, PRIOR_SNOW_FRACTION_MIN,
};

use super::PriorAcceptance;

/// Outcome of the validity checks of one prior pixel.
///
/// Each rejection reason carries its own numeric code (see [`PriorValidity::code`]) so that
/// rejected pixels can be told apart in diagnostic rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorValidity {
    Valid,
    /// Non-land pixel or a zero mean
    NoData,
    /// Snow fraction incompatible with the snow mode
    SnowFraction,
    /// A negative mean
    MeanNotPositive,
    /// A mean above one; accepted in relaxed mode
    MeanAboveOne,
    /// Singular covariance that could not be replaced by the identity
    DegenerateSpread,
}

impl PriorValidity {
    pub fn code(&self) -> f64 {
        match self {
            PriorValidity::Valid => 0.0,
            PriorValidity::NoData => NO_DATA_VALUE,
            PriorValidity::SnowFraction => -2.0,
            PriorValidity::MeanNotPositive => -1.0,
            PriorValidity::MeanAboveOne => 1.0,
            PriorValidity::DegenerateSpread => -3.0,
        }
    }

    pub fn is_accepted(&self, acceptance: PriorAcceptance) -> bool {
        match self {
            PriorValidity::Valid => true,
            PriorValidity::MeanAboveOne => acceptance == PriorAcceptance::Relaxed,
            _ => false,
        }
    }
}

fn snow_fraction_rejected(compute_snow: bool, snow_fraction: f64) -> bool {
    if compute_snow {
        snow_fraction <= PRIOR_SNOW_FRACTION_MIN
    } else {
        snow_fraction >= PRIOR_SNOW_FRACTION_MAX
    }
}

/// Check a prior pixel, entry by entry.
///
/// The entries are scanned in parameter order. A non-land pixel or a zero mean marks the
/// pixel as no-data but the scan goes on; the first entry failing the snow-fraction gate
/// or the `(0, 1]` range of the mean stops the scan with that reason.
///
/// Arguments
/// -----------------
/// * `mean`: Prior mean of the `P` parameters.
/// * `snow_fraction`: Fraction of snow in the prior sample.
/// * `land_water_type`: Land/water classification, land is positive.
/// * `compute_snow`: Whether the snow or the no-snow prior is being validated.
pub fn validate_prior_pixel(
    mean: &ParamVector,
    snow_fraction: f64,
    land_water_type: i32,
    compute_snow: bool,
) -> PriorValidity {
    let snow_rejected = snow_fraction_rejected(compute_snow, snow_fraction);
    let mut validity = PriorValidity::Valid;
    for &m in mean.iter().take(NUM_PARAMETERS) {
        if land_water_type <= 0 || m == 0.0 {
            validity = PriorValidity::NoData;
        } else if snow_rejected {
            return PriorValidity::SnowFraction;
        } else if m <= 0.0 {
            return PriorValidity::MeanNotPositive;
        } else if m > 1.0 {
            return PriorValidity::MeanAboveOne;
        }
    }
    validity
}
