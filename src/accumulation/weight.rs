use crate::constants::WEIGHT_HALF_LIFE_DAYS;

/// Temporal weighting of a daily contribution, as a function of its signed day
/// difference to the target day.
///
/// Implementations must return a finite, non-negative weight. The engine calls the
/// weighting from several threads, hence the `Sync` bound.
///
/// Any `Fn(i32) -> f32 + Sync` closure is a weighting:
///
/// ```
/// use albedo_inversion::accumulation::weight::DayWeighting;
///
/// let uniform = |_d: i32| 1.0_f32;
/// assert_eq!(uniform.weight(42), 1.0);
/// ```
pub trait DayWeighting: Sync {
    fn weight(&self, day_difference: i32) -> f32;
}

/// `w(d) = exp(-|d| / τ)`, symmetric and monotonically non-increasing in `|d|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    half_life_days: f64,
}

impl ExponentialDecay {
    pub fn new(half_life_days: f64) -> Self {
        ExponentialDecay { half_life_days }
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }
}

impl Default for ExponentialDecay {
    fn default() -> Self {
        ExponentialDecay::new(WEIGHT_HALF_LIFE_DAYS)
    }
}

impl DayWeighting for ExponentialDecay {
    #[inline]
    fn weight(&self, day_difference: i32) -> f32 {
        (-(day_difference.unsigned_abs() as f64) / self.half_life_days).exp() as f32
    }
}

impl<F> DayWeighting for F
where
    F: Fn(i32) -> f32 + Sync,
{
    #[inline]
    fn weight(&self, day_difference: i32) -> f32 {
        self(day_difference)
    }
}
