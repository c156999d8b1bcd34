//! # Processing configuration
//!
//! [`ProcessingConfig`] gathers every knob of an accumulation + inversion run so that a
//! batch can be described by a single JSON document:
//!
//! ```json
//! {
//!   "year": 2005,
//!   "start_doy": 1,
//!   "end_doy": 361,
//!   "step": 8,
//!   "wings": 180,
//!   "tile_scale_factor": 1.0,
//!   "byte_order": "little_endian",
//!   "use_prior": true,
//!   "prior_scale_factor": 30.0,
//!   "compute_snow": false,
//!   "prior_acceptance": "strict",
//!   "prior_uncertainty": "standard_deviation"
//! }
//! ```
//!
//! Every field is optional and falls back to its default. The derived
//! [`AccumulationParams`] and [`InversionParams`] go through their builders, so the same
//! validation rules apply whichever way the parameters are provided.

use camino::Utf8Path;
use serde::Deserialize;

use crate::{
    accumulation::{window::target_dates, AccumulationParams},
    accumulator::{ByteOrder, SampleDate},
    albedo_errors::AlbedoError,
    constants::{
        DayOfYear, Year, COMPOSITE_PERIOD_DAYS, DEFAULT_PRIOR_SCALE_FACTOR, DEFAULT_WINGS,
    },
    inversion::InversionParams,
    prior::{PriorAcceptance, PriorUncertainty},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    pub year: Year,
    pub start_doy: DayOfYear,
    pub end_doy: DayOfYear,
    pub step: u32,
    pub wings: u32,
    pub tile_scale_factor: f64,
    pub byte_order: ByteOrder,
    pub targets_per_pass: usize,
    pub use_prior: bool,
    pub prior_scale_factor: f64,
    pub compute_snow: bool,
    pub prior_acceptance: PriorAcceptance,
    pub prior_uncertainty: PriorUncertainty,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        ProcessingConfig {
            year: 2005,
            start_doy: 1,
            end_doy: 361,
            step: COMPOSITE_PERIOD_DAYS,
            wings: DEFAULT_WINGS,
            tile_scale_factor: 1.0,
            byte_order: ByteOrder::LittleEndian,
            targets_per_pass: 1,
            use_prior: true,
            prior_scale_factor: DEFAULT_PRIOR_SCALE_FACTOR,
            compute_snow: false,
            prior_acceptance: PriorAcceptance::Strict,
            prior_uncertainty: PriorUncertainty::StandardDeviation,
        }
    }
}

impl ProcessingConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AlbedoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Utf8Path) -> Result<Self, AlbedoError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn accumulation_params(&self) -> Result<AccumulationParams, AlbedoError> {
        AccumulationParams::builder()
            .wings(self.wings)
            .tile_scale_factor(self.tile_scale_factor)
            .byte_order(self.byte_order)
            .targets_per_pass(self.targets_per_pass)
            .build()
    }

    pub fn inversion_params(&self) -> Result<InversionParams, AlbedoError> {
        InversionParams::builder()
            .use_prior(self.use_prior)
            .prior_scale_factor(self.prior_scale_factor)
            .compute_snow(self.compute_snow)
            .prior_acceptance(self.prior_acceptance)
            .prior_uncertainty(self.prior_uncertainty)
            .build()
    }

    /// Composite dates `start_doy, start_doy + step, …, ≤ end_doy` of `year`.
    pub fn target_dates(&self) -> Result<Vec<SampleDate>, AlbedoError> {
        target_dates(self.year, self.start_doy, self.end_doy, self.step)
    }
}
