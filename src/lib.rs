//! # albedo-inversion
//!
//! Temporal accumulation of daily BRDF normal-equation accumulators and per-pixel
//! regularized inversion of the BRDF kernel parameters.
//!
//! The processing chain has two stages:
//!
//! 1. [`accumulation`]: daily accumulators within `±wings` days of a target day are
//!    summed with a temporal weight into a [`FullAccumulator`], together with the distance
//!    to the closest observation.
//! 2. [`inversion`]: for every pixel, the accumulated normal equations, optionally
//!    regularized by a [`prior`], are solved for the 9 kernel parameters, their
//!    covariance, entropy and goodness of fit.
//!
//! ```rust, no_run
//! use albedo_inversion::{
//!     accumulation::{accumulate_directory, weight::ExponentialDecay},
//!     config::ProcessingConfig,
//! };
//! use camino::Utf8Path;
//!
//! # fn main() -> Result<(), albedo_inversion::albedo_errors::AlbedoError> {
//! let config = ProcessingConfig::from_json_file(Utf8Path::new("config.json"))?;
//! let written = accumulate_directory(
//!     Utf8Path::new("daily"),
//!     Utf8Path::new("full"),
//!     &config.target_dates()?,
//!     &config.accumulation_params()?,
//!     &ExponentialDecay::default(),
//! )?;
//! println!("{} full accumulators written", written.len());
//! # Ok(())
//! # }
//! ```

pub mod accumulation;
pub mod accumulator;
pub mod albedo_errors;
pub mod config;
pub mod constants;
pub mod inversion;
pub mod prior;

pub use accumulation::{accumulate, AccumulationParams, DailyAccumulatorFile};
pub use accumulator::{AccumulatorRecord, ByteOrder, DailyAccumulator, FullAccumulator, SampleDate};
pub use albedo_errors::AlbedoError;
pub use inversion::{invert_pixel, tile::invert_tile, InversionParams, PixelInversion};
pub use prior::{PriorRecord, PriorSample, PriorTile};
