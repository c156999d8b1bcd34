//! # Accumulator data model
//!
//! Per-pixel normal-equation accumulators and their on-disk representation.
//!
//! For every pixel, the BRDF kernel observations of a day are condensed into the terms of
//! the normal equations of a weighted least-squares fit of the `P = 9` kernel parameters:
//!
//! * `M`, a symmetric `P×P` matrix,
//! * `V`, a `P` vector,
//! * `E`, a scalar residual energy,
//! * `mask`, the (weighted) number of contributing observations.
//!
//! These `P² + P + 2 = 92` values are stored as separate raster planes.
//!
//! ## Modules
//!
//! - [`record`] – One pixel of accumulator bands lifted into `nalgebra` types.
//! - [`daily`] – One day of contributions over a raster.
//! - [`full`] – A temporally weighted composite with its closest-sample plane.
//! - [`codec`] – Raw float32 file encoding.
//! - [`naming`] – File naming conventions and the embedded (year, day-of-year).

pub mod codec;
pub mod daily;
pub mod full;
pub mod naming;
pub mod record;

pub use codec::ByteOrder;
pub use daily::DailyAccumulator;
pub use full::FullAccumulator;
pub use naming::SampleDate;
pub use record::AccumulatorRecord;
