//! Tile-level inversion.
//!
//! Every pixel of a tile is inverted independently with [`invert_pixel`]; the pixel loop
//! runs on the `rayon` thread pool and each task owns its fixed-size scratch matrices.
//!
//! Results are exposed as output planes in a fixed order:
//!
//! | planes          | content                                                       |
//! |-----------------|---------------------------------------------------------------|
//! | `0..9`          | parameters, `band·3 + parameter`                              |
//! | `9..54`         | covariance upper triangle, row-major (`i ≤ j`)                |
//! | `54`            | entropy                                                       |
//! | `55`            | relative entropy                                              |
//! | `56`            | weighted number of samples (mask)                             |
//! | `57`            | goodness of fit                                               |
//! | `58`            | days to the closest sample                                    |

use log::{debug, info};
use rayon::prelude::*;

use crate::{
    accumulator::FullAccumulator,
    albedo_errors::AlbedoError,
    constants::{
        BBDR_WAVE_BANDS, NO_DATA_VALUE, NUM_ALBEDO_PARAMETERS, NUM_PARAMETERS,
        NUM_UNCERTAINTY_BANDS,
    },
    prior::{PriorRecord, PriorTile},
};

use super::{invert_pixel, InversionOutcome, InversionParams, PixelInversion};

/// Plane index of the first covariance entry
pub const UNCERTAINTY_PLANE_OFFSET: usize = NUM_PARAMETERS;
pub const ENTROPY_PLANE_INDEX: usize = UNCERTAINTY_PLANE_OFFSET + NUM_UNCERTAINTY_BANDS;
pub const RELATIVE_ENTROPY_PLANE_INDEX: usize = ENTROPY_PLANE_INDEX + 1;
pub const WEIGHTED_SAMPLES_PLANE_INDEX: usize = ENTROPY_PLANE_INDEX + 2;
pub const GOODNESS_OF_FIT_PLANE_INDEX: usize = ENTROPY_PLANE_INDEX + 3;
pub const DAYS_TO_CLOSEST_SAMPLE_PLANE_INDEX: usize = ENTROPY_PLANE_INDEX + 4;
/// Validity code of the prior pixel, no-data when no prior is used
pub const PRIOR_VALIDITY_PLANE_INDEX: usize = ENTROPY_PLANE_INDEX + 5;
pub const NUM_OUTPUT_PLANES: usize = PRIOR_VALIDITY_PLANE_INDEX + 1;

const KERNEL_NAMES: [&str; NUM_ALBEDO_PARAMETERS] = ["f0", "f1", "f2"];

/// Names of the output planes, in plane order.
pub fn output_plane_names() -> Vec<String> {
    let mut names = Vec::with_capacity(NUM_OUTPUT_PLANES);
    for band in BBDR_WAVE_BANDS {
        for kernel in KERNEL_NAMES {
            names.push(format!("mean_{band}_{kernel}"));
        }
    }
    let parameter_name = |i: usize| {
        format!(
            "{}_{}",
            BBDR_WAVE_BANDS[i / NUM_ALBEDO_PARAMETERS],
            KERNEL_NAMES[i % NUM_ALBEDO_PARAMETERS]
        )
    };
    for i in 0..NUM_PARAMETERS {
        for j in i..NUM_PARAMETERS {
            names.push(format!("VAR_{}_{}", parameter_name(i), parameter_name(j)));
        }
    }
    names.extend(
        [
            "Entropy",
            "Relative_Entropy",
            "Weighted_Number_of_Samples",
            "Goodness_of_Fit",
            "Days_to_the_Closest_Sample",
            "Prior_Valid_Pixel_Flag",
        ]
        .map(String::from),
    );
    names
}

/// Inversion results of a whole tile.
#[derive(Debug, Clone, PartialEq)]
pub struct InversionTile {
    width: usize,
    height: usize,
    pixels: Vec<PixelInversion>,
}

impl InversionTile {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[PixelInversion] {
        &self.pixels
    }

    pub fn pixel(&self, row: usize, col: usize) -> &PixelInversion {
        &self.pixels[row * self.width + col]
    }

    /// Number of pixels per [`InversionOutcome`], in the order
    /// `[Solved, Unsolved, PriorOnly, NoData]`.
    pub fn outcome_counts(&self) -> [usize; 4] {
        let mut counts = [0; 4];
        for p in &self.pixels {
            let slot = match p.outcome {
                InversionOutcome::Solved => 0,
                InversionOutcome::Unsolved => 1,
                InversionOutcome::PriorOnly => 2,
                InversionOutcome::NoData => 3,
            };
            counts[slot] += 1;
        }
        counts
    }

    /// Output values of one pixel, in plane order.
    pub fn pixel_values(pixel: &PixelInversion) -> [f64; NUM_OUTPUT_PLANES] {
        let mut values = [0.0; NUM_OUTPUT_PLANES];
        values[..NUM_PARAMETERS].copy_from_slice(pixel.parameters.as_slice());
        values[UNCERTAINTY_PLANE_OFFSET..ENTROPY_PLANE_INDEX]
            .copy_from_slice(&pixel.covariance_upper_triangle());
        values[ENTROPY_PLANE_INDEX] = pixel.entropy;
        values[RELATIVE_ENTROPY_PLANE_INDEX] = pixel.relative_entropy;
        values[WEIGHTED_SAMPLES_PLANE_INDEX] = pixel.weighted_number_of_samples;
        values[GOODNESS_OF_FIT_PLANE_INDEX] = pixel.goodness_of_fit;
        values[DAYS_TO_CLOSEST_SAMPLE_PLANE_INDEX] = pixel.days_to_closest_sample;
        values[PRIOR_VALIDITY_PLANE_INDEX] = pixel
            .prior_validity
            .map_or(NO_DATA_VALUE, |validity| validity.code());
        values
    }

    /// All output planes, band-major, as `f32`.
    pub fn output_planes(&self) -> Vec<Vec<f32>> {
        let n = self.pixels.len();
        let mut planes = vec![vec![0.0_f32; n]; NUM_OUTPUT_PLANES];
        for (p, pixel) in self.pixels.iter().enumerate() {
            for (plane, value) in planes.iter_mut().zip(Self::pixel_values(pixel)) {
                plane[p] = value as f32;
            }
        }
        planes
    }
}

fn check_dimensions(
    what: &str,
    (width, height): (usize, usize),
    expected: (usize, usize),
) -> Result<(), AlbedoError> {
    if (width, height) != expected {
        return Err(AlbedoError::DimensionMismatch(format!(
            "{what} is {width}x{height}, expected {}x{}",
            expected.0, expected.1
        )));
    }
    Ok(())
}

/// Invert every pixel of a tile.
///
/// Arguments
/// -----------------
/// * `accumulator`: Full accumulator of the target day, `None` if no observation exists.
/// * `prior`: Prior rasters of the tile; required when `params.use_prior` is set and
///   ignored otherwise.
/// * `params`: Prior usage and construction parameters.
/// * `(width, height)`: Dimensions of the tile.
///
/// Return
/// ----------
/// * The per-pixel results, or an error if the prior is required but missing, or if the
///   rasters do not match the tile dimensions.
pub fn invert_tile(
    accumulator: Option<&FullAccumulator>,
    prior: Option<&PriorTile>,
    params: &InversionParams,
    (width, height): (usize, usize),
) -> Result<InversionTile, AlbedoError> {
    let prior = match (params.use_prior, prior) {
        (true, None) => {
            return Err(AlbedoError::InvalidParameter(
                "prior usage is enabled but no prior was provided".into(),
            ))
        }
        (true, Some(p)) => Some(p),
        (false, _) => None,
    };

    if let Some(acc) = accumulator {
        check_dimensions("full accumulator", (acc.width(), acc.height()), (width, height))?;
    }
    if let Some(p) = prior {
        check_dimensions("prior", (p.width(), p.height()), (width, height))?;
    }

    let pixels: Vec<PixelInversion> = (0..width * height)
        .into_par_iter()
        .map(|pixel| {
            let record = accumulator.map(|acc| {
                (
                    acc.record_at(pixel),
                    acc.days_to_closest_sample_at(pixel) as f64,
                )
            });
            let prior_record =
                prior.map(|p| PriorRecord::from_sample(&p.sample_at(pixel), &params.prior));
            invert_pixel(
                record.as_ref().map(|(r, days)| (r, *days)),
                prior_record.as_ref(),
            )
        })
        .collect();

    let tile = InversionTile {
        width,
        height,
        pixels,
    };
    let [solved, unsolved, prior_only, no_data] = tile.outcome_counts();
    info!(
        "Inverted {width}x{height} tile: {solved} solved, {unsolved} singular, \
         {prior_only} prior only, {no_data} without data"
    );
    if accumulator.is_none() {
        debug!("No full accumulator provided, observations ignored");
    }
    Ok(tile)
}
