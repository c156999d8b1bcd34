//! # Temporal accumulation
//!
//! Build one [`FullAccumulator`] per target day by summing, with a temporal weight, every
//! daily accumulator whose date falls inside the window `[target - wings, target + wings]`.
//!
//! For each target day `t` and each contributing daily file at signed day difference `d`:
//!
//! ```text
//! full[band][row][col] += w(d) · daily[band][row][col]     for every one of the 92 bands
//! ```
//!
//! and the days-to-closest-sample plane is updated with the sequential fold described in
//! [`closest_sample`].
//!
//! ## Execution model
//!
//! Daily files are visited once, sorted by `(year, doy, path)`. Each file is decoded
//! entirely (its size is checked first) and then folded into every target composite whose
//! window contains it; the composites of one file are updated in parallel with `rayon`.
//! Within one composite the fold order is the file order, so the closest-sample plane and
//! the floating-point sums are reproducible.
//!
//! A file that cannot be read (missing, wrong size) is logged and skipped without
//! contributing anything. A target without any contributing file yields an all-zero
//! accumulator, which downstream inversion treats as "no observation".
//!
//! ## Modules
//!
//! - [`weight`] – Temporal weighting functions.
//! - [`window`] – Window membership and target-day schedules.
//! - [`closest_sample`] – Days-to-closest-sample fold.
//! - [`progress_bar`] – Per-file progress reporting (`progress` feature).
//!
//! See also
//! ------------
//! * [`crate::accumulator::codec`] – Binary format of daily and full accumulators.
//! * [`crate::inversion`] – Consumes the full accumulators produced here.

pub mod closest_sample;
pub mod progress_bar;
pub mod weight;
pub mod window;

use std::cmp::Ordering::{Equal, Greater};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::{
    accumulator::{
        codec::{read_daily_accumulator, write_full_accumulator},
        daily::DailyAccumulator,
        naming::{full_accumulator_file_name, parse_daily_accumulator_file_name},
        ByteOrder, FullAccumulator, SampleDate,
    },
    albedo_errors::AlbedoError,
    constants::{DEFAULT_WINGS, MODIS_TILE_HEIGHT, MODIS_TILE_WIDTH, TILE_SCALE_FACTORS},
};

use self::{
    closest_sample::fold_closest_sample, progress_bar::FileProgress, weight::DayWeighting,
    window::AccumulationWindow,
};

/// Raster dimensions of a tile downscaled by `scale_factor` from the native 1200×1200.
///
/// Return
/// ----------
/// * `(width, height)`, or `AlbedoError::InvalidTileScaleFactor` if the factor is not
///   one of [`TILE_SCALE_FACTORS`].
pub fn tile_dimensions(scale_factor: f64) -> Result<(usize, usize), AlbedoError> {
    if !TILE_SCALE_FACTORS.contains(&scale_factor) {
        return Err(AlbedoError::InvalidTileScaleFactor(scale_factor));
    }
    let width = (MODIS_TILE_WIDTH as f64 / scale_factor).round() as usize;
    let height = (MODIS_TILE_HEIGHT as f64 / scale_factor).round() as usize;
    Ok((width, height))
}

/// Parameters of the temporal accumulation.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulationParams {
    /// Half width of the window, in days
    pub wings: u32,
    pub width: usize,
    pub height: usize,
    pub byte_order: ByteOrder,
    /// Number of composites held in memory at once by [`accumulate_directory`]
    pub targets_per_pass: usize,
}

impl AccumulationParams {
    pub fn builder() -> AccumulationParamsBuilder {
        AccumulationParamsBuilder::new()
    }
}

impl Default for AccumulationParams {
    fn default() -> Self {
        AccumulationParams {
            wings: DEFAULT_WINGS,
            width: MODIS_TILE_WIDTH,
            height: MODIS_TILE_HEIGHT,
            byte_order: ByteOrder::LittleEndian,
            targets_per_pass: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccumulationParamsBuilder {
    params: AccumulationParams,
    scale_factor: Option<f64>,
}

impl Default for AccumulationParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulationParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: AccumulationParams::default(),
            scale_factor: None,
        }
    }

    pub fn wings(mut self, v: u32) -> Self {
        self.params.wings = v;
        self
    }

    /// Explicit raster dimensions. Overridden by [`Self::tile_scale_factor`].
    pub fn raster_size(mut self, width: usize, height: usize) -> Self {
        self.params.width = width;
        self.params.height = height;
        self
    }

    /// Derive the raster dimensions from a tile scale factor (validated in [`Self::build`]).
    pub fn tile_scale_factor(mut self, v: f64) -> Self {
        self.scale_factor = Some(v);
        self
    }

    pub fn byte_order(mut self, v: ByteOrder) -> Self {
        self.params.byte_order = v;
        self
    }

    pub fn targets_per_pass(mut self, v: usize) -> Self {
        self.params.targets_per_pass = v;
        self
    }

    /// Validate and produce the parameters.
    ///
    /// Validation rules
    /// -----------------
    /// * the tile scale factor, when given, must be one of [`TILE_SCALE_FACTORS`],
    /// * width, height and `targets_per_pass` must be positive.
    pub fn build(mut self) -> Result<AccumulationParams, AlbedoError> {
        if let Some(factor) = self.scale_factor {
            let (width, height) = tile_dimensions(factor)?;
            self.params.width = width;
            self.params.height = height;
        }
        let p = self.params;
        if p.width == 0 || p.height == 0 {
            return Err(AlbedoError::InvalidParameter(
                "raster width and height must be positive".into(),
            ));
        }
        if p.targets_per_pass == 0 {
            return Err(AlbedoError::InvalidParameter(
                "targets_per_pass must be positive".into(),
            ));
        }
        Ok(p)
    }
}

/// A daily accumulator file and the date parsed from its name.
///
/// Ordering is by date then path, which is the fold order of the engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DailyAccumulatorFile {
    pub date: SampleDate,
    pub path: Utf8PathBuf,
}

impl DailyAccumulatorFile {
    /// Parse the date out of the file name of `path`.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Result<Self, AlbedoError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .ok_or_else(|| AlbedoError::InvalidFileName(path.to_string()))?;
        let date = parse_daily_accumulator_file_name(file_name)?;
        Ok(DailyAccumulatorFile { date, path })
    }

    /// Every daily accumulator file directly inside `dir`, sorted.
    ///
    /// Entries whose name does not follow the daily naming convention are ignored.
    pub fn discover(dir: &Utf8Path) -> Result<Vec<Self>, AlbedoError> {
        let mut files = Vec::new();
        for entry in dir.read_dir_utf8()? {
            let entry = entry?;
            match parse_daily_accumulator_file_name(entry.file_name()) {
                Ok(date) => files.push(DailyAccumulatorFile {
                    date,
                    path: entry.path().to_path_buf(),
                }),
                Err(_) => debug!("Ignoring {}: not a daily accumulator", entry.path()),
            }
        }
        files.sort();
        Ok(files)
    }
}

/// A full accumulator under construction for one target day.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub window: AccumulationWindow,
    pub accumulator: FullAccumulator,
    pub contributing_files: usize,
}

impl Composite {
    pub fn new(window: AccumulationWindow, width: usize, height: usize) -> Self {
        Composite {
            window,
            accumulator: FullAccumulator::zeros(window.target, width, height),
            contributing_files: 0,
        }
    }

    /// Add `weight · daily` to the sums and update the closest-sample plane.
    pub fn fold(&mut self, daily: &DailyAccumulator, day_difference: i32, weight: f32) {
        let first_file = self.contributing_files == 0;
        let (sums, days) = self.accumulator.planes_mut();
        for (sum, &value) in sums.iter_mut().zip(daily.bands()) {
            *sum += weight * value;
        }
        fold_closest_sample(days, daily.mask_plane(), day_difference, first_file);
        self.contributing_files += 1;
    }
}

fn is_valid_weight(w: f32) -> bool {
    matches!(w.partial_cmp(&0.0), Some(Greater) | Some(Equal)) && w.is_finite()
}

/// Accumulate `files` into one composite per target day.
///
/// Arguments
/// -----------------
/// * `files`: Daily accumulator files, in any order (duplicates are folded once).
/// * `targets`: Target days, one composite each, returned in the same order.
/// * `params`: Window half width, raster dimensions and byte order.
/// * `weighting`: Temporal weight `w(d)`.
///
/// Return
/// ----------
/// * One [`Composite`] per target. Unreadable files are logged and skipped.
pub fn accumulate<W>(
    files: &[DailyAccumulatorFile],
    targets: &[SampleDate],
    params: &AccumulationParams,
    weighting: &W,
) -> Vec<Composite>
where
    W: DayWeighting + ?Sized,
{
    let mut files = files.to_vec();
    files.sort();
    files.dedup();

    let mut composites: Vec<Composite> = targets
        .iter()
        .map(|&target| {
            Composite::new(
                AccumulationWindow::new(target, params.wings),
                params.width,
                params.height,
            )
        })
        .collect();

    let mut progress = FileProgress::new(files.len());
    for file in &files {
        let contributions: Vec<Option<(i32, f32)>> = composites
            .iter()
            .map(|c| {
                let d = c.window.offset_of(&file.date)?;
                let w = weighting.weight(d);
                if is_valid_weight(w) {
                    Some((d, w))
                } else {
                    warn!(
                        "Ignoring {} for target {}: invalid weight {w} at day difference {d}",
                        file.path, c.window.target
                    );
                    None
                }
            })
            .collect();

        let n_targets = contributions.iter().flatten().count();
        if n_targets == 0 {
            debug!("{} is outside every accumulation window", file.path);
            progress.file_done();
            continue;
        }

        let daily = match read_daily_accumulator(
            &file.path,
            file.date,
            params.width,
            params.height,
            params.byte_order,
        ) {
            Ok(daily) => daily,
            Err(e) => {
                error!("Skipping daily accumulator {}: {e}", file.path);
                progress.file_done();
                continue;
            }
        };

        composites
            .par_iter_mut()
            .zip(contributions.par_iter())
            .for_each(|(composite, contribution)| {
                if let Some((d, w)) = *contribution {
                    composite.fold(&daily, d, w);
                }
            });

        let elapsed = progress.file_done();
        info!(
            "Accumulated {} into {n_targets} composite(s) in {}",
            file.path,
            progress_bar::short_duration(elapsed)
        );
    }
    progress.finish();

    for composite in &composites {
        if composite.contributing_files == 0 {
            warn!(
                "No daily accumulator within {} days of {}: composite is empty",
                composite.window.wings, composite.window.target
            );
        }
    }
    composites
}

/// Write each composite as `matrices_full_<year><doy>.bin` inside `out_dir`.
///
/// A composite that cannot be written is logged and dropped; the paths of the files
/// actually written are returned.
pub fn write_composites(
    composites: &[Composite],
    out_dir: &Utf8Path,
    byte_order: ByteOrder,
) -> Vec<Utf8PathBuf> {
    let mut written = Vec::with_capacity(composites.len());
    for composite in composites {
        let date = composite.accumulator.date;
        let result = full_accumulator_file_name(date.year, date.doy).and_then(|name| {
            let path = out_dir.join(name);
            write_full_accumulator(&path, &composite.accumulator, byte_order).map(|_| path)
        });
        match result {
            Ok(path) => {
                info!("Wrote full accumulator {path}");
                written.push(path);
            }
            Err(e) => error!("Dropping full accumulator of {date}: {e}"),
        }
    }
    written
}

/// Discover the daily files of `input_dir`, accumulate them for every target and write
/// the composites to `out_dir`, `params.targets_per_pass` targets at a time.
pub fn accumulate_directory<W>(
    input_dir: &Utf8Path,
    out_dir: &Utf8Path,
    targets: &[SampleDate],
    params: &AccumulationParams,
    weighting: &W,
) -> Result<Vec<Utf8PathBuf>, AlbedoError>
where
    W: DayWeighting + ?Sized,
{
    let files = DailyAccumulatorFile::discover(input_dir)?;
    info!(
        "Found {} daily accumulator(s) in {input_dir} for {} target day(s)",
        files.len(),
        targets.len()
    );

    let mut written = Vec::with_capacity(targets.len());
    for chunk in targets.chunks(params.targets_per_pass.max(1)) {
        let composites = accumulate(&files, chunk, params, weighting);
        written.extend(write_composites(&composites, out_dir, params.byte_order));
    }
    Ok(written)
}

#[cfg(test)]
mod test_accumulation {
    use super::*;
    use crate::{
        accumulator::{codec::write_daily_accumulator, naming::daily_accumulator_file_name},
        constants::{MASK_BAND_INDEX, NUM_ACCUMULATOR_BANDS},
    };
    use approx::assert_relative_eq;

    fn date(doy: u32) -> SampleDate {
        SampleDate::new(2005, doy).unwrap()
    }

    fn write_uniform_daily(dir: &Utf8Path, doy: u32, value: f32, mask: f32) -> DailyAccumulatorFile {
        let (w, h) = (2, 1);
        let mut daily = DailyAccumulator::zeros(date(doy), w, h);
        for band in 0..NUM_ACCUMULATOR_BANDS {
            let v = if band == MASK_BAND_INDEX { mask } else { value };
            daily.band_plane_mut(band).fill(v);
        }
        let path = dir.join(daily_accumulator_file_name(2005, doy).unwrap());
        write_daily_accumulator(&path, &daily, ByteOrder::LittleEndian).unwrap();
        DailyAccumulatorFile::from_path(path).unwrap()
    }

    fn params(wings: u32) -> AccumulationParams {
        AccumulationParams::builder()
            .wings(wings)
            .raster_size(2, 1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_tile_dimensions() {
        assert_eq!(tile_dimensions(1.0).unwrap(), (1200, 1200));
        assert_eq!(tile_dimensions(0.5).unwrap(), (2400, 2400));
        assert_eq!(tile_dimensions(60.0).unwrap(), (20, 20));
        assert_eq!(
            tile_dimensions(3.0),
            Err(AlbedoError::InvalidTileScaleFactor(3.0))
        );
    }

    #[test]
    fn test_params_builder() {
        let p = AccumulationParams::builder()
            .tile_scale_factor(10.0)
            .build()
            .unwrap();
        assert_eq!((p.width, p.height), (120, 120));
        assert_eq!(p.wings, DEFAULT_WINGS);

        assert!(AccumulationParams::builder()
            .raster_size(0, 10)
            .build()
            .is_err());
        assert!(AccumulationParams::builder()
            .tile_scale_factor(7.0)
            .build()
            .is_err());
    }

    #[test]
    fn test_weighted_sum_and_window() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        let files = vec![
            write_uniform_daily(&dir, 95, 1.0, 1.0),
            write_uniform_daily(&dir, 103, 2.0, 1.0),
            write_uniform_daily(&dir, 150, 100.0, 1.0),
        ];

        let weighting = |d: i32| 1.0 / (1.0 + d.abs() as f32);
        let composites = accumulate(&files, &[date(100)], &params(10), &weighting);
        assert_eq!(composites.len(), 1);

        let composite = &composites[0];
        assert_eq!(composite.contributing_files, 2);
        let full = &composite.accumulator;
        let expected = 1.0 / 6.0 + 2.0 / 4.0;
        assert_relative_eq!(full.value(0, 0, 1), expected, epsilon = 1e-6);
        assert_relative_eq!(
            full.value(MASK_BAND_INDEX, 0, 0),
            1.0 / 6.0 + 1.0 / 4.0,
            epsilon = 1e-6
        );
        assert_eq!(full.days_to_closest_sample(), &[4.0, 4.0]);
    }

    #[test]
    fn test_empty_window_and_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        let good = write_uniform_daily(&dir, 10, 1.0, 1.0);
        let bad_path = dir.join("matrices_2005011.bin");
        std::fs::write(&bad_path, [0u8; 7]).unwrap();
        let bad = DailyAccumulatorFile::from_path(bad_path).unwrap();

        let composites = accumulate(&[bad, good], &[date(11), date(200)], &params(5), &|_: i32| 1.0_f32);

        assert_eq!(composites[0].contributing_files, 1);
        assert_eq!(composites[0].accumulator.mask_plane(), &[1.0, 1.0]);
        assert_eq!(composites[0].accumulator.days_to_closest_sample(), &[2.0, 2.0]);

        assert_eq!(composites[1].contributing_files, 0);
        assert!(composites[1].accumulator.sum_matrices().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_invalid_weight_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(dir.path()).unwrap().to_path_buf();
        let files = vec![write_uniform_daily(&dir, 10, 1.0, 1.0)];

        let composites = accumulate(&files, &[date(10)], &params(5), &|_: i32| f32::NAN);
        assert_eq!(composites[0].contributing_files, 0);
    }

    #[test]
    fn test_discover_and_write() {
        let input = tempfile::tempdir().unwrap();
        let input = Utf8Path::from_path(input.path()).unwrap().to_path_buf();
        let output = tempfile::tempdir().unwrap();
        let output = Utf8Path::from_path(output.path()).unwrap().to_path_buf();

        write_uniform_daily(&input, 12, 1.0, 1.0);
        write_uniform_daily(&input, 4, 1.0, 1.0);
        std::fs::write(input.join("notes.txt"), "not an accumulator").unwrap();

        let found = DailyAccumulatorFile::discover(&input).unwrap();
        assert_eq!(
            found.iter().map(|f| f.date.doy).collect::<Vec<_>>(),
            vec![4, 12]
        );

        let written = accumulate_directory(
            &input,
            &output,
            &[date(1), date(9)],
            &params(8),
            &weight::ExponentialDecay::default(),
        )
        .unwrap();
        assert_eq!(
            written,
            vec![
                output.join("matrices_full_2005001.bin"),
                output.join("matrices_full_2005009.bin"),
            ]
        );
    }
}
