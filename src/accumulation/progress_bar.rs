//! Progress reporting for the accumulation loop.
//!
//! [`FileProgress`] counts the daily files handled so far and times each of them. With the
//! `progress` feature it also drives an `indicatif` bar showing the last and mean file
//! durations and the estimated time left. Without the feature it only keeps the timings.

use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Compact rendering of a per-file duration: `"850µs"`, `"12.5ms"` or `"3.2s"`.
pub fn short_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1e-3 {
        format!("{}µs", d.as_micros())
    } else if secs < 1.0 {
        format!("{:.1}ms", secs * 1e3)
    } else {
        format!("{secs:.1}s")
    }
}

/// Progress of the daily-file loop.
pub struct FileProgress {
    total: usize,
    processed: usize,
    started: Instant,
    last: Instant,
    #[cfg(feature = "progress")]
    bar: ProgressBar,
}

impl FileProgress {
    pub fn new(total_files: usize) -> Self {
        let now = Instant::now();
        FileProgress {
            total: total_files,
            processed: 0,
            started: now,
            last: now,
            #[cfg(feature = "progress")]
            bar: {
                let bar = ProgressBar::new((total_files as u64).max(1));
                bar.set_style(
                    ProgressStyle::with_template(
                        "{bar:40.green/white} {pos}/{len} daily files | {elapsed_precise} | {msg}",
                    )
                    .expect("indicatif template"),
                );
                bar
            },
        }
    }

    /// Mark one daily file as processed and return how long it took.
    pub fn file_done(&mut self) -> Duration {
        let took = self.record(Instant::now());
        #[cfg(feature = "progress")]
        {
            self.bar.set_message(format!(
                "last {}, mean {}, ~{} left",
                short_duration(took),
                short_duration(self.mean_file_time()),
                short_duration(self.remaining())
            ));
            self.bar.inc(1);
        }
        took
    }

    fn record(&mut self, now: Instant) -> Duration {
        let took = now.saturating_duration_since(self.last);
        self.last = now;
        self.processed += 1;
        took
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Mean time per processed file, zero before the first one.
    pub fn mean_file_time(&self) -> Duration {
        match u32::try_from(self.processed) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.last.saturating_duration_since(self.started) / n,
            Err(_) => Duration::ZERO,
        }
    }

    /// Time left at the current mean pace.
    pub fn remaining(&self) -> Duration {
        let left = self.total.saturating_sub(self.processed);
        self.mean_file_time() * u32::try_from(left).unwrap_or(u32::MAX)
    }

    pub fn finish(self) {
        #[cfg(feature = "progress")]
        self.bar.finish_and_clear();
    }
}
