//! Batch orchestration: crop one index against many intervals.
//!
//! The orchestrator owns the loop, not the I/O: the caller supplies a write
//! function (typically "serialize into `<prefix>/<region>/<index-name>`").
//! Processing is fail-fast: the first crop or persist failure aborts the
//! remaining batch, and outputs already written stay on disk.

use std::fmt;

use crate::crop::{crop, CropOptions, GenomicInterval};
use crate::error::{Error, Result};
use crate::index::Index;

/// First failure of a batch chop, identifying the interval that caused it.
#[derive(Debug)]
pub struct BatchError {
    /// Position of the failed interval in the input slice
    pub interval: usize,
    /// The underlying failure
    pub error: Error,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chopping interval {} failed: {}", self.interval, self.error)
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Crop `index` against each interval in order, handing every cropped index
/// to `write_fn` together with its interval position.
///
/// # Errors
///
/// Returns the first crop or write failure as a [`BatchError`]; intervals
/// after it are not processed, and nothing already written is rolled back.
pub fn chop_all<W>(
    index: &Index,
    intervals: &[GenomicInterval],
    options: &CropOptions,
    mut write_fn: W,
) -> std::result::Result<(), BatchError>
where
    W: FnMut(usize, &Index) -> Result<()>,
{
    for (i, interval) in intervals.iter().enumerate() {
        let cropped = crop(index, interval, options)
            .map_err(|error| BatchError { interval: i, error })?;
        write_fn(i, &cropped).map_err(|error| BatchError { interval: i, error })?;
    }
    Ok(())
}
