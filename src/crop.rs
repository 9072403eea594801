//! Interval cropping: derive a smaller index restricted to one region.
//!
//! Cropping keeps only the bins that can hold alignments overlapping the
//! interval and, for BAI, drops chunks that provably end before the region's
//! data begins (using the linear index as a lower bound). The result is a
//! fresh, self-consistent index that seeks correctly for queries inside the
//! cropped interval and is typically orders of magnitude smaller.
//!
//! Pure and I/O-free: both variants run through the same path, differing only
//! in the offset filter and the linear-index handling.
//!
//! # Example
//!
//! ```no_run
//! use bamchop::crop::{crop, CropOptions, GenomicInterval};
//! use bamchop::index::Index;
//!
//! # fn main() -> bamchop::Result<()> {
//! let index = Index::from_path("alignments.bam.bai")?;
//! let region = GenomicInterval::new(0, 1_000_000, 2_000_000);
//! let small = crop(&index, &region, &CropOptions::default())?;
//! # Ok(())
//! # }
//! ```

use crate::binning::{candidate_bins, LINEAR_WINDOW_SHIFT};
use crate::error::{Error, Result};
use crate::index::{BinRecord, FormatParams, Index, ReferenceIndex, VirtualOffset};

/// A half-open genomic region on one reference sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomicInterval {
    /// Reference sequence id (0-based position in the sequence dictionary)
    pub ref_id: usize,
    /// Start coordinate, 0-based inclusive
    pub begin: u64,
    /// End coordinate, 0-based exclusive; must exceed `begin`
    pub end: u64,
}

impl GenomicInterval {
    /// Create an interval. `begin` must be less than `end`.
    pub fn new(ref_id: usize, begin: u64, end: u64) -> Self {
        debug_assert!(begin < end, "interval must be non-empty");
        GenomicInterval { ref_id, begin, end }
    }
}

/// Options controlling what the cropped index retains.
#[derive(Debug, Clone, Copy, Default)]
pub struct CropOptions {
    /// Keep a (padded) linear index in the output. BAI only; CSI has none.
    pub retain_linear_index: bool,
}

/// Crop an index down to one genomic interval.
///
/// The output mirrors the input's reference count so reference ids keep their
/// meaning; only the interval's reference receives bins. Kept bins are exactly
/// the interval's candidate bins present in the input, with chunk lists copied
/// in order (BAI: filtered against the linear-index lower bound, never
/// reordered or split). CSI binning parameters, aux data, and per-bin loffsets
/// are carried through unmodified. The output's unaligned-read count is left
/// unset.
///
/// # Errors
///
/// [`Error::InvalidReference`] if the interval's reference id is outside the
/// index. Total otherwise.
pub fn crop(index: &Index, interval: &GenomicInterval, options: &CropOptions) -> Result<Index> {
    let n_ref = index.references.len();
    if interval.ref_id >= n_ref {
        return Err(Error::InvalidReference {
            ref_id: interval.ref_id as i64,
            references: n_ref,
        });
    }

    let mut references = vec![ReferenceIndex::default(); n_ref];

    // BAI: derive the lower bound on chunk end offsets from the linear index,
    // and optionally the cropped linear index itself.
    let min_offset = match index.params {
        FormatParams::Bai => {
            let (min_offset, intervals) =
                linear_min_offset(&index.references, interval, options.retain_linear_index);
            references[interval.ref_id].intervals = intervals;
            Some(min_offset)
        }
        FormatParams::Csi { .. } => None,
    };

    let bins = candidate_bins(interval.begin, interval.end, index.min_shift(), index.depth());
    let input_bins = &index.references[interval.ref_id].bins;
    for bin_id in bins {
        let Some(record) = input_bins.get(&bin_id) else {
            continue; // candidate is not in the index
        };

        let chunks: Vec<_> = match min_offset {
            Some(bound) => record
                .chunks
                .iter()
                .filter(|chunk| chunk.end >= bound)
                .copied()
                .collect(),
            None => record.chunks.clone(),
        };

        if !chunks.is_empty() {
            references[interval.ref_id].bins.insert(
                bin_id,
                BinRecord {
                    loffset: record.loffset,
                    chunks,
                },
            );
        }
    }

    Ok(Index {
        params: index.params.clone(),
        references,
        unaligned_count: None,
    })
}

/// Compute the BAI linear-index lower bound for an interval, plus the cropped
/// linear index when requested.
///
/// Three cases, keyed on the interval's first 16 Kbp window:
///
/// - Window inside the reference's linear index: the bound is that window's
///   entry. The retained linear index pads the leading windows with the first
///   entry of the first non-empty linear index at or after this reference,
///   then copies the windows covering the interval.
/// - Window out of bounds, linear index empty: scan forward across references
///   for the first non-zero entry in any non-empty linear index.
/// - Window out of bounds, linear index non-empty: the bound is its last
///   entry.
fn linear_min_offset(
    references: &[ReferenceIndex],
    interval: &GenomicInterval,
    retain_linear: bool,
) -> (VirtualOffset, Vec<VirtualOffset>) {
    let linear = &references[interval.ref_id].intervals;
    let window = (interval.begin >> LINEAR_WINDOW_SHIFT) as usize;
    let window_end = (interval.end >> LINEAR_WINDOW_SHIFT) as usize + 1;

    let mut min_offset = VirtualOffset::default();
    let mut cropped = Vec::new();

    if window < linear.len() {
        min_offset = linear[window];

        if retain_linear {
            // Padding value: lowest offset of any non-empty linear index from
            // this reference forward.
            let pad = references[interval.ref_id..]
                .iter()
                .find_map(|r| r.intervals.first())
                .copied()
                .unwrap_or_default();

            cropped.reserve(window_end.min(linear.len()));
            cropped.extend(std::iter::repeat(pad).take(window));
            cropped.extend_from_slice(&linear[window..window_end.min(linear.len())]);
        }
    } else if linear.is_empty() {
        'scan: for reference in &references[interval.ref_id..] {
            for &offset in &reference.intervals {
                if offset.as_raw() != 0 {
                    min_offset = offset;
                    break 'scan;
                }
            }
        }
    } else {
        min_offset = linear.last().copied().unwrap_or_default();
    }

    (min_offset, cropped)
}
