//! Hierarchical binning arithmetic shared by the BAI and CSI formats.
//!
//! Coordinate-sorted indexes assign alignments to bins of a k-ary interval
//! tree. Level 0 is a single bin covering the whole reference; each deeper
//! level splits every bin into 8. With parameters `min_shift` and `depth`,
//! level *l* holds `8^l` bins of `2^(min_shift + 3*(depth - l))` bases each,
//! and level-*l* bin identifiers start at `(8^l - 1) / 7`.
//!
//! A region query collects, per level, the inclusive identifier range covering
//! the interval; the union over all levels is the candidate set. Any alignment
//! overlapping the interval must live in one of those bins.
//!
//! The BAI format hard-codes `min_shift = 14`, `depth = 5` (37,450 bins, 512
//! Mbp maximum reference); CSI stores both parameters in its header. There is
//! no separate BAI algorithm; it is this one with the fixed parameters.

/// Fixed `min_shift` of the BAI binning scheme (16 Kbp finest bins).
pub const BAI_MIN_SHIFT: i32 = 14;

/// Fixed `depth` of the BAI binning scheme (6 levels, 37,450 bins).
pub const BAI_DEPTH: i32 = 5;

/// Shift of the BAI linear index window (2^14 = 16,384 bases per window).
pub const LINEAR_WINDOW_SHIFT: u32 = 14;

/// Calculate the bin identifiers that may hold alignments overlapping
/// a region.
///
/// The region is `[begin, end)`, 0-based and half-open with `begin < end`.
/// Returns one identifier per level for a point query, more for intervals
/// spanning bin boundaries; identifiers are unique and ascend within each
/// level, starting with bin 0.
///
/// # Example
///
/// ```
/// use bamchop::binning::{candidate_bins, BAI_MIN_SHIFT, BAI_DEPTH};
///
/// let bins = candidate_bins(1000, 2000, BAI_MIN_SHIFT, BAI_DEPTH);
/// assert_eq!(bins[0], 0); // level-0 bin covers every region
/// assert_eq!(bins.len(), 6); // one bin per level for a sub-16kb interval
/// ```
pub fn candidate_bins(begin: u64, end: u64, min_shift: i32, depth: i32) -> Vec<u32> {
    debug_assert!(begin < end, "region must be non-empty");

    let mut bins = Vec::new();
    let end = end - 1; // inclusive for the shift arithmetic

    let mut shift = (min_shift + 3 * depth) as u32;
    let mut offset: u64 = 0;
    for level in 0..=depth {
        let first = offset + (begin >> shift);
        let last = offset + (end >> shift);
        for bin in first..=last {
            bins.push(bin as u32);
        }
        shift = shift.saturating_sub(3);
        offset += 1u64 << (3 * level);
    }

    bins
}
