//! Region resolution: turn an index query into a concrete seek position.
//!
//! The bin table only narrows a query to candidate chunks; several bins can
//! point at data that precedes or follows the region. To find the position to
//! start scanning from, the resolver visits the candidate chunk begin offsets
//! in ascending order, reads one record at each, and keeps the *last* offset
//! whose record starts at or before the query begin. That is the rightmost
//! safe entry point: everything overlapping the region lies at or after it.
//!
//! The alignment stream is an external collaborator with a single cursor; the
//! resolver both reads from and repositions it, so concurrent calls against
//! one stream must be serialized by the caller.

use std::collections::BTreeSet;
use std::io;

use crate::binning::candidate_bins;
use crate::error::{Error, Result};
use crate::index::{Index, VirtualOffset};

/// The fields of an alignment record the resolver needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHead {
    /// Reference sequence id the record is aligned to
    pub ref_id: i32,
    /// 0-based start coordinate of the alignment
    pub pos: i64,
}

/// Minimal seek-and-peek interface over a BAM stream.
///
/// Implementations wrap whatever reader the application uses; the resolver
/// only ever seeks to a virtual offset and decodes the next record's
/// reference id and start position.
pub trait AlignmentStream {
    /// Whether the stream carries the alignment format the index describes.
    fn is_alignment_format(&self) -> bool;

    /// Reposition the cursor to a virtual offset.
    fn seek(&mut self, offset: VirtualOffset) -> io::Result<()>;

    /// Decode the record at the cursor.
    fn read_record(&mut self) -> io::Result<RecordHead>;
}

/// Outcome of a region jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    /// The query was valid. `has_alignments` is false when no record
    /// overlapping the region exists; that is a normal outcome, and the
    /// stream position is then unspecified.
    Positioned {
        /// Whether an overlapping alignment was found (and seeked to)
        has_alignments: bool,
    },
    /// Negative or out-of-range reference id; the stream was not touched.
    InvalidReference,
    /// The stream is not in the index's alignment format; not touched.
    WrongFormat,
}

/// Position a stream at the alignments overlapping `[begin, end)` on
/// `ref_id`.
///
/// On `Jump::Positioned { has_alignments: true }` the stream is left at the
/// resolved offset; the next records read from it cover the region (records
/// before `begin` may still need skipping by the caller).
///
/// # Errors
///
/// Propagates stream I/O failures only; invalid queries are reported through
/// the [`Jump`] variants.
pub fn jump_to_region<S: AlignmentStream>(
    stream: &mut S,
    index: &Index,
    ref_id: i32,
    begin: i64,
    end: i64,
) -> Result<Jump> {
    if !stream.is_alignment_format() {
        return Ok(Jump::WrongFormat);
    }
    if ref_id < 0 || ref_id as usize >= index.references.len() {
        return Ok(Jump::InvalidReference);
    }

    // Candidate seek positions: every chunk begin offset in every candidate
    // bin, deduplicated and ascending. End offsets play no part in seeking.
    let bins = candidate_bins(
        begin.max(0) as u64,
        end as u64,
        index.min_shift(),
        index.depth(),
    );
    let reference = &index.references[ref_id as usize];
    let mut candidates: BTreeSet<VirtualOffset> = BTreeSet::new();
    for bin_id in bins {
        if let Some(record) = reference.bins.get(&bin_id) {
            candidates.extend(record.chunks.iter().map(|chunk| chunk.start));
        }
    }

    // Search for the rightmost candidate still at or before the query begin.
    // Note that it is not necessarily the first.
    let mut best: Option<VirtualOffset> = None;
    let mut has_alignments = false;
    for &candidate in &candidates {
        stream.seek(candidate)?;
        let record = stream.read_record()?;

        if record.ref_id != ref_id {
            continue; // wrong contig
        }
        if !has_alignments || record.pos <= begin {
            has_alignments = true;
            best = Some(candidate);
        }
        if record.pos >= end {
            break; // nothing past this point can overlap
        }
    }

    if let Some(offset) = best {
        stream.seek(offset)?;
    }

    // Finding no overlapping alignment is not an error.
    Ok(Jump::Positioned { has_alignments })
}

/// Position a stream at the unplaced (coordinate-less) reads.
///
/// Not implemented for either index variant; callers get an explicit
/// capability-gap result instead of a wrong answer.
pub fn jump_to_unplaced<S: AlignmentStream>(_stream: &mut S, _index: &Index) -> Result<Jump> {
    Err(Error::Unsupported("seeking to unplaced-read regions"))
}
