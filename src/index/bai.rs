//! BAI codec.
//!
//! # Format
//!
//! ```text
//! magic[4]       "BAI\1"
//! n_ref[4]       Number of reference sequences (int32)
//! For each reference:
//!   n_bin[4]     Number of bins (int32)
//!   For each bin:
//!     bin[4]     Bin identifier (uint32)
//!     n_chunk[4] Number of chunks (int32)
//!     For each chunk:
//!       chunk_beg[8]  Virtual offset (uint64)
//!       chunk_end[8]  Virtual offset (uint64)
//!   n_intv[4]    Number of linear-index windows (int32)
//!   For each window:
//!     ioffset[8] Virtual offset (uint64)
//! n_no_coor[8]   Unplaced-read count (uint64, optional)
//! ```
//!
//! The binning parameters are not stored: every BAI file uses min_shift=14,
//! depth=5. The trailing `n_no_coor` field is written by some producers only;
//! its absence is not an error.

use std::io::{Read, Write};

use super::{
    read_count, read_trailing_unaligned, read_u32, read_u64, write_i32, write_u32, write_u64,
    BinRecord, Chunk, FormatParams, Index, ReferenceIndex, VirtualOffset, BAI_MAGIC,
};
use crate::error::Result;

/// Read the body of a BAI index; the caller has already consumed the magic.
pub(crate) fn read_body<R: Read>(reader: &mut R) -> Result<Index> {
    let n_ref = read_count(reader, "reference count")?;

    // Counts come straight from the file; cap preallocations so a bogus
    // count cannot demand memory before the truncation is detected.
    let mut references = Vec::with_capacity(n_ref.min(1024));
    for _ in 0..n_ref {
        references.push(read_reference(reader)?);
    }

    let unaligned_count = read_trailing_unaligned(reader);

    Ok(Index {
        params: FormatParams::Bai,
        references,
        unaligned_count,
    })
}

fn read_reference<R: Read>(reader: &mut R) -> Result<ReferenceIndex> {
    let n_bin = read_count(reader, "bin count")?;

    let mut reference = ReferenceIndex::default();
    for _ in 0..n_bin {
        let bin_id = read_u32(reader, "bin id")?;
        let n_chunk = read_count(reader, "chunk count")?;

        let mut record = BinRecord::default();
        record.chunks.reserve(n_chunk.min(1024));
        for _ in 0..n_chunk {
            let start = VirtualOffset::from_raw(read_u64(reader, "chunk begin")?);
            let end = VirtualOffset::from_raw(read_u64(reader, "chunk end")?);
            record.chunks.push(Chunk::new(start, end));
        }
        reference.bins.insert(bin_id, record);
    }

    let n_intv = read_count(reader, "interval count")?;
    reference.intervals.reserve(n_intv.min(1024));
    for _ in 0..n_intv {
        reference
            .intervals
            .push(VirtualOffset::from_raw(read_u64(reader, "interval offset")?));
    }

    Ok(reference)
}

/// Write a BAI index. Bin tables are emitted in ascending identifier order.
pub(crate) fn write<W: Write>(index: &Index, writer: &mut W) -> Result<()> {
    writer.write_all(BAI_MAGIC)?;
    write_i32(writer, index.references.len() as i32)?;

    for reference in &index.references {
        write_i32(writer, reference.bins.len() as i32)?;
        for (&bin_id, record) in &reference.bins {
            write_u32(writer, bin_id)?;
            write_i32(writer, record.chunks.len() as i32)?;
            for chunk in &record.chunks {
                write_u64(writer, chunk.start.as_raw())?;
                write_u64(writer, chunk.end.as_raw())?;
            }
        }

        write_i32(writer, reference.intervals.len() as i32)?;
        for offset in &reference.intervals {
            write_u64(writer, offset.as_raw())?;
        }
    }

    if let Some(count) = index.unaligned_count {
        write_u64(writer, count)?;
    }

    Ok(())
}
