//! CSI codec.
//!
//! # Format
//!
//! ```text
//! magic[4]       "CSI\1"
//! min_shift[4]   Base bin size as a power of two (int32)
//! depth[4]       Number of binning levels (int32)
//! l_aux[4]       Length of auxiliary data (int32)
//! aux[l_aux]     Auxiliary data (opaque)
//! n_ref[4]       Number of reference sequences (int32)
//! For each reference:
//!   n_bin[4]     Number of bins (int32)
//!   For each bin:
//!     bin[4]     Bin identifier (uint32)
//!     loffset[8] Lowest virtual offset in the bin (uint64)
//!     n_chunk[4] Number of chunks (int32)
//!     For each chunk:
//!       chunk_beg[8]  Virtual offset (uint64)
//!       chunk_end[8]  Virtual offset (uint64)
//! n_no_coor[8]   Unplaced-read count (uint64, optional)
//! ```
//!
//! Unlike BAI there is no linear index; each bin instead carries a loffset
//! hint. Metadata pseudo-bins are read and re-serialized as ordinary bins so
//! that a load/save cycle reproduces the input bytes.

use std::io::{Read, Write};

use super::{
    read_count, read_i32, read_trailing_unaligned, read_u32, read_u64, write_i32, write_u32,
    write_u64, BinRecord, Chunk, FormatParams, Index, ReferenceIndex, VirtualOffset, CSI_MAGIC,
};
use crate::error::{Error, Result};

/// Read the body of a CSI index; the caller has already consumed the magic.
pub(crate) fn read_body<R: Read>(reader: &mut R) -> Result<Index> {
    let min_shift = read_i32(reader, "min_shift")?;
    let depth = read_i32(reader, "depth")?;
    // The total shift min_shift + 3*depth must stay below 64 for the binning
    // arithmetic, and bin identifiers only fit u32 up to depth 9.
    if min_shift < 0 || depth < 0 || depth > 9 || min_shift + 3 * depth > 63 {
        return Err(Error::format(format!(
            "invalid CSI header: min_shift={}, depth={}",
            min_shift, depth
        )));
    }

    let l_aux = read_count(reader, "auxiliary data length")?;
    // Grow the aux buffer from the bytes actually present rather than
    // allocating the declared length up front; a truncated blob then fails
    // without a giant preallocation.
    let mut aux = Vec::new();
    reader
        .by_ref()
        .take(l_aux as u64)
        .read_to_end(&mut aux)
        .map_err(|_| Error::format("truncated index: short read on auxiliary data"))?;
    if aux.len() != l_aux {
        return Err(Error::format("truncated index: short read on auxiliary data"));
    }

    let n_ref = read_count(reader, "reference count")?;

    let mut references = Vec::with_capacity(n_ref.min(1024));
    for _ in 0..n_ref {
        references.push(read_reference(reader)?);
    }

    let unaligned_count = read_trailing_unaligned(reader);

    Ok(Index {
        params: FormatParams::Csi {
            min_shift,
            depth,
            aux,
        },
        references,
        unaligned_count,
    })
}

fn read_reference<R: Read>(reader: &mut R) -> Result<ReferenceIndex> {
    let n_bin = read_count(reader, "bin count")?;

    let mut reference = ReferenceIndex::default();
    for _ in 0..n_bin {
        let bin_id = read_u32(reader, "bin id")?;
        let loffset = VirtualOffset::from_raw(read_u64(reader, "loffset")?);
        let n_chunk = read_count(reader, "chunk count")?;

        let mut record = BinRecord::new(loffset);
        record.chunks.reserve(n_chunk.min(1024));
        for _ in 0..n_chunk {
            let start = VirtualOffset::from_raw(read_u64(reader, "chunk begin")?);
            let end = VirtualOffset::from_raw(read_u64(reader, "chunk end")?);
            record.chunks.push(Chunk::new(start, end));
        }
        reference.bins.insert(bin_id, record);
    }

    Ok(reference)
}

/// Write a CSI index. Bin tables are emitted in ascending identifier order.
pub(crate) fn write<W: Write>(index: &Index, writer: &mut W) -> Result<()> {
    let (min_shift, depth, aux) = match &index.params {
        FormatParams::Csi {
            min_shift,
            depth,
            aux,
        } => (*min_shift, *depth, aux.as_slice()),
        FormatParams::Bai => {
            return Err(Error::format("cannot write a BAI index as CSI"));
        }
    };

    writer.write_all(CSI_MAGIC)?;
    write_i32(writer, min_shift)?;
    write_i32(writer, depth)?;
    write_i32(writer, aux.len() as i32)?;
    writer.write_all(aux)?;

    write_i32(writer, index.references.len() as i32)?;
    for reference in &index.references {
        write_i32(writer, reference.bins.len() as i32)?;
        for (&bin_id, record) in &reference.bins {
            write_u32(writer, bin_id)?;
            write_u64(writer, record.loffset.as_raw())?;
            write_i32(writer, record.chunks.len() as i32)?;
            for chunk in &record.chunks {
                write_u64(writer, chunk.start.as_raw())?;
                write_u64(writer, chunk.end.as_raw())?;
            }
        }
    }

    if let Some(count) = index.unaligned_count {
        write_u64(writer, count)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_csi() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&14i32.to_le_bytes()); // min_shift
        data.extend_from_slice(&5i32.to_le_bytes()); // depth
        data.extend_from_slice(&0i32.to_le_bytes()); // l_aux
        data.extend_from_slice(&1i32.to_le_bytes()); // n_ref

        // Reference 0: one bin with one chunk
        data.extend_from_slice(&1i32.to_le_bytes()); // n_bin
        data.extend_from_slice(&0u32.to_le_bytes()); // bin id
        data.extend_from_slice(&500u64.to_le_bytes()); // loffset
        data.extend_from_slice(&1i32.to_le_bytes()); // n_chunk
        data.extend_from_slice(&1000u64.to_le_bytes());
        data.extend_from_slice(&2000u64.to_le_bytes());
        data
    }

    #[test]
    fn test_read_minimal() {
        let data = minimal_csi();
        let mut cursor = std::io::Cursor::new(data);
        let index = Index::read(&mut cursor).expect("parse failed");

        assert_eq!(index.min_shift(), 14);
        assert_eq!(index.depth(), 5);
        assert_eq!(index.references.len(), 1);

        let bin = &index.references[0].bins[&0];
        assert_eq!(bin.loffset.as_raw(), 500);
        assert_eq!(bin.chunks.len(), 1);
        assert_eq!(bin.chunks[0].start.as_raw(), 1000);
        assert_eq!(bin.chunks[0].end.as_raw(), 2000);
    }

    #[test]
    fn test_aux_data_carried_verbatim() {
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&14i32.to_le_bytes());
        data.extend_from_slice(&5i32.to_le_bytes());
        let aux = b"chr1\0chr2\0";
        data.extend_from_slice(&(aux.len() as i32).to_le_bytes());
        data.extend_from_slice(aux);
        data.extend_from_slice(&0i32.to_le_bytes()); // n_ref

        let mut cursor = std::io::Cursor::new(data.clone());
        let index = Index::read(&mut cursor).expect("parse failed");
        match &index.params {
            FormatParams::Csi { aux: got, .. } => assert_eq!(got.as_slice(), &aux[..]),
            FormatParams::Bai => panic!("wrong variant"),
        }
        assert_eq!(index.to_bytes().unwrap(), data);
    }

    #[test]
    fn test_negative_header_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&(-14i32).to_le_bytes());
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());

        let mut cursor = std::io::Cursor::new(data);
        let err = Index::read(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("min_shift"));
    }

    #[test]
    fn test_oversized_depth_rejected() {
        // depth=30 would push the binning shift past 63 bits; region queries
        // over such an index could never be answered, so the load must fail.
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&14i32.to_le_bytes());
        data.extend_from_slice(&30i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());
        data.extend_from_slice(&0i32.to_le_bytes());

        let mut cursor = std::io::Cursor::new(data);
        let err = Index::read(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("depth=30"));
    }

    #[test]
    fn test_truncated_aux_is_format_error() {
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&14i32.to_le_bytes());
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&16i32.to_le_bytes()); // claims 16 aux bytes
        data.extend_from_slice(b"shrt"); // delivers 4

        let mut cursor = std::io::Cursor::new(data);
        let err = Index::read(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("auxiliary"));
    }

    #[test]
    fn test_overstated_aux_length_fails_as_truncation() {
        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&14i32.to_le_bytes());
        data.extend_from_slice(&5i32.to_le_bytes());
        data.extend_from_slice(&i32::MAX.to_le_bytes()); // l_aux, 4 bytes follow
        data.extend_from_slice(b"shrt");

        let mut cursor = std::io::Cursor::new(data);
        let err = Index::read(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("auxiliary"));
    }

    #[test]
    fn test_round_trip_minimal() {
        let data = minimal_csi();
        let mut cursor = std::io::Cursor::new(data.clone());
        let index = Index::read(&mut cursor).expect("parse failed");
        assert_eq!(index.to_bytes().unwrap(), data);
    }
}
