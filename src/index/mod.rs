//! In-memory model and binary codec for BAM index files.
//!
//! Two on-disk variants are supported:
//!
//! - **BAI** (`.bai`): fixed binning parameters (min_shift=14, depth=5, not
//!   stored on disk) plus a per-reference linear index of 16 Kbp windows.
//! - **CSI** (`.csi`): binning parameters stored in the header, an opaque
//!   auxiliary blob, a per-bin lowest-offset hint (loffset), no linear index.
//!
//! Both variants share the reference-indexed bin table and an optional
//! trailing count of coordinate-less alignments. All integers are
//! little-endian.
//!
//! # Virtual File Offsets
//!
//! Both formats address the alignment file through BGZF virtual offsets,
//! 64-bit values combining:
//! - **Compressed offset** (high 48 bits): position in the compressed file
//! - **Uncompressed offset** (low 16 bits): position within the block
//!
//! The codec treats them as opaque, totally ordered values.
//!
//! # Example
//!
//! ```no_run
//! use bamchop::index::Index;
//!
//! # fn main() -> bamchop::Result<()> {
//! let index = Index::from_path("alignments.bam.bai")?;
//! println!("Index covers {} references", index.references.len());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

pub mod bai;
pub mod csi;

/// BAI file format magic string
pub(crate) const BAI_MAGIC: &[u8; 4] = b"BAI\x01";

/// CSI file format magic string
pub(crate) const CSI_MAGIC: &[u8; 4] = b"CSI\x01";

/// On-disk sentinel standing in for an absent unaligned-read count.
pub(crate) const UNALIGNED_UNSET: u64 = u64::MAX;

/// Virtual file offset in BGZF format.
///
/// A 64-bit value combining:
/// - Bits 63-16: Compressed file offset (byte position in the .bam file)
/// - Bits 15-0: Uncompressed offset within the decompressed block
///
/// # Example
///
/// ```
/// # use bamchop::index::VirtualOffset;
/// let offset = VirtualOffset::new(1024, 512);
/// assert_eq!(offset.compressed_offset(), 1024);
/// assert_eq!(offset.uncompressed_offset(), 512);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Create a new virtual offset from compressed and uncompressed components.
    ///
    /// # Arguments
    ///
    /// * `compressed` - Byte offset in the compressed file
    /// * `uncompressed` - Byte offset within the decompressed block
    pub fn new(compressed: u64, uncompressed: u16) -> Self {
        VirtualOffset((compressed << 16) | (uncompressed as u64))
    }

    /// Create from raw 64-bit value.
    pub fn from_raw(value: u64) -> Self {
        VirtualOffset(value)
    }

    /// Get raw 64-bit value.
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Get compressed file offset (high 48 bits).
    pub fn compressed_offset(self) -> u64 {
        self.0 >> 16
    }

    /// Get uncompressed offset within block (low 16 bits).
    pub fn uncompressed_offset(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

/// A chunk is a contiguous range of virtual offsets believed to contain
/// alignments assigned to one bin.
///
/// Invariant: `start <= end`. Offsets are used for seeking and comparison
/// only, never for arithmetic on their internal structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Virtual file offset where the chunk starts
    pub start: VirtualOffset,
    /// Virtual file offset where the chunk ends
    pub end: VirtualOffset,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(start: VirtualOffset, end: VirtualOffset) -> Self {
        Chunk { start, end }
    }
}

/// Per-bin index data: the bin's chunks plus, for CSI, its loffset.
///
/// Chunk order is insertion order and is preserved through load/save; lookups
/// never rely on it, but re-serialization must be bit-faithful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinRecord {
    /// Lowest virtual offset of any alignment in this bin.
    ///
    /// Stored on disk by CSI only; zero and never serialized for BAI.
    pub loffset: VirtualOffset,
    /// Chunks of data assigned to this bin
    pub chunks: Vec<Chunk>,
}

impl BinRecord {
    /// Create a record with the given loffset and no chunks.
    pub fn new(loffset: VirtualOffset) -> Self {
        BinRecord {
            loffset,
            chunks: Vec::new(),
        }
    }
}

/// Index data for one reference sequence.
///
/// The bin table is keyed by bin identifier; `BTreeMap` keeps it in the
/// ascending order both formats require at the serialization boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceIndex {
    /// Hierarchical bin table for this reference
    pub bins: BTreeMap<u32, BinRecord>,
    /// Linear index: minimum virtual offset per 16 Kbp window.
    ///
    /// BAI only; always empty for CSI.
    pub intervals: Vec<VirtualOffset>,
}

/// Format parameters distinguishing the two index variants.
///
/// Everything downstream of the codec (cropping, resolution) runs a single
/// code path over this tag instead of duplicating per-variant algorithms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatParams {
    /// BAI: implicit min_shift=14, depth=5; linear index present
    Bai,
    /// CSI: explicit binning parameters and an opaque auxiliary blob
    Csi {
        /// Base bin size as a power of two
        min_shift: i32,
        /// Number of binning levels below the root
        depth: i32,
        /// Auxiliary data of caller-defined meaning, carried verbatim
        aux: Vec<u8>,
    },
}

/// A loaded BAM index, either variant.
///
/// Built by the codec from file bytes or by [`crate::crop::crop`] from an
/// existing index; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Which on-disk variant this index uses, with its parameters
    pub params: FormatParams,
    /// Per-reference index data, one entry per reference sequence
    pub references: Vec<ReferenceIndex>,
    /// Count of alignments without coordinates, if the file recorded one
    pub unaligned_count: Option<u64>,
}

impl Index {
    /// Binning `min_shift` in effect for this index.
    pub fn min_shift(&self) -> i32 {
        match self.params {
            FormatParams::Bai => crate::binning::BAI_MIN_SHIFT,
            FormatParams::Csi { min_shift, .. } => min_shift,
        }
    }

    /// Binning `depth` in effect for this index.
    pub fn depth(&self) -> i32 {
        match self.params {
            FormatParams::Bai => crate::binning::BAI_DEPTH,
            FormatParams::Csi { depth, .. } => depth,
        }
    }

    /// Conventional file extension for this variant (`bai` or `csi`).
    pub fn extension(&self) -> &'static str {
        match self.params {
            FormatParams::Bai => "bai",
            FormatParams::Csi { .. } => "csi",
        }
    }

    /// Load an index from a file, detecting the variant from its magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the magic matches neither variant or any
    /// required field is truncated or inconsistent, [`Error::Io`] if the file
    /// cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        Self::read(&mut reader)
    }

    /// Read an index from a reader, detecting the variant from its magic bytes.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|_| Error::format("truncated index: missing magic bytes"))?;

        match &magic {
            BAI_MAGIC => bai::read_body(reader),
            CSI_MAGIC => csi::read_body(reader),
            _ => Err(Error::format(format!(
                "unrecognized index magic: {:?} (expected 'BAI\\x01' or 'CSI\\x01')",
                magic
            ))),
        }
    }

    /// Write the index in its on-disk format.
    ///
    /// Bins are emitted in ascending identifier order; the trailing
    /// unaligned-read count is emitted only when present.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self.params {
            FormatParams::Bai => bai::write(self, writer),
            FormatParams::Csi { .. } => csi::write(self, writer),
        }
    }

    /// Serialize the index to a byte vector.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write(&mut bytes)?;
        Ok(bytes)
    }
}

// Binary read helpers (little-endian). A short read on any of these is a
// format error: these are only called for required fields.

pub(crate) fn read_i32<R: Read>(reader: &mut R, what: &str) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::format(format!("truncated index: short read on {}", what)))?;
    Ok(i32::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R, what: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::format(format!("truncated index: short read on {}", what)))?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R, what: &str) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader
        .read_exact(&mut buf)
        .map_err(|_| Error::format(format!("truncated index: short read on {}", what)))?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a count field and reject negative values.
pub(crate) fn read_count<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let n = read_i32(reader, what)?;
    if n < 0 {
        return Err(Error::format(format!("invalid {}: {}", what, n)));
    }
    Ok(n as usize)
}

/// Read the optional trailing unaligned-read count.
///
/// Absence or truncation is tolerated, never an error; the on-disk sentinel
/// maps to `None` so the optional representation exists only in memory.
pub(crate) fn read_trailing_unaligned<R: Read>(reader: &mut R) -> Option<u64> {
    let mut buf = [0u8; 8];
    match reader.read_exact(&mut buf) {
        Ok(()) => match u64::from_le_bytes(buf) {
            UNALIGNED_UNSET => None,
            n => Some(n),
        },
        Err(_) => None,
    }
}

pub(crate) fn write_i32<W: Write>(writer: &mut W, value: i32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}
