//! bamchop: manipulate BAM index files (BAI/CSI) without touching the BAM.
//!
//! A coordinate-sorted BAM archive is usually paired with a random-access
//! index, BAI or its configurable successor CSI, that maps genomic regions
//! to virtual file offsets. This crate loads, queries, crops, and rewrites
//! those indexes:
//!
//! - [`index`]: the in-memory data model and binary codec for both variants
//! - [`binning`]: the hierarchical binning arithmetic shared by both
//! - [`resolve`]: turn a region query into a concrete stream seek position
//! - [`crop`]: derive a smaller, self-consistent index for a sub-region
//! - [`chop`]: batch many crops against one input index
//!
//! The flagship use case is the `bamchop` binary: given a BAM file's index
//! and a list of regions, write one small per-region index file each, so a
//! region's worth of alignments can be shipped or queried without the
//! full-genome index.
//!
//! # Example
//!
//! ```no_run
//! use bamchop::crop::{crop, CropOptions, GenomicInterval};
//! use bamchop::index::Index;
//! use std::io::Write;
//!
//! # fn main() -> bamchop::Result<()> {
//! let index = Index::from_path("alignments.bam.bai")?;
//!
//! // Keep only what chr0:1,000,000-2,000,000 needs.
//! let region = GenomicInterval::new(0, 1_000_000, 2_000_000);
//! let small = crop(&index, &region, &CropOptions::default())?;
//!
//! let mut out = std::fs::File::create("region.bai")?;
//! small.write(&mut out)?;
//! out.flush()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Scope
//!
//! bamchop reads and rewrites existing indexes; it does not build one from
//! raw alignment data, and resolving unplaced-read regions returns
//! [`Error::Unsupported`]. The alignment stream itself is only ever consumed
//! through the narrow [`resolve::AlignmentStream`] seam.

pub mod binning;
pub mod chop;
pub mod crop;
pub mod error;
pub mod index;
pub mod resolve;

pub use chop::{chop_all, BatchError};
pub use crop::{crop, CropOptions, GenomicInterval};
pub use error::{Error, Result};
pub use index::{BinRecord, Chunk, FormatParams, Index, ReferenceIndex, VirtualOffset};
pub use resolve::{jump_to_region, jump_to_unplaced, AlignmentStream, Jump, RecordHead};
