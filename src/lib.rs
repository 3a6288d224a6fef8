//! overlapper library
//!
//! Converts suffix-array interval hits into canonical read overlaps and
//! writes them as an ASQG graph or as split containment/overlap files.

pub mod asqg;
pub mod config;
pub mod coord;
pub mod error;
pub mod hits;
pub mod index;
pub mod overlap;
pub mod pipeline;
pub mod read_table;
pub mod router;
pub mod search;

pub use config::{OutputMode, OverlapConfig, DEFAULT_MIN_OVERLAP};
pub use coord::SeqCoord;
pub use error::{OverlapError, Result};
pub use hits::{AlignFlags, HitRecord, OverlapBlock};
pub use index::{PrefixIndex, ReadIndex, Strand, StrandPair};
pub use overlap::{infer_overlaps, Match, Overlap};
pub use pipeline::{stream_hits, OverlapPipeline, RunSummary, Stage};
pub use read_table::{ReadId, ReadTable, SeqItem};
pub use router::{classify, AsqgSink, LegacySink, OverlapClass, OverlapSink, RouteStats};
pub use search::{compute_hits_parallel, compute_hits_serial, HitFiles, HitSearch};
