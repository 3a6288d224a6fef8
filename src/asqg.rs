//! Records of the ASQG assembly-graph text format.
//!
//! Every line is a record: a two-letter type tag followed by tab-separated
//! fields. Header tags are `XX:T:value` with `T` one of `i` (integer),
//! `f` (float) or `Z` (string).

use std::fmt;
use std::io::Write;

use crate::error::Result;
use crate::overlap::Overlap;
use crate::read_table::SeqItem;

pub const ASQG_VERSION: u32 = 1;
pub const ASQG_EXT: &str = ".asqg";

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub version: u32,
    pub error_rate: f64,
    pub min_overlap: usize,
    pub input_file: String,
    pub containments: bool,
    pub transitive: bool,
}

impl HeaderRecord {
    pub fn new(min_overlap: usize, error_rate: f64, input_file: impl Into<String>) -> Self {
        Self {
            version: ASQG_VERSION,
            error_rate,
            min_overlap,
            input_file: input_file.into(),
            containments: true,
            transitive: true,
        }
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{self}")?;
        Ok(())
    }
}

impl fmt::Display for HeaderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HT\tVN:i:{}\tER:f:{}\tOL:i:{}\tIN:Z:{}\tCN:i:{}\tTE:i:{}",
            self.version,
            self.error_rate,
            self.min_overlap,
            self.input_file,
            u8::from(self.containments),
            u8::from(self.transitive)
        )
    }
}

pub struct VertexRecord<'a>(pub &'a SeqItem);

impl fmt::Display for VertexRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VT\t{}\t{}", self.0.id, self.0.seq)
    }
}

pub struct EdgeRecord<'a>(pub &'a Overlap);

impl fmt::Display for EdgeRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ED\t{}", self.0)
    }
}
