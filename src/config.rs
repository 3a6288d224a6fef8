use std::path::{Path, PathBuf};

use crate::error::{OverlapError, Result};

/// Default minimum overlap length, in bases.
pub const DEFAULT_MIN_OVERLAP: usize = 45;

/// Representation the overlaps are persisted in, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// A single gzipped ASQG graph with every overlap as an edge.
    #[default]
    Asqg,
    /// Separate containment (`.ctn`) and proper overlap (`.ovr`) text files.
    Legacy,
}

/// Configuration options that govern an overlap run.
#[derive(Debug, Clone)]
pub struct OverlapConfig {
    /// Reads the index and hits were built from.
    pub reads_file: PathBuf,
    /// Base path for every file the run reads or writes.
    pub prefix: Option<PathBuf>,
    /// Minimum overlap length reported by the search.
    pub min_overlap: usize,
    /// Maximum error rate; recorded in the graph header.
    pub error_rate: f64,
    /// Forced seed length, 0 when unset.
    pub seed_length: i64,
    /// Forced seed stride, 0 when unset.
    pub seed_stride: i64,
    /// Only irreducible edges are kept downstream.
    pub irreducible_only: bool,
    /// Worker count for hit computation.
    pub threads: usize,
    pub output: OutputMode,
}

impl Default for OverlapConfig {
    fn default() -> Self {
        Self {
            reads_file: PathBuf::new(),
            prefix: None,
            min_overlap: DEFAULT_MIN_OVERLAP,
            error_rate: 0.0,
            seed_length: 0,
            seed_stride: 0,
            irreducible_only: false,
            threads: 1,
            output: OutputMode::default(),
        }
    }
}

impl OverlapConfig {
    pub fn new(reads_file: impl Into<PathBuf>) -> Self {
        Self {
            reads_file: reads_file.into(),
            ..Self::default()
        }
    }

    /// Check the options and fill in derived defaults.
    pub fn validated(mut self) -> Result<Self> {
        if self.threads == 0 {
            return Err(OverlapError::InvalidConfig(
                "invalid number of threads: 0".to_string(),
            ));
        }
        if self.min_overlap == 0 {
            return Err(OverlapError::InvalidConfig(
                "minimum overlap must be positive".to_string(),
            ));
        }
        if self.reads_file.as_os_str().is_empty() {
            return Err(OverlapError::InvalidConfig("missing reads file".to_string()));
        }

        if !(self.error_rate > 0.0) {
            self.error_rate = 0.0;
        }
        if self.seed_length < 0 {
            self.seed_length = 0;
        }
        if self.seed_length > 0 && self.seed_stride <= 0 {
            self.seed_stride = self.seed_length;
        }
        if self.prefix.is_none() {
            self.prefix = Some(strip_filename(&self.reads_file));
        }
        Ok(self)
    }

    /// Output base path: the explicit prefix or the reads file without extensions.
    pub fn prefix(&self) -> PathBuf {
        self.prefix
            .clone()
            .unwrap_or_else(|| strip_filename(&self.reads_file))
    }

    /// `prefix` with `ext` appended verbatim.
    pub fn path_with(&self, ext: &str) -> PathBuf {
        let mut path = self.prefix().into_os_string();
        path.push(ext);
        PathBuf::from(path)
    }
}

/// Drop a trailing compression extension and then the format extension.
fn strip_filename(path: &Path) -> PathBuf {
    let mut stripped = path.to_path_buf();
    let is_compressed = stripped
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false);
    if is_compressed {
        stripped.set_extension("");
    }
    stripped.set_extension("");
    stripped
}
