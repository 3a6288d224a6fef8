use std::borrow::Borrow;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use bio::alphabets::dna;
use bio::io::{fasta, fastq};
use flate2::read::MultiGzDecoder;

use crate::error::{OverlapError, Result};

/// Read name. Canonical edge order compares these lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadId(Arc<str>);

impl ReadId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReadId {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for ReadId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for ReadId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqItem {
    pub id: ReadId,
    pub seq: String,
}

impl SeqItem {
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

/// Reads in input order, addressed by their position.
#[derive(Debug, Clone, Default)]
pub struct ReadTable {
    reads: Vec<SeqItem>,
}

impl ReadTable {
    /// Build a table from `(name, sequence)` pairs.
    pub fn from_pairs<I, N, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<ReadId>,
        S: Into<String>,
    {
        let reads = pairs
            .into_iter()
            .map(|(id, seq)| SeqItem {
                id: id.into(),
                seq: seq.into(),
            })
            .collect();
        Self { reads }
    }

    /// Load FASTA, FASTQ (optionally gzipped) or one-sequence-per-line text.
    pub fn load(path: &Path) -> Result<Self> {
        let reader = open_reader(path)?;
        let reads_err = |reason: String| OverlapError::Reads {
            path: path.to_path_buf(),
            reason,
        };

        let mut reads = Vec::new();
        match infer_format(path) {
            SequenceFormat::Fastq => {
                for record in fastq::Reader::new(reader).records() {
                    let record = record.map_err(|e| reads_err(e.to_string()))?;
                    let seq = uppercase_sequence(record.seq()).map_err(reads_err)?;
                    reads.push(SeqItem {
                        id: record.id().into(),
                        seq,
                    });
                }
            }
            SequenceFormat::Fasta => {
                for record in fasta::Reader::new(reader).records() {
                    let record = record.map_err(|e| reads_err(e.to_string()))?;
                    let seq = uppercase_sequence(record.seq()).map_err(reads_err)?;
                    reads.push(SeqItem {
                        id: record.id().into(),
                        seq,
                    });
                }
            }
            SequenceFormat::Lines => {
                for line in reader.lines() {
                    let line = line.map_err(|e| OverlapError::file(path, e))?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    reads.push(SeqItem {
                        id: reads.len().to_string().into(),
                        seq: trimmed.to_ascii_uppercase(),
                    });
                }
            }
        }

        if let Some(empty) = reads.iter().find(|r| r.is_empty()) {
            return Err(reads_err(format!("read {} has no bases", empty.id)));
        }
        if let Some(bad) = reads.iter().find(|r| !r.seq.is_ascii()) {
            return Err(reads_err(format!("read {} has non-ASCII bases", bad.id)));
        }
        Ok(Self { reads })
    }

    /// The same reads, reverse-complemented, keeping ids and positions.
    pub fn reverse_complement(&self) -> Result<Self> {
        let reads = self
            .reads
            .iter()
            .map(|read| {
                let rc = dna::revcomp(read.seq.as_bytes());
                let seq = String::from_utf8(rc).map_err(|_| {
                    OverlapError::IndexConsistency(format!(
                        "reverse complement of {} is not UTF-8",
                        read.id
                    ))
                })?;
                Ok(SeqItem {
                    id: read.id.clone(),
                    seq,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { reads })
    }

    pub fn get(&self, index: usize) -> Option<&SeqItem> {
        self.reads.get(index)
    }

    /// Lookup that treats a missing read as a broken index.
    pub fn read(&self, index: usize) -> Result<&SeqItem> {
        self.reads.get(index).ok_or_else(|| {
            OverlapError::IndexConsistency(format!(
                "read index {index} out of range ({} reads)",
                self.reads.len()
            ))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeqItem> {
        self.reads.iter()
    }

    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceFormat {
    Fastq,
    Fasta,
    Lines,
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
        .unwrap_or(false)
}

fn infer_format(path: &Path) -> SequenceFormat {
    let mut ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "gz" || ext == "bgz" {
        ext = path
            .file_stem()
            .and_then(|stem| Path::new(stem).extension())
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default();
    }

    match ext.as_str() {
        "fastq" | "fq" => SequenceFormat::Fastq,
        "fasta" | "fa" | "fna" => SequenceFormat::Fasta,
        _ => SequenceFormat::Lines,
    }
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| OverlapError::file(path, e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn uppercase_sequence(bytes: &[u8]) -> std::result::Result<String, String> {
    String::from_utf8(bytes.to_ascii_uppercase())
        .map_err(|_| "encountered non-UTF-8 symbols in sequence data".to_string())
}
