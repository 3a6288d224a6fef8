//! Exact suffix/prefix search producing hit files.
//!
//! For every query read, both strands of the query are matched against both
//! strands of every other read: a suffix of the query of length `l` matching
//! the first `l` bases of a target yields one index interval per length.
//! Each target is reported once per strand configuration, at its longest
//! overlap.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{OverlapError, Result};
use crate::hits::{AlignFlags, HitRecord, OverlapBlock};
use crate::index::{PrefixIndex, ReadIndex, Strand, StrandPair};
use crate::read_table::ReadTable;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const HITS_EXT: &str = ".hits";

const STRANDS: [Strand; 2] = [Strand::Forward, Strand::Reverse];

/// Shared, read-only view of the reads and their indices.
#[derive(Clone, Copy)]
pub struct HitSearch<'a> {
    tables: &'a StrandPair<ReadTable>,
    indices: &'a StrandPair<PrefixIndex>,
    min_overlap: usize,
}

impl<'a> HitSearch<'a> {
    pub fn new(
        tables: &'a StrandPair<ReadTable>,
        indices: &'a StrandPair<PrefixIndex>,
        min_overlap: usize,
    ) -> Self {
        Self {
            tables,
            indices,
            min_overlap: min_overlap.max(1),
        }
    }

    pub fn num_reads(&self) -> usize {
        self.tables.forward.len()
    }

    /// All overlap blocks for one query read.
    pub fn search(&self, query_index: usize) -> Result<HitRecord> {
        let mut hit = HitRecord::new(query_index);
        for query_strand in STRANDS {
            let query = self.tables.get(query_strand).read(query_index)?;
            for target_strand in STRANDS {
                let flags = AlignFlags::new(query_strand.is_reverse(), target_strand.is_reverse());
                self.search_strand(&query.seq, target_strand, flags, &mut hit.blocks)?;
            }
        }
        Ok(hit)
    }

    fn search_strand(
        &self,
        query: &str,
        target_strand: Strand,
        flags: AlignFlags,
        blocks: &mut Vec<OverlapBlock>,
    ) -> Result<()> {
        let table = self.tables.get(target_strand);
        let index = self.indices.get(target_strand);
        let mut seen: HashSet<usize> = HashSet::new();

        for overlap_len in (self.min_overlap..=query.len()).rev() {
            let suffix = &query[query.len() - overlap_len..];
            let Some((lower, upper)) = index.prefix_interval(table, suffix) else {
                continue;
            };

            // Split the interval into runs of targets without a longer overlap.
            let mut run_start: Option<usize> = None;
            for position in lower..=upper {
                let fresh = seen.insert(index.resolve(position)?);
                match (fresh, run_start) {
                    (true, None) => run_start = Some(position),
                    (false, Some(start)) => {
                        blocks.push(block(start, position - 1, overlap_len, flags));
                        run_start = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = run_start {
                blocks.push(block(start, upper, overlap_len, flags));
            }
        }
        Ok(())
    }

    /// Search `reads` and write one line per query with at least one block.
    pub fn write_hits(&self, reads: Range<usize>, path: &Path) -> Result<usize> {
        let file = File::create(path).map_err(|e| OverlapError::file(path, e))?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;
        for query_index in reads {
            let hit = self.search(query_index)?;
            if !hit.blocks.is_empty() {
                writeln!(writer, "{hit}").map_err(|e| OverlapError::file(path, e))?;
            }
            count += 1;
        }
        writer.flush().map_err(|e| OverlapError::file(path, e))?;
        debug!("Wrote hits for {count} reads to {}", path.display());
        Ok(count)
    }
}

fn block(lower: usize, upper: usize, overlap_len: usize, flags: AlignFlags) -> OverlapBlock {
    OverlapBlock {
        lower,
        upper,
        overlap_len,
        num_diff: 0,
        flags,
    }
}

/// Hit files produced by one dispatch and the number of reads searched.
#[derive(Debug, Clone, Default)]
pub struct HitFiles {
    pub paths: Vec<PathBuf>,
    pub reads: usize,
}

/// Search every read on the calling thread into `<prefix>.hits`.
pub fn compute_hits_serial(search: &HitSearch<'_>, prefix: &Path) -> Result<HitFiles> {
    let path = hits_path(prefix, None);
    let reads = search.write_hits(0..search.num_reads(), &path)?;
    Ok(HitFiles {
        paths: vec![path],
        reads,
    })
}

/// Split the reads into `threads` contiguous partitions, each searched by its
/// own worker into `<prefix>-thread<N>.hits`. Returns once every worker has
/// finished; the first worker error is returned.
pub fn compute_hits_parallel(
    search: &HitSearch<'_>,
    threads: usize,
    prefix: &Path,
) -> Result<HitFiles> {
    let jobs: Vec<(Range<usize>, PathBuf)> = partition(search.num_reads(), threads)
        .into_iter()
        .enumerate()
        .map(|(worker, range)| (range, hits_path(prefix, Some(worker))))
        .collect();
    info!("Dispatching {} hit workers", jobs.len());

    #[cfg(feature = "parallel")]
    let counts: Vec<usize> = {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| OverlapError::InvalidConfig(format!("thread pool: {e}")))?;
        pool.install(|| {
            jobs.par_iter()
                .map(|(range, path)| search.write_hits(range.clone(), path))
                .collect::<Result<Vec<usize>>>()
        })?
    };

    #[cfg(not(feature = "parallel"))]
    let counts: Vec<usize> = jobs
        .iter()
        .map(|(range, path)| search.write_hits(range.clone(), path))
        .collect::<Result<Vec<usize>>>()?;

    Ok(HitFiles {
        paths: jobs.into_iter().map(|(_, path)| path).collect(),
        reads: counts.into_iter().sum(),
    })
}

fn hits_path(prefix: &Path, worker: Option<usize>) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    if let Some(worker) = worker {
        name.push(format!("-thread{worker}"));
    }
    name.push(HITS_EXT);
    PathBuf::from(name)
}

/// Contiguous, near-equal partitions of `0..n`; never more than `n` parts.
fn partition(n: usize, parts: usize) -> Vec<Range<usize>> {
    let parts = parts.clamp(1, n.max(1));
    let base = n / parts;
    let extra = n % parts;
    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for part in 0..parts {
        let len = base + usize::from(part < extra);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}
