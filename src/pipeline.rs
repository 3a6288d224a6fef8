//! End-to-end overlap run: header, hit computation, streaming conversion.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::asqg::{HeaderRecord, ASQG_EXT};
use crate::config::{OutputMode, OverlapConfig};
use crate::error::{OverlapError, Result};
use crate::hits::HitRecord;
use crate::index::{PrefixIndex, ReadIndex, StrandPair};
use crate::overlap::infer_overlaps;
use crate::read_table::ReadTable;
use crate::router::{AsqgSink, LegacySink, OverlapSink, RouteStats};
use crate::search::{compute_hits_parallel, compute_hits_serial, HitFiles, HitSearch};

pub const GZIP_EXT: &str = ".gz";
pub const OVR_EXT: &str = ".ovr";
pub const CTN_EXT: &str = ".ctn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    HeaderWritten,
    HitsComputed,
    EdgesStreamed,
    Finalized,
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub reads: usize,
    pub hit_files: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub search_seconds: f64,
    pub reads_per_second: f64,
    pub routed: RouteStats,
}

pub struct OverlapPipeline {
    config: OverlapConfig,
    stage: Stage,
}

impl OverlapPipeline {
    pub fn new(config: OverlapConfig) -> Result<Self> {
        Ok(Self {
            config: config.validated()?,
            stage: Stage::Init,
        })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage went backwards");
        debug!("{:?} -> {:?}", self.stage, next);
        self.stage = next;
    }

    /// Run every stage to completion. Any error aborts the run.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.stage != Stage::Init {
            return Err(OverlapError::InvalidConfig(format!(
                "pipeline already ran (stage {:?})",
                self.stage
            )));
        }
        let reads_file = self.config.reads_file.clone();
        info!("Loading reads from {}", reads_file.display());
        let tables = StrandPair::from_forward(ReadTable::load(&reads_file)?)?;
        let indices = StrandPair::<PrefixIndex>::build(&tables);
        info!("Indexed {} reads", tables.forward.len());
        for note in ignored_settings(&self.config) {
            warn!("{note}");
        }

        match self.config.output {
            OutputMode::Asqg => self.run_asqg(&tables, &indices),
            OutputMode::Legacy => self.run_legacy(&tables, &indices),
        }
    }

    fn run_asqg(
        &mut self,
        tables: &StrandPair<ReadTable>,
        indices: &StrandPair<PrefixIndex>,
    ) -> Result<RunSummary> {
        let asqg_path = self.config.path_with(&format!("{ASQG_EXT}{GZIP_EXT}"));
        let encoder = GzEncoder::new(BufWriter::new(create(&asqg_path)?), Compression::default());
        let mut sink = AsqgSink::new(encoder);

        let mut header = HeaderRecord::new(
            self.config.min_overlap,
            self.config.error_rate,
            self.config.reads_file.to_string_lossy(),
        );
        header.transitive = !self.config.irreducible_only;
        sink.write_header(&header)?;
        for read in tables.forward.iter() {
            sink.write_vertex(read)?;
        }
        self.advance(Stage::HeaderWritten);

        let (hits, search_seconds) = self.compute_hits(tables, indices)?;
        stream_hits(&hits.paths, tables, indices, &mut sink)?;
        self.advance(Stage::EdgesStreamed);

        sink.flush()?;
        let routed = sink.stats();
        let mut inner = sink
            .into_inner()
            .finish()
            .map_err(|e| OverlapError::file(&asqg_path, e))?;
        inner.flush().map_err(|e| OverlapError::file(&asqg_path, e))?;
        self.advance(Stage::Finalized);

        info!("Wrote {} edges to {}", routed.edges, asqg_path.display());
        Ok(summary(hits, vec![asqg_path], search_seconds, routed))
    }

    fn run_legacy(
        &mut self,
        tables: &StrandPair<ReadTable>,
        indices: &StrandPair<PrefixIndex>,
    ) -> Result<RunSummary> {
        let ctn_path = self.config.path_with(CTN_EXT);
        let ovr_path = self.config.path_with(OVR_EXT);
        let mut sink = LegacySink::new(
            BufWriter::new(create(&ctn_path)?),
            BufWriter::new(create(&ovr_path)?),
        );
        self.advance(Stage::HeaderWritten);

        let (hits, search_seconds) = self.compute_hits(tables, indices)?;
        info!("Converting suffix array interval hits to overlaps");
        stream_hits(&hits.paths, tables, indices, &mut sink)?;
        self.advance(Stage::EdgesStreamed);

        sink.flush()?;
        let routed = sink.stats();
        drop(sink);
        self.advance(Stage::Finalized);

        if routed.dropped > 0 {
            warn!("Dropped {} overlaps with invalid geometry", routed.dropped);
        }
        info!(
            "Wrote {} containments to {} and {} overlaps to {}",
            routed.containments,
            ctn_path.display(),
            routed.proper,
            ovr_path.display()
        );
        Ok(summary(hits, vec![ctn_path, ovr_path], search_seconds, routed))
    }

    fn compute_hits(
        &mut self,
        tables: &StrandPair<ReadTable>,
        indices: &StrandPair<PrefixIndex>,
    ) -> Result<(HitFiles, f64)> {
        let search = HitSearch::new(tables, indices, self.config.min_overlap);
        let prefix = self.config.prefix();
        let timer = Instant::now();
        let hits = if self.config.threads <= 1 {
            info!("Starting serial-mode overlap computation");
            compute_hits_serial(&search, &prefix)?
        } else {
            info!(
                "Starting parallel-mode overlap computation with {} threads",
                self.config.threads
            );
            compute_hits_parallel(&search, self.config.threads, &prefix)?
        };
        let secs = timer.elapsed().as_secs_f64();
        info!(
            "Aligned {} sequences in {:.3}s ({:.1} sequences/s)",
            hits.reads,
            secs,
            throughput(hits.reads, secs)
        );
        self.advance(Stage::HitsComputed);
        Ok((hits, secs))
    }
}

/// Parse every hit file line by line, infer overlaps and route them into `sink`.
pub fn stream_hits<I: ReadIndex, S: OverlapSink>(
    paths: &[PathBuf],
    tables: &StrandPair<ReadTable>,
    indices: &StrandPair<I>,
    sink: &mut S,
) -> Result<()> {
    for path in paths {
        info!("Parsing file {}", path.display());
        let reader = BufReader::new(File::open(path).map_err(|e| OverlapError::file(path, e))?);
        for (line_no, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| OverlapError::file(path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let hit = HitRecord::parse(&line).map_err(|err| {
                error!("{}:{}: unreadable hit record", path.display(), line_no + 1);
                err
            })?;
            for overlap in infer_overlaps(&hit, tables, indices)? {
                sink.route(&overlap)?;
            }
        }
    }
    Ok(())
}

/// Settings the exact search accepts but does not act on.
fn ignored_settings(config: &OverlapConfig) -> Vec<String> {
    let mut notes = Vec::new();
    if config.seed_length > 0 {
        notes.push(format!(
            "Exact search ignores seed length {} and stride {}",
            config.seed_length, config.seed_stride
        ));
    }
    if config.error_rate > 0.0 {
        notes.push(format!(
            "Exact search ignores error rate {}; it is only recorded in the header",
            config.error_rate
        ));
    }
    notes
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|e| OverlapError::file(path, e))
}

fn throughput(count: usize, secs: f64) -> f64 {
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}

fn summary(hits: HitFiles, outputs: Vec<PathBuf>, secs: f64, routed: RouteStats) -> RunSummary {
    RunSummary {
        reads: hits.reads,
        reads_per_second: throughput(hits.reads, secs),
        hit_files: hits.paths,
        outputs,
        search_seconds: secs,
        routed,
    }
}
