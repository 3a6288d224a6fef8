use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use overlapper::{OutputMode, OverlapConfig, OverlapPipeline, DEFAULT_MIN_OVERLAP};

/// Compute pairwise overlaps between all the sequences in READS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// FASTA/FASTQ (optionally gzipped) reads file
    reads: PathBuf,

    /// Number of worker threads for the overlap search
    #[arg(short = 't', long, default_value_t = 1)]
    threads: usize,

    /// Maximum error rate allowed to consider two sequences aligned
    #[arg(short = 'e', long, default_value_t = 0.0, allow_negative_numbers = true)]
    error_rate: f64,

    /// Minimum overlap required between two reads
    #[arg(short = 'm', long, default_value_t = DEFAULT_MIN_OVERLAP)]
    min_overlap: usize,

    /// Use PREFIX instead of the reads filename for input/output files
    #[arg(short = 'p', long)]
    prefix: Option<PathBuf>,

    /// Only output the irreducible edges for each node
    #[arg(short = 'i', long)]
    irreducible: bool,

    /// Force the seed length (0 = unset)
    #[arg(short = 'l', long, default_value_t = 0, allow_negative_numbers = true)]
    seed_length: i64,

    /// Force the seed stride; defaults to the seed length
    #[arg(short = 's', long, default_value_t = 0, allow_negative_numbers = true)]
    seed_stride: i64,

    /// Write split containment (.ctn) and overlap (.ovr) files instead of ASQG
    #[arg(long)]
    raw: bool,

    /// Optional JSON file for the run summary
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Verbose/info output
    #[arg(long, short = 'v', alias = "info")]
    verbose: bool,

    /// Debug output
    #[arg(long)]
    debug: bool,

    /// Trace output
    #[arg(long)]
    trace: bool,
}

fn main() {
    let args = Args::parse();
    let log_level = if args.trace {
        "trace"
    } else if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(error) = run(args) {
        eprintln!("Overlap failed: {error:?}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = OverlapConfig {
        reads_file: args.reads.clone(),
        prefix: args.prefix,
        min_overlap: args.min_overlap,
        error_rate: args.error_rate,
        seed_length: args.seed_length,
        seed_stride: args.seed_stride,
        irreducible_only: args.irreducible,
        threads: args.threads,
        output: if args.raw {
            OutputMode::Legacy
        } else {
            OutputMode::Asqg
        },
    };

    let mut pipeline = OverlapPipeline::new(config).context("Invalid options")?;
    info!("reads: {}", args.reads.display());
    let summary = pipeline
        .run()
        .with_context(|| format!("Failed to compute overlaps for {}", args.reads.display()))?;

    if let Some(path) = args.summary_json {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writeln!(file, "{}", serde_json::to_string_pretty(&summary)?)?;
        info!("Run summary written to {}", path.display());
    }
    Ok(())
}
