//! End-to-end runs over small read sets.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use overlapper::{
    infer_overlaps, AlignFlags, HitRecord, OutputMode, OverlapBlock, OverlapConfig,
    OverlapPipeline, PrefixIndex, ReadTable, StrandPair,
};

const THREE_READS: &str = ">R0\nACGTACGT\n>R1\nACGTTTTT\n>R2\nACGTA\n";

fn write_reads(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("reads.fa");
    std::fs::write(&path, body).unwrap();
    path
}

fn gunzip(path: &Path) -> String {
    let mut text = String::new();
    flate2::read::GzDecoder::new(File::open(path).unwrap())
        .read_to_string(&mut text)
        .unwrap();
    text
}

fn edges(asqg: &str) -> BTreeSet<String> {
    asqg.lines()
        .filter_map(|line| line.strip_prefix("ED\t"))
        .map(str::to_string)
        .collect()
}

fn expected_edges() -> BTreeSet<String> {
    [
        "R1 R0 0 3 8 0 3 8 1 0",
        "R1 R0 0 3 8 4 7 8 0 0",
        "R2 R0 0 4 5 0 4 8 0 0",
        "R2 R0 0 4 5 3 7 8 1 0",
        "R2 R0 0 3 5 0 3 8 1 0",
        "R2 R1 0 3 5 0 3 8 1 0",
        "R2 R0 0 3 5 4 7 8 0 0",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[test]
fn hit_for_lowest_read_excludes_self_and_non_canonical_pairs() {
    let tables = StrandPair::from_forward(ReadTable::from_pairs([
        ("R0", "ACGTACGT"),
        ("R1", "ACGTTTTT"),
        ("R2", "ACGTA"),
    ]))
    .unwrap();
    let indices = StrandPair::<PrefixIndex>::build(&tables);
    let (lower, upper) = indices
        .forward
        .prefix_interval(&tables.forward, "ACGT")
        .unwrap();
    assert_eq!((lower, upper), (0, 2));

    let block = |query_rev| OverlapBlock {
        lower,
        upper,
        overlap_len: 4,
        num_diff: 0,
        flags: AlignFlags::new(query_rev, false),
    };
    let from_r0 = HitRecord {
        query_index: 0,
        blocks: vec![block(false)],
    };
    assert!(infer_overlaps(&from_r0, &tables, &indices).unwrap().is_empty());

    let from_r2 = HitRecord {
        query_index: 2,
        blocks: vec![block(true)],
    };
    let found: Vec<String> = infer_overlaps(&from_r2, &tables, &indices)
        .unwrap()
        .iter()
        .map(|o| o.to_string())
        .collect();
    assert_eq!(
        found,
        vec!["R2 R0 0 3 5 0 3 8 1 0", "R2 R1 0 3 5 0 3 8 1 0"]
    );
}

#[test]
fn asqg_run_emits_canonical_edge_set() {
    let dir = tempfile::tempdir().unwrap();
    let reads = write_reads(dir.path(), THREE_READS);
    let config = OverlapConfig {
        min_overlap: 4,
        ..OverlapConfig::new(&reads)
    };
    let summary = OverlapPipeline::new(config).unwrap().run().unwrap();

    let text = gunzip(&summary.outputs[0]);
    assert_eq!(text.lines().filter(|l| l.starts_with("VT\t")).count(), 3);
    assert_eq!(edges(&text), expected_edges());
    assert_eq!(summary.routed.edges, 7);
    assert_eq!(summary.routed.containments, 2);
    assert!(text
        .lines()
        .filter_map(|l| l.strip_prefix("ED\t"))
        .all(|e| !e.starts_with("R0 R0") && !e.starts_with("R1 R1") && !e.starts_with("R2 R2")));
}

#[test]
fn parallel_run_matches_serial_run() {
    let dir = tempfile::tempdir().unwrap();
    let reads = write_reads(dir.path(), THREE_READS);
    let config = OverlapConfig {
        min_overlap: 4,
        threads: 3,
        prefix: Some(dir.path().join("threaded")),
        ..OverlapConfig::new(&reads)
    };
    let summary = OverlapPipeline::new(config).unwrap().run().unwrap();
    assert_eq!(summary.hit_files.len(), 3);
    assert!(summary.hit_files.iter().all(|p| p.exists()));
    assert_eq!(edges(&gunzip(&summary.outputs[0])), expected_edges());
}

#[test]
fn irreducible_run_clears_transitive_tag() {
    let dir = tempfile::tempdir().unwrap();
    let reads = write_reads(dir.path(), THREE_READS);
    let config = OverlapConfig {
        min_overlap: 4,
        error_rate: 0.04,
        irreducible_only: true,
        ..OverlapConfig::new(&reads)
    };
    let summary = OverlapPipeline::new(config).unwrap().run().unwrap();
    let text = gunzip(&summary.outputs[0]);
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("HT\tVN:i:1\tER:f:0.04\tOL:i:4\tIN:Z:"));
    assert!(header.ends_with("CN:i:1\tTE:i:0"));
}

#[test]
fn legacy_run_splits_containments_from_overlaps() {
    let dir = tempfile::tempdir().unwrap();
    let reads = write_reads(dir.path(), THREE_READS);
    let config = OverlapConfig {
        min_overlap: 4,
        output: OutputMode::Legacy,
        ..OverlapConfig::new(&reads)
    };
    let summary = OverlapPipeline::new(config).unwrap().run().unwrap();
    assert_eq!(summary.outputs.len(), 2);

    let ctn = std::fs::read_to_string(&summary.outputs[0]).unwrap();
    let ovr = std::fs::read_to_string(&summary.outputs[1]).unwrap();
    let ctn: BTreeSet<&str> = ctn.lines().collect();
    assert_eq!(
        ctn,
        BTreeSet::from(["R2 R0 0 4 5 0 4 8 0 0", "R2 R0 0 4 5 3 7 8 1 0"])
    );
    assert_eq!(ovr.lines().count(), 5);
    assert_eq!(summary.routed.dropped, 0);

    let all: BTreeSet<String> = ctn
        .iter()
        .map(|s| s.to_string())
        .chain(ovr.lines().map(str::to_string))
        .collect();
    assert_eq!(all, expected_edges());
}

#[test]
fn corrupt_hit_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let hits = dir.path().join("corrupt.hits");
    std::fs::write(&hits, "1 1 0 2 4 0 3\n2 1 0 two 4 0 1\n").unwrap();
    let tables = StrandPair::from_forward(ReadTable::from_pairs([
        ("R0", "ACGTACGT"),
        ("R1", "ACGTTTTT"),
        ("R2", "ACGTA"),
    ]))
    .unwrap();
    let indices = StrandPair::<PrefixIndex>::build(&tables);
    let mut sink = overlapper::AsqgSink::new(Vec::new());
    let err = overlapper::stream_hits(&[hits], &tables, &indices, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        overlapper::OverlapError::MalformedHitRecord { .. }
    ));
}

#[test]
fn zero_threads_is_rejected() {
    let config = OverlapConfig {
        threads: 0,
        ..OverlapConfig::new("reads.fa")
    };
    assert!(OverlapPipeline::new(config).is_err());
}
