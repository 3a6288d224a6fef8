//! Validation and routing of inferred overlaps into output streams.

use std::io::Write;

use log::warn;
use serde::Serialize;

use crate::asqg::{EdgeRecord, HeaderRecord, VertexRecord};
use crate::error::{OverlapError, Result};
use crate::overlap::Overlap;
use crate::read_table::SeqItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapClass {
    Containment,
    Proper,
}

/// Decide whether an overlap is a containment, a proper prefix/suffix join,
/// or geometry that cannot be a valid overlap.
pub fn classify(overlap: &Overlap) -> Result<OverlapClass> {
    let a = overlap.coord_a();
    let b = overlap.coord_b();

    if a.is_contained() || b.is_contained() {
        return Ok(OverlapClass::Containment);
    }

    if !a.is_extreme() || !b.is_extreme() {
        return Err(OverlapError::InvalidOverlapGeometry {
            overlap: overlap.to_string(),
            reason: "non-extreme",
        });
    }

    let proper = if overlap.is_rc() {
        a.is_left_extreme() == b.is_left_extreme() && a.is_right_extreme() == b.is_right_extreme()
    } else {
        a.is_left_extreme() != b.is_left_extreme() && a.is_right_extreme() != b.is_right_extreme()
    };

    if proper {
        Ok(OverlapClass::Proper)
    } else {
        Err(OverlapError::InvalidOverlapGeometry {
            overlap: overlap.to_string(),
            reason: "improper",
        })
    }
}

/// Per-run counts of what happened to each inferred overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RouteStats {
    pub edges: usize,
    pub containments: usize,
    pub proper: usize,
    pub dropped: usize,
}

/// Destination for inferred overlaps.
pub trait OverlapSink {
    fn route(&mut self, overlap: &Overlap) -> Result<()>;

    fn stats(&self) -> RouteStats;

    fn flush(&mut self) -> Result<()>;
}

/// Writes every overlap as an ASQG edge; containments are valid edges here.
pub struct AsqgSink<W: Write> {
    writer: W,
    stats: RouteStats,
}

impl<W: Write> AsqgSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stats: RouteStats::default(),
        }
    }

    pub fn write_header(&mut self, header: &HeaderRecord) -> Result<()> {
        header.write(&mut self.writer)
    }

    pub fn write_vertex(&mut self, read: &SeqItem) -> Result<()> {
        writeln!(self.writer, "{}", VertexRecord(read))?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OverlapSink for AsqgSink<W> {
    fn route(&mut self, overlap: &Overlap) -> Result<()> {
        writeln!(self.writer, "{}", EdgeRecord(overlap))?;
        self.stats.edges += 1;
        if overlap.is_containment() {
            self.stats.containments += 1;
        } else {
            self.stats.proper += 1;
        }
        Ok(())
    }

    fn stats(&self) -> RouteStats {
        self.stats
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Splits containments and proper overlaps into separate files and drops
/// anything that fails [`classify`].
pub struct LegacySink<W: Write> {
    containments: W,
    overlaps: W,
    stats: RouteStats,
}

impl<W: Write> LegacySink<W> {
    pub fn new(containments: W, overlaps: W) -> Self {
        Self {
            containments,
            overlaps,
            stats: RouteStats::default(),
        }
    }

    /// Returns `(containments, overlaps)`.
    pub fn into_inner(self) -> (W, W) {
        (self.containments, self.overlaps)
    }
}

impl<W: Write> OverlapSink for LegacySink<W> {
    fn route(&mut self, overlap: &Overlap) -> Result<()> {
        match classify(overlap) {
            Ok(OverlapClass::Containment) => {
                writeln!(self.containments, "{overlap}")?;
                self.stats.containments += 1;
            }
            Ok(OverlapClass::Proper) => {
                writeln!(self.overlaps, "{overlap}")?;
                self.stats.proper += 1;
            }
            Err(err) if err.is_recoverable() => {
                warn!("Skipping overlap: {err}");
                self.stats.dropped += 1;
                return Ok(());
            }
            Err(err) => return Err(err),
        }
        self.stats.edges += 1;
        Ok(())
    }

    fn stats(&self) -> RouteStats {
        self.stats
    }

    fn flush(&mut self) -> Result<()> {
        self.containments.flush()?;
        self.overlaps.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::SeqCoord;

    fn overlap(a: SeqCoord, b: SeqCoord, is_rc: bool) -> Overlap {
        Overlap::new("y".into(), a, "x".into(), b, is_rc, 0)
    }

    fn geometry_error(result: Result<OverlapClass>) -> &'static str {
        match result {
            Err(OverlapError::InvalidOverlapGeometry { reason, .. }) => reason,
            other => panic!("expected geometry error, got {other:?}"),
        }
    }

    #[test]
    fn same_strand_properness() {
        let proper = overlap(SeqCoord::new(5, 9, 10), SeqCoord::new(0, 4, 10), false);
        assert_eq!(classify(&proper).unwrap(), OverlapClass::Proper);

        let both_suffixes = overlap(SeqCoord::new(5, 9, 10), SeqCoord::new(5, 9, 10), false);
        assert_eq!(geometry_error(classify(&both_suffixes)), "improper");
    }

    #[test]
    fn opposite_strand_properness() {
        let proper = overlap(SeqCoord::new(5, 9, 10), SeqCoord::new(5, 9, 10), true);
        assert_eq!(classify(&proper).unwrap(), OverlapClass::Proper);

        let suffix_prefix = overlap(SeqCoord::new(5, 9, 10), SeqCoord::new(0, 4, 10), true);
        assert_eq!(geometry_error(classify(&suffix_prefix)), "improper");
    }

    #[test]
    fn containment_skips_properness() {
        let contained = overlap(SeqCoord::new(0, 4, 5), SeqCoord::new(3, 7, 10), true);
        assert_eq!(classify(&contained).unwrap(), OverlapClass::Containment);
    }

    #[test]
    fn internal_match_is_non_extreme() {
        let internal = overlap(SeqCoord::new(2, 6, 10), SeqCoord::new(0, 4, 10), false);
        assert_eq!(geometry_error(classify(&internal)), "non-extreme");
    }

    #[test]
    fn legacy_sink_splits_streams_and_counts_drops() {
        let mut sink = LegacySink::new(Vec::new(), Vec::new());
        sink.route(&overlap(SeqCoord::new(0, 4, 5), SeqCoord::new(0, 4, 8), false))
            .unwrap();
        sink.route(&overlap(SeqCoord::new(5, 9, 10), SeqCoord::new(0, 4, 10), false))
            .unwrap();
        sink.route(&overlap(SeqCoord::new(2, 6, 10), SeqCoord::new(0, 4, 10), false))
            .unwrap();

        let stats = sink.stats();
        assert_eq!(stats.containments, 1);
        assert_eq!(stats.proper, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.edges, 2);

        let (ctn, ovr) = sink.into_inner();
        assert_eq!(String::from_utf8(ctn).unwrap(), "y x 0 4 5 0 4 8 0 0\n");
        assert_eq!(String::from_utf8(ovr).unwrap(), "y x 5 9 10 0 4 10 0 0\n");
    }

    #[test]
    fn asqg_sink_keeps_everything() {
        let mut sink = AsqgSink::new(Vec::new());
        sink.route(&overlap(SeqCoord::new(0, 4, 5), SeqCoord::new(0, 4, 8), false))
            .unwrap();
        sink.route(&overlap(SeqCoord::new(2, 6, 10), SeqCoord::new(0, 4, 10), false))
            .unwrap();
        assert_eq!(sink.stats().edges, 2);
        assert_eq!(sink.stats().containments, 1);
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l.starts_with("ED\t")));
    }
}
