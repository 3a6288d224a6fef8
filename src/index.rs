//! Position-to-read resolution over a sorted read index.
//!
//! The search stage reports matches as intervals of index positions; every
//! position names exactly one read. [`PrefixIndex`] is the in-memory index
//! used by this crate: reads sorted lexicographically, so that all reads
//! sharing a prefix occupy one contiguous interval.

use crate::error::{OverlapError, Result};
use crate::read_table::ReadTable;

/// Which strand of the reads an index or table was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    pub fn is_reverse(self) -> bool {
        matches!(self, Self::Reverse)
    }
}

/// Resolves an index position to the position of a read in its read table.
pub trait ReadIndex: Send + Sync {
    fn resolve(&self, position: usize) -> Result<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A forward and a reverse instance of the same kind of structure.
#[derive(Debug, Clone)]
pub struct StrandPair<T> {
    pub forward: T,
    pub reverse: T,
}

impl<T> StrandPair<T> {
    pub fn new(forward: T, reverse: T) -> Self {
        Self { forward, reverse }
    }

    pub fn get(&self, strand: Strand) -> &T {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }
}

impl StrandPair<ReadTable> {
    /// Forward table plus its reverse complement.
    pub fn from_forward(forward: ReadTable) -> Result<Self> {
        let reverse = forward.reverse_complement()?;
        Ok(Self { forward, reverse })
    }
}

/// Reads of one table ordered lexicographically by sequence.
#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    order: Vec<usize>,
}

impl PrefixIndex {
    pub fn build(table: &ReadTable) -> Self {
        let mut order: Vec<usize> = (0..table.len()).collect();
        order.sort_by(|&a, &b| {
            let lhs = table.get(a).map(|r| r.seq.as_str());
            let rhs = table.get(b).map(|r| r.seq.as_str());
            lhs.cmp(&rhs).then(a.cmp(&b))
        });
        Self { order }
    }

    /// Inclusive interval of positions whose read starts with `pattern`.
    ///
    /// `table` must be the table this index was built from.
    pub fn prefix_interval(&self, table: &ReadTable, pattern: &str) -> Option<(usize, usize)> {
        let seq_at = |idx: usize| table.get(idx).map_or("", |r| r.seq.as_str());
        let lower = self.order.partition_point(|&idx| seq_at(idx) < pattern);
        // Reads carrying the prefix sort first among those not below it.
        let upper = lower
            + self.order[lower..].partition_point(|&idx| seq_at(idx).starts_with(pattern));
        if upper == lower {
            return None;
        }
        Some((lower, upper - 1))
    }
}

impl ReadIndex for PrefixIndex {
    fn resolve(&self, position: usize) -> Result<usize> {
        self.order.get(position).copied().ok_or_else(|| {
            OverlapError::IndexConsistency(format!(
                "index position {position} out of range ({} entries)",
                self.order.len()
            ))
        })
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

impl StrandPair<PrefixIndex> {
    pub fn build(tables: &StrandPair<ReadTable>) -> Self {
        Self {
            forward: PrefixIndex::build(&tables.forward),
            reverse: PrefixIndex::build(&tables.reverse),
        }
    }
}
