//! Conversion of suffix-array hits into canonical read-pair overlaps.

use std::fmt;

use crate::coord::SeqCoord;
use crate::error::{OverlapError, Result};
use crate::hits::{HitRecord, OverlapBlock};
use crate::index::{ReadIndex, Strand, StrandPair};
use crate::read_table::{ReadId, ReadTable};

/// The aligned region on each of the two reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub coord: [SeqCoord; 2],
    pub is_rc: bool,
    pub num_diff: usize,
}

impl Match {
    /// Either read is covered end to end.
    pub fn is_containment(&self) -> bool {
        self.coord[0].is_contained() || self.coord[1].is_contained()
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.coord[0],
            self.coord[1],
            u8::from(self.is_rc),
            self.num_diff
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub id: [ReadId; 2],
    pub matched: Match,
}

impl Overlap {
    pub fn new(
        id_a: ReadId,
        coord_a: SeqCoord,
        id_b: ReadId,
        coord_b: SeqCoord,
        is_rc: bool,
        num_diff: usize,
    ) -> Self {
        Self {
            id: [id_a, id_b],
            matched: Match {
                coord: [coord_a, coord_b],
                is_rc,
                num_diff,
            },
        }
    }

    pub fn coord_a(&self) -> &SeqCoord {
        &self.matched.coord[0]
    }

    pub fn coord_b(&self) -> &SeqCoord {
        &self.matched.coord[1]
    }

    pub fn is_rc(&self) -> bool {
        self.matched.is_rc
    }

    pub fn is_containment(&self) -> bool {
        self.matched.is_containment()
    }
}

impl fmt::Display for Overlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.id[0], self.id[1], self.matched)
    }
}

/// Expand every block of `hit` into overlaps, keeping one emission per true overlap.
///
/// Each overlap can be rediscovered from either read and, for containments,
/// from both strands of the query. Only the copy with the lexicographically
/// larger read first is kept, and containments found from the reversed query
/// are dropped.
pub fn infer_overlaps<I: ReadIndex>(
    hit: &HitRecord,
    tables: &StrandPair<ReadTable>,
    indices: &StrandPair<I>,
) -> Result<Vec<Overlap>> {
    let mut overlaps = Vec::new();
    for block in &hit.blocks {
        infer_block(hit.query_index, block, tables, indices, &mut overlaps)?;
    }
    Ok(overlaps)
}

fn infer_block<I: ReadIndex>(
    query_index: usize,
    block: &OverlapBlock,
    tables: &StrandPair<ReadTable>,
    indices: &StrandPair<I>,
    out: &mut Vec<Overlap>,
) -> Result<()> {
    let strand = Strand::from_reversed(block.flags.target_rev);
    let table = tables.get(strand);
    let index = indices.get(strand);
    let query = table.read(query_index)?;
    let ol = block.overlap_len;

    for position in block.positions() {
        let target = table.read(index.resolve(position)?)?;
        if query.id == target.id {
            continue;
        }
        if ol > query.len() || ol > target.len() {
            return Err(OverlapError::IndexConsistency(format!(
                "overlap of {ol} bases between {} ({} bp) and {} ({} bp)",
                query.id,
                query.len(),
                target.id,
                target.len()
            )));
        }

        let s1 = query.len() - ol;
        let mut coord_a = SeqCoord::new(s1, s1 + ol - 1, query.len());
        // A prefix/suffix match starts the target at its first base.
        let mut coord_b = SeqCoord::new(0, ol - 1, target.len());
        if block.flags.query_rev {
            coord_a.flip();
        }
        if block.flags.target_rev {
            coord_b.flip();
        }

        let overlap = Overlap::new(
            query.id.clone(),
            coord_a,
            target.id.clone(),
            coord_b,
            block.flags.is_reverse_complement(),
            block.num_diff,
        );

        if overlap.id[0] < overlap.id[1] || (overlap.is_containment() && block.flags.query_rev) {
            continue;
        }
        out.push(overlap);
    }
    Ok(())
}
