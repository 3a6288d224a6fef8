//! Hit-file records produced by the search stage.
//!
//! One line per query read:
//! `query numBlocks { lower upper overlapLen numDiff flags }*`

use std::fmt;
use std::str::FromStr;

use crate::error::{OverlapError, Result};

const BLOCK_FIELDS: usize = 5;

/// Strand configuration of a block, serialized as a two-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AlignFlags {
    pub query_rev: bool,
    pub target_rev: bool,
}

impl AlignFlags {
    const QUERY_REV: u8 = 0b01;
    const TARGET_REV: u8 = 0b10;

    pub fn new(query_rev: bool, target_rev: bool) -> Self {
        Self {
            query_rev,
            target_rev,
        }
    }

    pub fn encode(self) -> u8 {
        let mut bits = 0;
        if self.query_rev {
            bits |= Self::QUERY_REV;
        }
        if self.target_rev {
            bits |= Self::TARGET_REV;
        }
        bits
    }

    pub fn decode(bits: u8) -> Option<Self> {
        if bits & !(Self::QUERY_REV | Self::TARGET_REV) != 0 {
            return None;
        }
        Some(Self {
            query_rev: bits & Self::QUERY_REV != 0,
            target_rev: bits & Self::TARGET_REV != 0,
        })
    }

    /// The two reads lie on opposite strands.
    pub fn is_reverse_complement(self) -> bool {
        self.query_rev != self.target_rev
    }
}

/// A suffix-array interval whose reads all share a prefix with the query's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapBlock {
    pub lower: usize,
    pub upper: usize,
    pub overlap_len: usize,
    pub num_diff: usize,
    pub flags: AlignFlags,
}

impl OverlapBlock {
    pub fn positions(&self) -> std::ops::RangeInclusive<usize> {
        self.lower..=self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HitRecord {
    pub query_index: usize,
    pub blocks: Vec<OverlapBlock>,
}

impl HitRecord {
    pub fn new(query_index: usize) -> Self {
        Self {
            query_index,
            blocks: Vec::new(),
        }
    }

    /// Parse one hit-file line. Any deviation from the format is fatal.
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(OverlapError::malformed(line, "missing header fields"));
        }

        let field = |idx: usize, name: &str| -> Result<usize> {
            fields[idx].parse::<usize>().map_err(|_| {
                OverlapError::malformed(line, format!("{name} is not a number: {:?}", fields[idx]))
            })
        };

        let query_index = field(0, "query index")?;
        let num_blocks = field(1, "block count")?;
        let expected = num_blocks
            .checked_mul(BLOCK_FIELDS)
            .and_then(|n| n.checked_add(2))
            .ok_or_else(|| OverlapError::malformed(line, "block count overflow"))?;
        if fields.len() != expected {
            return Err(OverlapError::malformed(
                line,
                format!("expected {expected} fields, found {}", fields.len()),
            ));
        }

        let mut blocks = Vec::with_capacity(num_blocks);
        for block in 0..num_blocks {
            let base = 2 + block * BLOCK_FIELDS;
            let lower = field(base, "interval lower")?;
            let upper = field(base + 1, "interval upper")?;
            if lower > upper {
                return Err(OverlapError::malformed(line, "empty interval"));
            }
            let overlap_len = field(base + 2, "overlap length")?;
            if overlap_len == 0 {
                return Err(OverlapError::malformed(line, "zero-length overlap"));
            }
            let num_diff = field(base + 3, "difference count")?;
            let flags = fields[base + 4]
                .parse::<u8>()
                .ok()
                .and_then(AlignFlags::decode)
                .ok_or_else(|| {
                    OverlapError::malformed(line, format!("bad flags {:?}", fields[base + 4]))
                })?;
            blocks.push(OverlapBlock {
                lower,
                upper,
                overlap_len,
                num_diff,
                flags,
            });
        }

        Ok(Self {
            query_index,
            blocks,
        })
    }
}

impl FromStr for HitRecord {
    type Err = OverlapError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for HitRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.query_index, self.blocks.len())?;
        for block in &self.blocks {
            write!(
                f,
                " {} {} {} {} {}",
                block.lower,
                block.upper,
                block.overlap_len,
                block.num_diff,
                block.flags.encode()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HitRecord {
        HitRecord {
            query_index: 7,
            blocks: vec![
                OverlapBlock {
                    lower: 3,
                    upper: 5,
                    overlap_len: 40,
                    num_diff: 0,
                    flags: AlignFlags::new(false, true),
                },
                OverlapBlock {
                    lower: 11,
                    upper: 11,
                    overlap_len: 31,
                    num_diff: 2,
                    flags: AlignFlags::new(true, true),
                },
            ],
        }
    }

    #[test]
    fn serialized_line_parses_back() {
        let hit = sample();
        let line = hit.to_string();
        assert_eq!(line, "7 2 3 5 40 0 2 11 11 31 2 3");
        assert_eq!(HitRecord::parse(&line).unwrap(), hit);
    }

    #[test]
    fn parses_record_without_blocks() {
        let hit: HitRecord = "4 0".parse().unwrap();
        assert_eq!(hit, HitRecord::new(4));
    }

    #[test]
    fn flags_cover_all_strand_configurations() {
        for bits in 0..4u8 {
            let flags = AlignFlags::decode(bits).unwrap();
            assert_eq!(flags.encode(), bits);
        }
        assert!(AlignFlags::decode(4).is_none());
        assert!(AlignFlags::new(true, false).is_reverse_complement());
        assert!(!AlignFlags::new(true, true).is_reverse_complement());
    }

    #[test]
    fn rejects_malformed_lines() {
        let bad = [
            "",
            "12",
            "1 1 0 3 20 0",
            "1 1 0 3 20 0 1 9",
            "1 x 0 3 20 0 1",
            "1 1 5 3 20 0 1",
            "1 1 0 3 20 0 8",
            "1 1 0 3 0 0 1",
            "1 1 0 -3 20 0 1",
        ];
        for line in bad {
            let err = HitRecord::parse(line).unwrap_err();
            assert!(
                matches!(err, OverlapError::MalformedHitRecord { .. }),
                "{line:?} gave {err}"
            );
        }
    }
}
