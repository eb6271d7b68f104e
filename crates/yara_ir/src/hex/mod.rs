//! Hex-string pattern units (`{ AA ?? ( BB | CC ) }`).

/// One unit of a hex-string pattern body.
#[derive(Clone, Debug, PartialEq)]
pub enum HexUnit {
    /// A fully specified byte, e.g. `AB`.
    Byte(u8),
    /// High nibble fixed, low nibble wildcard, e.g. `A?`.
    WildcardLow(u8),
    /// Low nibble fixed, high nibble wildcard, e.g. `?A`.
    WildcardHigh(u8),
    /// Both nibbles wildcard, `??`.
    Wildcard,
    /// A jump, `[n]`, `[n-m]`, or `[n-]` (unbounded, `max = None`).
    Jump { min: u32, max: Option<u32> },
    /// An alternation, `( seq1 | seq2 | ... )`.
    Alternation(Vec<Vec<HexUnit>>),
}

/// Length contribution of a run of hex units, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LengthRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl LengthRange {
    #[must_use]
    pub fn exact(n: u32) -> Self {
        LengthRange { min: n, max: Some(n) }
    }

    #[must_use]
    pub fn unbounded_from(n: u32) -> Self {
        LengthRange { min: n, max: None }
    }

    #[must_use]
    pub fn add(self, other: LengthRange) -> Self {
        LengthRange {
            min: self.min + other.min,
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            },
        }
    }

    #[must_use]
    pub fn union(self, other: LengthRange) -> Self {
        LengthRange {
            min: self.min.min(other.min),
            max: match (self.max, other.max) {
                (Some(a), Some(b)) => Some(a.max(b)),
                _ => None,
            },
        }
    }
}

impl HexUnit {
    #[must_use]
    pub fn length(&self) -> LengthRange {
        match self {
            HexUnit::Byte(_) | HexUnit::WildcardLow(_) | HexUnit::WildcardHigh(_) | HexUnit::Wildcard => {
                LengthRange::exact(1)
            }
            HexUnit::Jump { min, max } => LengthRange { min: *min, max: *max },
            HexUnit::Alternation(branches) => branches
                .iter()
                .map(|branch| sequence_length(branch))
                .reduce(LengthRange::union)
                .unwrap_or(LengthRange::exact(0)),
        }
    }
}

#[must_use]
pub fn sequence_length(units: &[HexUnit]) -> LengthRange {
    units.iter().fold(LengthRange::exact(0), |acc, u| acc.add(u.length()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_bytes_sum_lengths() {
        let seq = vec![HexUnit::Byte(0xAB), HexUnit::Wildcard, HexUnit::WildcardLow(0xA)];
        assert_eq!(sequence_length(&seq), LengthRange::exact(3));
    }

    #[test]
    fn jump_with_unbounded_max_propagates() {
        let seq = vec![HexUnit::Byte(0xAB), HexUnit::Jump { min: 2, max: None }];
        let len = sequence_length(&seq);
        assert_eq!(len.min, 3);
        assert_eq!(len.max, None);
    }

    #[test]
    fn alternation_takes_union_of_branch_lengths() {
        let alt = HexUnit::Alternation(vec![
            vec![HexUnit::Byte(1), HexUnit::Byte(2)],
            vec![HexUnit::Byte(1)],
        ]);
        assert_eq!(alt.length(), LengthRange { min: 1, max: Some(2) });
    }
}
