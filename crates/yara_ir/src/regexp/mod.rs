//! Regexp pattern units (`/ab.*c{2,4}/i`).

/// A single character-class member.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassItem {
    Char(char),
    Range(char, char),
    /// A shorthand escape such as `\d`, `\w`, `\s` (and negated forms).
    Shorthand(char),
}

/// A repetition operator applied to the preceding unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepetitionOp {
    Star,
    Plus,
    Optional,
    Range { min: u32, max: Option<u32> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegexpError {
    #[error("repetition bound {min} exceeds upper bound {max}")]
    InvalidRange { min: u32, max: u32 },
}

impl RepetitionOp {
    pub fn range(min: u32, max: Option<u32>) -> Result<Self, RegexpError> {
        if let Some(max) = max {
            if min > max {
                return Err(RegexpError::InvalidRange { min, max });
            }
        }
        Ok(RepetitionOp::Range { min, max })
    }
}

/// One unit of a regexp pattern body.
#[derive(Clone, Debug, PartialEq)]
pub enum RegexpUnit {
    Text(String),
    AnyChar,
    StartAnchor,
    EndAnchor,
    WordBoundary { negated: bool },
    Class { negated: bool, items: Vec<ClassItem> },
    Group { capturing: bool, body: Box<RegexpUnit> },
    Concat(Vec<RegexpUnit>),
    Alternation(Vec<RegexpUnit>),
    /// A repetition operator applied to `unit`. `greedy` is `false` when the
    /// operator is followed by a trailing `?` (lazy matching).
    Repetition { unit: Box<RegexpUnit>, op: RepetitionOp, greedy: bool },
}

impl RegexpUnit {
    #[must_use]
    pub fn repeat(self, op: RepetitionOp, greedy: bool) -> Self {
        RegexpUnit::Repetition { unit: Box::new(self), op, greedy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range_builds() {
        assert!(RepetitionOp::range(2, Some(4)).is_ok());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = RepetitionOp::range(5, Some(2)).unwrap_err();
        assert_eq!(err, RegexpError::InvalidRange { min: 5, max: 2 });
    }

    #[test]
    fn unbounded_range_has_no_upper_check() {
        assert!(RepetitionOp::range(2, None).is_ok());
    }

    #[test]
    fn repeat_defaults_can_be_lazy() {
        let unit = RegexpUnit::AnyChar.repeat(RepetitionOp::Star, false);
        match unit {
            RegexpUnit::Repetition { greedy, .. } => assert!(!greedy),
            _ => panic!("expected Repetition"),
        }
    }
}
