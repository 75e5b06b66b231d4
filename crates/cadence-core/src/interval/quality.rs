//! Response quality grade (0-5)

use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, Result};

/// Lowest grade that counts as a correct recall
pub const PASSING_QUALITY: u8 = 3;

/// Highest grade
pub const MAX_QUALITY: u8 = 5;

/// Recall quality on the classic 0-5 scale.
///
/// | Grade | Meaning                                  |
/// |-------|------------------------------------------|
/// | 0     | Complete blackout                        |
/// | 1     | Wrong, but the answer felt familiar      |
/// | 2     | Wrong, but the answer seemed easy after  |
/// | 3     | Correct with serious difficulty          |
/// | 4     | Correct after hesitation                 |
/// | 5     | Perfect recall                           |
///
/// Values above 5 cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Complete blackout
    pub const BLACKOUT: Quality = Quality(0);
    /// Perfect recall
    pub const PERFECT: Quality = Quality(MAX_QUALITY);

    /// Create a grade, rejecting anything above 5.
    pub fn new(value: u8) -> Result<Self> {
        if value <= MAX_QUALITY {
            Ok(Self(value))
        } else {
            Err(CadenceError::InvalidInput(format!(
                "quality must be within 0..=5, got {}",
                value
            )))
        }
    }

    /// Parse a grade from a signed integer (boundary helper for hosts).
    pub fn from_i64(value: i64) -> Result<Self> {
        u8::try_from(value)
            .map_err(|_| {
                CadenceError::InvalidInput(format!("quality must be within 0..=5, got {}", value))
            })
            .and_then(Self::new)
    }

    /// Raw grade value
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Grade as f64 for formulas
    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Grade normalized to [0, 1]
    #[inline]
    pub fn normalized(self) -> f64 {
        self.as_f64() / f64::from(MAX_QUALITY)
    }

    /// Quality >= 3 counts as correct
    #[inline]
    pub fn is_correct(self) -> bool {
        self.0 >= PASSING_QUALITY
    }

    /// All six grades, lowest first
    pub fn all() -> [Quality; 6] {
        [
            Quality(0),
            Quality(1),
            Quality(2),
            Quality(3),
            Quality(4),
            Quality(5),
        ]
    }
}

impl TryFrom<u8> for Quality {
    type Error = CadenceError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(q: Quality) -> u8 {
        q.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
