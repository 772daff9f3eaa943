//! Engine evaluations: centipawn scores and forced mates.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreUnit {
    #[serde(rename = "cp")]
    Centipawn,
    #[serde(rename = "mate")]
    Mate,
}

impl ScoreUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreUnit::Centipawn => "cp",
            ScoreUnit::Mate => "mate",
        }
    }
}

/// A position's score from the perspective of the side to move.
///
/// Serialized as `"<value> <unit>"`, e.g. `"35 cp"` or `"-2 mate"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Evaluation {
    pub value: i32,
    pub unit: ScoreUnit,
}

impl Evaluation {
    pub fn centipawns(value: i32) -> Self {
        Self {
            value,
            unit: ScoreUnit::Centipawn,
        }
    }

    pub fn mate(value: i32) -> Self {
        Self {
            value,
            unit: ScoreUnit::Mate,
        }
    }

    pub fn is_mate(&self) -> bool {
        self.unit == ScoreUnit::Mate
    }

    /// Mate for the side to move (`mate 0` included).
    pub fn is_favorable_mate(&self) -> bool {
        self.is_mate() && self.value >= 0
    }
}

/// Strength order for the side to move: favorable mates (sooner first), then
/// centipawns (higher first), then unfavorable mates (later first).
impl Ord for Evaluation {
    fn cmp(&self, other: &Self) -> Ordering {
        use ScoreUnit::*;
        match (self.unit, other.unit) {
            (Centipawn, Centipawn) => self.value.cmp(&other.value),
            (Mate, Mate) => match (self.is_favorable_mate(), other.is_favorable_mate()) {
                (true, true) => other.value.cmp(&self.value),
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.value.cmp(&other.value),
            },
            (Mate, Centipawn) => {
                if self.is_favorable_mate() {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (Centipawn, Mate) => other.cmp(self).reverse(),
        }
    }
}

impl PartialOrd for Evaluation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid evaluation: {0:?}")]
pub struct ParseEvaluationError(pub String);

impl FromStr for Evaluation {
    type Err = ParseEvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(value), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseEvaluationError(s.to_string()));
        };
        let value: i32 = value
            .parse()
            .map_err(|_| ParseEvaluationError(s.to_string()))?;
        match unit {
            "cp" => Ok(Self::centipawns(value)),
            "mate" => Ok(Self::mate(value)),
            _ => Err(ParseEvaluationError(s.to_string())),
        }
    }
}

impl From<Evaluation> for String {
    fn from(eval: Evaluation) -> Self {
        eval.to_string()
    }
}

impl TryFrom<String> for Evaluation {
    type Error = ParseEvaluationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
