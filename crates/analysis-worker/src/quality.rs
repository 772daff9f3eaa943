//! Move quality from the evaluations on either side of a move.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::score::{Evaluation, ScoreUnit};

/// Classification thresholds (centipawn swing, first match wins)
const THRESHOLDS: [(i32, MoveQuality); 4] = [
    (0, MoveQuality::Excellent),
    (70, MoveQuality::Good),
    (150, MoveQuality::Inaccuracy),
    (300, MoveQuality::Mistake),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveQuality {
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl MoveQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveQuality::Excellent => "excellent",
            MoveQuality::Good => "good",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        }
    }
}

impl fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(MoveQuality::Excellent),
            "good" => Ok(MoveQuality::Good),
            "inaccuracy" => Ok(MoveQuality::Inaccuracy),
            "mistake" => Ok(MoveQuality::Mistake),
            "blunder" => Ok(MoveQuality::Blunder),
            other => Err(format!("unknown move quality: {other}")),
        }
    }
}

/// Classify a move from the evaluations around it.
///
/// `before` is the mover's evaluation of the position the move was played
/// in; `after` is the engine's evaluation of the resulting position, i.e.
/// from the opponent's side.
pub fn classify_move(before: Evaluation, after: Evaluation) -> MoveQuality {
    // Widened so extreme engine scores cannot overflow
    let before_value = i64::from(before.value);
    let val = -i64::from(after.value);

    match (before.unit, after.unit) {
        (ScoreUnit::Centipawn, ScoreUnit::Centipawn) => THRESHOLDS
            .iter()
            .find(|(threshold, _)| before_value < val + i64::from(*threshold))
            .map(|(_, label)| *label)
            .unwrap_or(MoveQuality::Blunder),
        // Mate distance seen by the mover must shrink
        (ScoreUnit::Mate, ScoreUnit::Mate) => {
            if val < before_value {
                MoveQuality::Good
            } else {
                MoveQuality::Inaccuracy
            }
        }
        // A mate appearing or vanishing is the largest possible swing
        _ => MoveQuality::Blunder,
    }
}
