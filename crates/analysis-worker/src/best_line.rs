//! Principal line selection among multi-PV candidates.

use crate::engine::CandidateLine;

/// Pick the strongest candidate for the side to move.
///
/// Stable sort on the evaluation order, strongest first, so equal
/// evaluations keep the engine's slot order. `None` for an empty answer.
pub fn select_best_line(mut lines: Vec<CandidateLine>) -> Option<CandidateLine> {
    lines.sort_by(|a, b| b.evaluation.cmp(&a.evaluation));
    lines.into_iter().next()
}
