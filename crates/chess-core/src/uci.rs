//! Engine move notation helpers.

use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::Chess;

/// Convert a UCI move line played from `position` to space-separated SAN.
/// e.g. "g1f3 b8c6 f1b5" → "Nf3 Nc6 Bb5"
///
/// Rendering stops at the first token that is not a legal move.
pub fn uci_line_to_san<S: AsRef<str>>(position: &Chess, uci_moves: &[S]) -> String {
    let mut pos = position.clone();
    let mut moves = Vec::with_capacity(uci_moves.len());

    for uci_str in uci_moves {
        let uci_move: UciMove = match uci_str.as_ref().parse() {
            Ok(m) => m,
            Err(_) => break,
        };
        let legal_move = match uci_move.to_move(&pos) {
            Ok(m) => m,
            Err(_) => break,
        };
        moves.push(SanPlus::from_move_and_play_unchecked(&mut pos, legal_move).to_string());
    }

    moves.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uci_line_to_san() {
        let pos = Chess::default();
        let line = ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"];
        assert_eq!(uci_line_to_san(&pos, &line), "e4 e5 Nf3 Nc6 Bb5");
    }

    #[test]
    fn test_uci_line_stops_at_illegal_move() {
        let pos = Chess::default();
        let line = ["e2e4", "e2e4", "g1f3"];
        assert_eq!(uci_line_to_san(&pos, &line), "e4");
    }

    #[test]
    fn test_uci_line_marks_mate() {
        let pos = Chess::default();
        let line = ["f2f3", "e7e5", "g2g4", "d8h4"];
        assert_eq!(uci_line_to_san(&pos, &line), "f3 e5 g4 Qh4#");
    }
}
