//! PGN replay: turns a stored game into the positions it passes through.
//!
//! Parsing is done by `pgn-reader`; every SAN token is then resolved against the
//! current position with shakmaty, so an illegal move is reported at the ply
//! where it occurs.

use std::ops::ControlFlow;
use std::vec;

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position};
use thiserror::Error;

use crate::game_data::GameHeaders;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplayError {
    #[error("PGN could not be read: {0}")]
    Parse(String),

    #[error("PGN contains no game")]
    NoGame,

    #[error("game does not start from the standard position: {0}")]
    NonStandardStart(String),

    #[error("illegal move {san} at ply {ply}")]
    IllegalMove { ply: usize, san: String },
}

/// One half-move of a replayed game.
#[derive(Debug, Clone)]
pub struct ReplayedPly {
    /// 1-based ply index
    pub ply: usize,
    /// The move as played, normalized SAN with check/mate suffix
    pub san: String,
    /// Position after the move
    pub position: Chess,
    /// FEN of `position`
    pub fen: String,
    /// Side to move in `position`
    pub side_to_move: Color,
}

/// Lazy, one-shot walk over the moves of a game.
///
/// Each element depends on the board left by the previous one, so the
/// iterator stops for good after the first illegal move. Call [`replay`]
/// again to start over.
#[derive(Debug)]
pub struct Replay {
    headers: GameHeaders,
    moves: vec::IntoIter<SanPlus>,
    position: Chess,
    ply: usize,
    total: usize,
    halted: bool,
}

impl Replay {
    pub fn headers(&self) -> &GameHeaders {
        &self.headers
    }

    /// Number of SAN tokens in the movetext (plies the game claims to have).
    pub fn total_plies(&self) -> usize {
        self.total
    }
}

impl Iterator for Replay {
    type Item = Result<ReplayedPly, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let san_plus = self.moves.next()?;
        self.ply += 1;

        let mv = match san_plus.san.to_move(&self.position) {
            Ok(mv) => mv,
            Err(_) => {
                self.halted = true;
                return Some(Err(ReplayError::IllegalMove {
                    ply: self.ply,
                    san: san_plus.to_string(),
                }));
            }
        };

        let san = SanPlus::from_move_and_play_unchecked(&mut self.position, mv);

        Some(Ok(ReplayedPly {
            ply: self.ply,
            san: san.to_string(),
            fen: position_fen(&self.position),
            side_to_move: self.position.turn(),
            position: self.position.clone(),
        }))
    }
}

/// Parse `pgn` and prepare a replay from the standard initial position.
pub fn replay(pgn: &str) -> Result<Replay, ReplayError> {
    let mut reader = Reader::new(pgn.as_bytes());
    let game = reader
        .read_game(&mut GameCollector)
        .map_err(|e| ReplayError::Parse(e.to_string()))?
        .ok_or(ReplayError::NoGame)?;

    if game.headers.setup {
        if let Some(ref fen) = game.headers.fen {
            if !is_standard_start(fen) {
                return Err(ReplayError::NonStandardStart(fen.clone()));
            }
        }
    }

    let total = game.moves.len();
    Ok(Replay {
        headers: game.headers,
        moves: game.moves.into_iter(),
        position: Chess::default(),
        ply: 0,
        total,
        halted: false,
    })
}

/// Whether a FEN tag describes the initial position, move counters aside.
fn is_standard_start(fen: &str) -> bool {
    fen.parse::<Fen>()
        .ok()
        .and_then(|fen| fen.into_position::<Chess>(CastlingMode::Standard).ok())
        .is_some_and(|pos| position_fen(&pos) == STANDARD_START_FEN)
}

/// FEN of a position, en passant square only when a capture is legal.
pub fn position_fen(position: &Chess) -> String {
    Fen::from_position(position, EnPassantMode::Legal).to_string()
}

/// Headers and raw SAN tokens of the first game in a PGN.
#[derive(Debug, Default)]
struct CollectedGame {
    headers: GameHeaders,
    moves: Vec<SanPlus>,
}

struct GameCollector;

impl Visitor for GameCollector {
    type Tags = GameHeaders;
    type Movetext = CollectedGame;
    type Output = CollectedGame;

    fn begin_tags(&mut self) -> ControlFlow<CollectedGame, GameHeaders> {
        ControlFlow::Continue(GameHeaders::default())
    }

    fn tag(
        &mut self,
        tags: &mut GameHeaders,
        name: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<CollectedGame> {
        tags.set(name, &value.decode_utf8_lossy());
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: GameHeaders) -> ControlFlow<CollectedGame, CollectedGame> {
        ControlFlow::Continue(CollectedGame {
            headers: tags,
            moves: Vec::new(),
        })
    }

    fn san(&mut self, game: &mut CollectedGame, san_plus: SanPlus) -> ControlFlow<CollectedGame> {
        game.moves.push(san_plus);
        ControlFlow::Continue(())
    }

    /// Side lines are not part of the game.
    fn begin_variation(&mut self, _game: &mut CollectedGame) -> ControlFlow<CollectedGame, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn end_game(&mut self, game: CollectedGame) -> CollectedGame {
        game
    }
}
