pub mod game_data;
pub mod pgn;
pub mod uci;

pub use game_data::GameHeaders;
pub use pgn::{replay, Replay, ReplayError, ReplayedPly};
pub use uci::uci_line_to_san;
