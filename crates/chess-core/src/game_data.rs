use serde::{Deserialize, Serialize};

/// Seven-tag-roster style metadata read from a PGN header block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHeaders {
    pub white: Option<String>,
    pub black: Option<String>,
    pub result: Option<String>, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub white_elo: Option<u16>,
    pub black_elo: Option<u16>,
    pub setup: bool,
    pub fen: Option<String>,
}

impl GameHeaders {
    /// Record a single `[Name "value"]` pair. Unknown tags are ignored.
    pub fn set(&mut self, name: &[u8], value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match name {
            b"White" => self.white = Some(value.to_string()),
            b"Black" => self.black = Some(value.to_string()),
            b"Result" => self.result = Some(value.to_string()),
            b"Date" => self.date = Some(value.to_string()),
            b"WhiteElo" => self.white_elo = value.parse().ok(),
            b"BlackElo" => self.black_elo = value.parse().ok(),
            b"SetUp" => self.setup = value == "1",
            b"FEN" => self.fen = Some(value.to_string()),
            _ => {}
        }
    }
}
