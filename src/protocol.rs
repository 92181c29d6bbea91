//! The wire protocol: typed messages for the realtime channel.
//!
//! Messages travel as JSON envelopes of the form
//! `{"event": "...", "data": {...}}`, with event and field names matching
//! the arbiter's. Fields a message may legitimately omit are `Option`s;
//! anything that fails to decode is dropped by the channel reader, so a
//! malformed payload can never crash the session.

use engine::board::Board;
use engine::constants::{Color, Piece};
use engine::score::EndReason;
use serde::{Deserialize, Serialize};

/// Messages the client sends to the arbiter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame {
        room_code: String,
        username: String,
    },
    MakeMove {
        room_code: String,
        from_row: u8,
        from_col: u8,
        to_row: u8,
        to_col: u8,
        player_color: Color,
    },
    /// PvE only: the local side forfeited its turn on timeout and the
    /// engine should move.
    SkipTurn {
        room_code: String,
    },
    /// PvP: report that `loser`'s clock ran out. The arbiter answers
    /// with the terminal `game_over`.
    Timeout {
        room_code: String,
        loser: Color,
    },
    OfferDraw {
        room_code: String,
    },
    AcceptDraw {
        room_code: String,
    },
    Resign {
        room_code: String,
        player_color: Color,
    },
    LeaveGame {
        room_code: String,
    },
    ChatMessage {
        room_code: String,
        username: String,
        message: String,
    },
}

/// Messages the arbiter pushes to the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState {
        board: Option<BoardSnapshot>,
        players: Option<Players>,
    },
    MoveMade(MovePayload),
    MoveError {
        message: String,
    },
    GameOver {
        winner: Option<Color>,
        reason: EndReason,
    },
    PlayerJoined {
        username: String,
    },
    PlayerLeft {
        #[serde(default)]
        message: Option<String>,
    },
    DrawOffered,
    TimeSync {
        red_time: Option<u32>,
        black_time: Option<u32>,
    },
    ChatMessage {
        username: String,
        message: String,
    },
}

/// A confirmed move. The embedded snapshot is the authoritative board
/// *after* the move; local state is overwritten with it, never merged.
#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    pub from_row: u8,
    pub from_col: u8,
    pub to_row: u8,
    pub to_col: u8,
    pub player: Color,
    pub piece: Option<Piece>,
    pub captured: Option<Piece>,
    pub board: Option<BoardSnapshot>,
    #[serde(default)]
    pub is_ai: bool,
    /// Seconds the mover had left when the arbiter accepted the move.
    pub remaining_time: Option<u32>,
}

/// The arbiter's full board snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSnapshot {
    pub grid: Vec<Vec<Option<Piece>>>,
    pub turn: Color,
}

impl BoardSnapshot {
    /// `None` when the grid dimensions are off; the caller treats the
    /// whole message as a no-op.
    pub fn to_board(&self) -> Option<Board> {
        Board::from_grid(&self.grid)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Players {
    pub red: Option<PlayerInfo>,
    pub black: Option<PlayerInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerInfo {
    pub name: Option<String>,
}
