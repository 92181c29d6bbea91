//! Piece and color definitions shared by the board, the move generator
//! and the wire protocol.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Get the opponent of the current color.
    pub fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// Index into per-color tables (0 for Red, 1 for Black).
    pub fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Black => 1,
        }
    }
}

/// The seven piece kinds, tagged with the single-letter codes the wire
/// protocol uses for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PieceKind {
    #[serde(rename = "K")]
    General,
    #[serde(rename = "A")]
    Advisor,
    #[serde(rename = "E")]
    Elephant,
    #[serde(rename = "R")]
    Chariot,
    #[serde(rename = "N")]
    Horse,
    #[serde(rename = "C")]
    Cannon,
    #[serde(rename = "P")]
    Soldier,
}

impl PieceKind {
    pub fn code(self) -> char {
        match self {
            PieceKind::General => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'E',
            PieceKind::Chariot => 'R',
            PieceKind::Horse => 'N',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }

    /// Points awarded for capturing this piece, in tenths of a point.
    /// The General is uncounted: capturing it ends the game instead.
    pub fn capture_points(self) -> u32 {
        match self {
            PieceKind::General => 0,
            PieceKind::Advisor => 20,
            PieceKind::Elephant => 20,
            PieceKind::Chariot => 90,
            PieceKind::Horse => 40,
            PieceKind::Cannon => 45,
            PieceKind::Soldier => 10,
        }
    }
}

/// A piece on the board. Immutable once placed; moves and captures
/// replace board entries wholesale rather than mutating them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    #[serde(rename = "type")]
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Piece {
        Piece { kind, color }
    }
}
