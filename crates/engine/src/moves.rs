//! Move representation and coordinate notation.

use crate::board::{col_of, in_bounds, row_of, sq};

/// A move between two squares. Ephemeral: produced by move generation,
/// consumed by the proposal flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: usize,
    pub to: usize,
}

impl Move {
    pub fn new(from: usize, to: usize) -> Move {
        Move { from, to }
    }

    /// Coordinate notation, file letter then rank digit for each square:
    /// file `a`-`i` is the column, rank 9 is row 0. E.g. `h2e2`.
    pub fn to_coord_string(&self) -> String {
        format!("{}{}", square_name(self.from), square_name(self.to))
    }
}

/// Coordinate name of a single square, e.g. `h2`.
pub fn square_name(square: usize) -> String {
    format!(
        "{}{}",
        (col_of(square) as u8 + b'a') as char,
        9 - row_of(square)
    )
}

/// Parses a square like `h2` into a flat index.
pub fn parse_square(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    let file = chars.next()?;
    let rank = chars.next()?;
    if chars.next().is_some() || !file.is_ascii_lowercase() || !rank.is_ascii_digit() {
        return None;
    }
    let col = file as isize - 'a' as isize;
    let row = 9 - (rank as isize - '0' as isize);
    if in_bounds(row, col) {
        Some(sq(row as usize, col as usize))
    } else {
        None
    }
}

/// Parses a four-character move like `h2e2`.
pub fn parse_move(s: &str) -> Option<Move> {
    if s.len() != 4 {
        return None;
    }
    let from = parse_square(&s[..2])?;
    let to = parse_square(&s[2..])?;
    Some(Move::new(from, to))
}
