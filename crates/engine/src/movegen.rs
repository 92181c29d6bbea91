//! Candidate move generation, including pre-computed attack tables.
//!
//! Generation is purely geometric: palace and river confinement, the
//! elephant's eye, the horse's leg and the cannon's screen are all
//! honored, but exposure of one's own general is not examined. The
//! remote arbiter has the final say on every proposed move.

use crate::board::{in_bounds, sq, Bitboard, Board, COLS, ROWS, SQUARES, SQUARE_MASKS};
use crate::constants::{Color, PieceKind};
use crate::moves::Move;
use once_cell::sync::Lazy;

const NORTH: usize = 0;
const EAST: usize = 1;
const SOUTH: usize = 2;
const WEST: usize = 3;

/// Pre-computed destination tables for every square, initialised once
/// and then accessed globally.
struct AttackTables {
    general: [Bitboard; SQUARES],
    advisor: [Bitboard; SQUARES],
    elephant: [Bitboard; SQUARES],
    elephant_eyes: [[usize; SQUARES]; SQUARES],
    horse: [Bitboard; SQUARES],
    horse_legs: [[usize; SQUARES]; SQUARES],
    soldier: [[Bitboard; SQUARES]; 2],
    rays: [[Bitboard; SQUARES]; 4],
    red_half: Bitboard,
    black_half: Bitboard,
}

fn in_palace(row: isize, col: isize) -> bool {
    col >= 3 && col <= 5 && ((row >= 0 && row <= 2) || (row >= 7 && row <= 9))
}

impl AttackTables {
    fn new() -> Box<AttackTables> {
        let mut t = Box::new(AttackTables {
            general: [0; SQUARES],
            advisor: [0; SQUARES],
            elephant: [0; SQUARES],
            elephant_eyes: [[0; SQUARES]; SQUARES],
            horse: [0; SQUARES],
            horse_legs: [[0; SQUARES]; SQUARES],
            soldier: [[0; SQUARES]; 2],
            rays: [[0; SQUARES]; 4],
            red_half: 0,
            black_half: 0,
        });

        for r in 0..ROWS as isize {
            for c in 0..COLS as isize {
                let from = sq(r as usize, c as usize);

                // General: one orthogonal step, confined to a palace.
                for (dr, dc) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
                    let (nr, nc) = (r + dr, c + dc);
                    if in_palace(nr, nc) {
                        t.general[from] |= SQUARE_MASKS[sq(nr as usize, nc as usize)];
                    }
                }

                // Advisor: one diagonal step, same confinement.
                for (dr, dc) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
                    let (nr, nc) = (r + dr, c + dc);
                    if in_palace(nr, nc) {
                        t.advisor[from] |= SQUARE_MASKS[sq(nr as usize, nc as usize)];
                    }
                }

                // Elephant: two diagonal steps with an eye square halfway.
                // River confinement is a per-color mask applied at query time.
                for (dr, dc) in [(2, 2), (2, -2), (-2, 2), (-2, -2)] {
                    let (nr, nc) = (r + dr, c + dc);
                    if in_bounds(nr, nc) {
                        let to = sq(nr as usize, nc as usize);
                        t.elephant[from] |= SQUARE_MASKS[to];
                        t.elephant_eyes[from][to] =
                            sq((r + dr / 2) as usize, (c + dc / 2) as usize);
                    }
                }

                // Horse: eight offsets, each gated by its own leg square.
                for (dr, dc) in [
                    (2, 1),
                    (2, -1),
                    (-2, 1),
                    (-2, -1),
                    (1, 2),
                    (1, -2),
                    (-1, 2),
                    (-1, -2),
                ] {
                    let (nr, nc) = (r + dr, c + dc);
                    if in_bounds(nr, nc) {
                        let to = sq(nr as usize, nc as usize);
                        t.horse[from] |= SQUARE_MASKS[to];
                        let (leg_r, leg_c) = if dr.abs() == 2 {
                            (r + dr / 2, c)
                        } else {
                            (r, c + dc / 2)
                        };
                        t.horse_legs[from][to] = sq(leg_r as usize, leg_c as usize);
                    }
                }

                // Soldier: forward always, sideways only past the river,
                // never backward. Red advances toward row 0.
                if in_bounds(r - 1, c) {
                    t.soldier[Color::Red.index()][from] |= SQUARE_MASKS[sq(r as usize - 1, c as usize)];
                }
                if r <= 4 {
                    for nc in [c - 1, c + 1] {
                        if in_bounds(r, nc) {
                            t.soldier[Color::Red.index()][from] |= SQUARE_MASKS[sq(r as usize, nc as usize)];
                        }
                    }
                }
                if in_bounds(r + 1, c) {
                    t.soldier[Color::Black.index()][from] |= SQUARE_MASKS[sq(r as usize + 1, c as usize)];
                }
                if r >= 5 {
                    for nc in [c - 1, c + 1] {
                        if in_bounds(r, nc) {
                            t.soldier[Color::Black.index()][from] |= SQUARE_MASKS[sq(r as usize, nc as usize)];
                        }
                    }
                }
            }
        }

        // Rays for the sliding pieces.
        for from in 0..SQUARES {
            let (r, c) = (from / COLS, from % COLS);
            for i in (0..r).rev() {
                t.rays[NORTH][from] |= SQUARE_MASKS[sq(i, c)];
            }
            for i in (c + 1)..COLS {
                t.rays[EAST][from] |= SQUARE_MASKS[sq(r, i)];
            }
            for i in (r + 1)..ROWS {
                t.rays[SOUTH][from] |= SQUARE_MASKS[sq(i, c)];
            }
            for i in (0..c).rev() {
                t.rays[WEST][from] |= SQUARE_MASKS[sq(r, i)];
            }
        }

        // Half-board masks: rows 0-4 are Black's side, 5-9 are Red's.
        for i in 0..SQUARES / 2 {
            t.black_half |= SQUARE_MASKS[i];
        }
        for i in SQUARES / 2..SQUARES {
            t.red_half |= SQUARE_MASKS[i];
        }

        t
    }

    fn half(&self, color: Color) -> Bitboard {
        match color {
            Color::Red => self.red_half,
            Color::Black => self.black_half,
        }
    }
}

static TABLES: Lazy<Box<AttackTables>> = Lazy::new(AttackTables::new);

/// The nearest occupied square along a ray, by direction of travel.
fn closest_blocker(dir: usize, blockers: Bitboard) -> usize {
    match dir {
        NORTH | WEST => 127 - blockers.leading_zeros() as usize,
        _ => blockers.trailing_zeros() as usize,
    }
}

fn elephant_moves(from: usize, occupied: Bitboard, color: Color) -> Bitboard {
    let mut moves = 0;
    let mut targets = TABLES.elephant[from] & TABLES.half(color);
    while targets != 0 {
        let to = targets.trailing_zeros() as usize;
        if occupied & SQUARE_MASKS[TABLES.elephant_eyes[from][to]] == 0 {
            moves |= SQUARE_MASKS[to];
        }
        targets &= !SQUARE_MASKS[to];
    }
    moves
}

fn horse_moves(from: usize, occupied: Bitboard) -> Bitboard {
    let mut moves = 0;
    let mut targets = TABLES.horse[from];
    while targets != 0 {
        let to = targets.trailing_zeros() as usize;
        // The leg, not the destination, is what may be blocked.
        if occupied & SQUARE_MASKS[TABLES.horse_legs[from][to]] == 0 {
            moves |= SQUARE_MASKS[to];
        }
        targets &= !SQUARE_MASKS[to];
    }
    moves
}

/// Slides until the first occupied square, which is itself reachable
/// (capture or not is decided by the caller's own-color mask).
fn chariot_moves(from: usize, occupied: Bitboard) -> Bitboard {
    let mut moves = 0;
    for dir in [NORTH, EAST, SOUTH, WEST] {
        let ray = TABLES.rays[dir][from];
        let blockers = occupied & ray;
        if blockers == 0 {
            moves |= ray;
            continue;
        }
        let first = closest_blocker(dir, blockers);
        moves |= (ray ^ TABLES.rays[dir][first]) | SQUARE_MASKS[first];
    }
    moves
}

/// Quiet moves up to the screen; beyond exactly one screen, the next
/// occupied square is a capture target.
fn cannon_moves(from: usize, occupied: Bitboard) -> Bitboard {
    let mut moves = 0;
    for dir in [NORTH, EAST, SOUTH, WEST] {
        let ray = TABLES.rays[dir][from];
        let blockers = occupied & ray;
        if blockers == 0 {
            moves |= ray;
            continue;
        }
        let screen = closest_blocker(dir, blockers);
        moves |= (ray ^ TABLES.rays[dir][screen]) ^ SQUARE_MASKS[screen];
        let behind = blockers ^ SQUARE_MASKS[screen];
        if behind != 0 {
            moves |= SQUARE_MASKS[closest_blocker(dir, behind)];
        }
    }
    moves
}

/// Candidate destinations for the piece on `from`. An empty or
/// out-of-range square yields an empty set; destinations occupied by the
/// piece's own color are never included.
pub fn candidates(board: &Board, from: usize) -> Bitboard {
    let piece = match board.piece_at(from) {
        Some(piece) => piece,
        None => return 0,
    };
    let occupied = board.occupied();
    let raw = match piece.kind {
        PieceKind::General => TABLES.general[from],
        PieceKind::Advisor => TABLES.advisor[from],
        PieceKind::Elephant => elephant_moves(from, occupied, piece.color),
        PieceKind::Horse => horse_moves(from, occupied),
        PieceKind::Chariot => chariot_moves(from, occupied),
        PieceKind::Cannon => cannon_moves(from, occupied),
        PieceKind::Soldier => TABLES.soldier[piece.color.index()][from],
    };
    raw & !board.occupancy(piece.color)
}

/// `candidates`, unpacked into square indices in ascending order.
pub fn candidate_squares(board: &Board, from: usize) -> Vec<usize> {
    let mut set = candidates(board, from);
    let mut squares = Vec::with_capacity(set.count_ones() as usize);
    while set != 0 {
        let to = set.trailing_zeros() as usize;
        squares.push(to);
        set &= !SQUARE_MASKS[to];
    }
    squares
}

pub fn is_candidate(board: &Board, mv: Move) -> bool {
    mv.to < SQUARES && candidates(board, mv.from) & SQUARE_MASKS[mv.to] != 0
}
