//! Score accounting: the running capture tally and the terminal
//! breakdown.
//!
//! All amounts are integer tenths of a point (a cannon is worth 45
//! tenths), so the arithmetic is exact and the breakdown can be
//! recomputed from recorded session history at any later time.

use crate::constants::{Piece, PieceKind};
use serde::Deserialize;

/// Fixed awards, in tenths of a point.
pub const CHECKMATE_BONUS: u32 = 1000;
pub const FAST_WIN_BONUS: u32 = 1500;
pub const MEDIUM_WIN_BONUS: u32 = 1000;
pub const PERFECT_DEFENSE_BONUS: u32 = 800;
pub const CORE_DEFENSE_BONUS: u32 = 500;

/// Why the game ended, as reported by the arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    Checkmate,
    Timeout,
    Resign,
    Draw,
    #[serde(other)]
    Other,
}

/// Running capture tally, bumped exactly once per confirmed capture.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptureTally {
    tenths: u32,
}

impl CaptureTally {
    pub fn record(&mut self, kind: PieceKind) {
        self.tenths += kind.capture_points();
    }

    pub fn tenths(self) -> u32 {
        self.tenths
    }
}

/// The one-shot terminal breakdown. A pure function of its inputs; see
/// [`final_breakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub capture_points: u32,
    pub checkmate_bonus: u32,
    pub speed_bonus: u32,
    pub defense_bonus: u32,
    pub total_moves: usize,
    pub total: u32,
}

impl ScoreBreakdown {
    /// Total in display points, one decimal digit of precision.
    pub fn total_points(&self) -> f64 {
        self.total as f64 / 10.0
    }
}

/// Renders tenths as a decimal string, e.g. `245` -> `"24.5"`.
pub fn format_tenths(tenths: u32) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// Computes the terminal breakdown. Bonuses apply only when the local
/// side won; a draw or a loss totals the capture points alone.
///
/// `total_moves` counts every recorded move in the game; the speed tiers
/// are judged on the local side's own share of them, rounded up.
/// `lost_pieces` are the local side's losses over the whole game.
pub fn final_breakdown(
    capture_tenths: u32,
    total_moves: usize,
    lost_pieces: &[Piece],
    local_won: bool,
    reason: EndReason,
) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown {
        capture_points: capture_tenths,
        checkmate_bonus: 0,
        speed_bonus: 0,
        defense_bonus: 0,
        total_moves,
        total: capture_tenths,
    };
    if !local_won {
        return breakdown;
    }

    if reason == EndReason::Checkmate {
        breakdown.checkmate_bonus = CHECKMATE_BONUS;
    }

    let own_moves = (total_moves + 1) / 2;
    if own_moves < 30 {
        breakdown.speed_bonus = FAST_WIN_BONUS;
    } else if own_moves < 50 {
        breakdown.speed_bonus = MEDIUM_WIN_BONUS;
    }

    if lost_pieces.is_empty() {
        breakdown.defense_bonus = PERFECT_DEFENSE_BONUS;
    } else if !lost_pieces
        .iter()
        .any(|p| matches!(p.kind, PieceKind::Advisor | PieceKind::Elephant))
    {
        breakdown.defense_bonus = CORE_DEFENSE_BONUS;
    }

    breakdown.total = breakdown.capture_points
        + breakdown.checkmate_bonus
        + breakdown.speed_bonus
        + breakdown.defense_bonus;
    breakdown
}
