//! Per-side countdown clocks and the AI-thinking suspension flag.
//!
//! Exactly one clock counts down at any instant: the side to move. The
//! exceptions are the suspension window while the engine opponent is
//! thinking (its time is unbounded but uncounted) and the permanent halt
//! once the game is over.

use std::time::Instant;

/// What a one-second tick concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    Idle,
    /// The local clock just hit zero.
    LocalExpired,
    /// The remote human's clock just hit zero.
    RemoteExpired,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    pub local_seconds: u32,
    pub remote_seconds: u32,
    /// Fixed at session start; never recomputed.
    pub per_turn_budget: u32,
    pub thinking_suspended: bool,
    pub turn_started_at: Option<Instant>,
    pub session_started_at: Option<Instant>,
    running: bool,
}

impl TimerState {
    pub fn new(per_turn_budget: u32) -> TimerState {
        TimerState {
            local_seconds: per_turn_budget,
            remote_seconds: per_turn_budget,
            per_turn_budget,
            thinking_suspended: false,
            turn_started_at: None,
            session_started_at: None,
            running: false,
        }
    }

    /// Called once, when the session becomes active.
    pub fn start(&mut self) {
        self.running = true;
        let now = Instant::now();
        self.session_started_at = Some(now);
        self.turn_started_at = Some(now);
    }

    /// Game over: no further tick has any effect.
    pub fn halt(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Refills the now-active side's countdown to the fixed budget after
    /// a confirmed move.
    pub fn reset_turn(&mut self, local_active: bool) {
        if !self.running {
            return;
        }
        if local_active {
            self.local_seconds = self.per_turn_budget;
        } else {
            self.remote_seconds = self.per_turn_budget;
        }
        self.turn_started_at = Some(Instant::now());
    }

    pub fn suspend_thinking(&mut self) {
        self.thinking_suspended = true;
    }

    pub fn resume_thinking(&mut self) {
        self.thinking_suspended = false;
    }

    /// Authoritative overwrites from the arbiter's time sync.
    pub fn set_local_seconds(&mut self, seconds: u32) {
        self.local_seconds = seconds;
    }

    pub fn set_remote_seconds(&mut self, seconds: u32) {
        self.remote_seconds = seconds;
    }

    /// One-second tick. Decrements the clock of the side to move, except
    /// that an engine opponent is never counted down.
    pub fn tick(&mut self, local_turn: bool, remote_is_engine: bool) -> TickAction {
        if !self.running || self.thinking_suspended {
            return TickAction::Idle;
        }
        if local_turn {
            if self.local_seconds > 0 {
                self.local_seconds -= 1;
                if self.local_seconds == 0 {
                    return TickAction::LocalExpired;
                }
            }
        } else if !remote_is_engine && self.remote_seconds > 0 {
            self.remote_seconds -= 1;
            if self.remote_seconds == 0 {
                return TickAction::RemoteExpired;
            }
        }
        TickAction::Idle
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session_started_at
            .map(|started| started.elapsed().as_secs())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_timer(budget: u32) -> TimerState {
        let mut timer = TimerState::new(budget);
        timer.start();
        timer
    }

    #[test]
    fn exactly_one_clock_decrements_per_tick() {
        let mut timer = active_timer(30);
        assert_eq!(timer.tick(true, false), TickAction::Idle);
        assert_eq!((timer.local_seconds, timer.remote_seconds), (29, 30));

        assert_eq!(timer.tick(false, false), TickAction::Idle);
        assert_eq!((timer.local_seconds, timer.remote_seconds), (29, 29));
    }

    #[test]
    fn suspension_freezes_both_clocks() {
        let mut timer = active_timer(30);
        timer.suspend_thinking();
        assert_eq!(timer.tick(true, true), TickAction::Idle);
        assert_eq!(timer.tick(false, true), TickAction::Idle);
        assert_eq!((timer.local_seconds, timer.remote_seconds), (30, 30));

        timer.resume_thinking();
        timer.tick(true, true);
        assert_eq!(timer.local_seconds, 29);
    }

    #[test]
    fn engine_opponent_is_never_counted_down() {
        let mut timer = active_timer(30);
        for _ in 0..100 {
            assert_eq!(timer.tick(false, true), TickAction::Idle);
        }
        assert_eq!(timer.remote_seconds, 30);
    }

    #[test]
    fn expiry_fires_once_on_reaching_zero() {
        let mut timer = active_timer(2);
        assert_eq!(timer.tick(true, false), TickAction::Idle);
        assert_eq!(timer.tick(true, false), TickAction::LocalExpired);
        assert_eq!(timer.tick(true, false), TickAction::Idle);

        let mut timer = active_timer(1);
        assert_eq!(timer.tick(false, false), TickAction::RemoteExpired);
    }

    #[test]
    fn halt_is_permanent() {
        let mut timer = active_timer(30);
        timer.halt();
        for _ in 0..10 {
            assert_eq!(timer.tick(true, false), TickAction::Idle);
            assert_eq!(timer.tick(false, false), TickAction::Idle);
        }
        assert_eq!((timer.local_seconds, timer.remote_seconds), (30, 30));
        timer.reset_turn(true);
        assert_eq!(timer.local_seconds, 30);
    }

    #[test]
    fn reset_refills_only_the_active_side() {
        let mut timer = active_timer(30);
        timer.tick(true, false);
        timer.tick(false, false);
        timer.reset_turn(false);
        assert_eq!((timer.local_seconds, timer.remote_seconds), (29, 30));
    }
}
