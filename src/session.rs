//! The game session and sync reconciler.
//!
//! The reconciler never mutates the board on a local action. Selecting a
//! piece only updates the speculative candidate display, and a chosen
//! move goes out as an intent. All game truth (board, turn, captures,
//! timers) arrives back in the arbiter's confirmation messages, whose
//! snapshots overwrite local state wholesale. A rejected intent clears
//! the selection and changes nothing else.

use engine::board::{col_of, in_bounds, row_of, sq, Bitboard, Board};
use engine::constants::{Color, Piece};
use engine::movegen;
use engine::moves::{square_name, Move};
use engine::score::{self, CaptureTally, EndReason, ScoreBreakdown};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::highscore::HighscoreRecord;
use crate::protocol::{BoardSnapshot, ClientMessage, MovePayload, Players, ServerMessage};
use crate::timer::{TickAction, TimerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    WaitingForOpponent,
    Active,
    GameOver,
}

/// A confirmed move as recorded in session history.
#[derive(Debug, Clone)]
pub struct RecordedMove {
    pub player: Color,
    pub mv: Move,
    pub piece: Option<Piece>,
    pub captured: Option<Piece>,
}

#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub winner: Option<Color>,
    pub reason: EndReason,
    pub breakdown: ScoreBreakdown,
}

pub struct GameSession {
    config: Config,
    pub phase: Phase,
    pub board: Board,
    pub turn: Color,
    pub selected: Option<usize>,
    pub candidate_moves: Bitboard,
    pub last_move: Option<Move>,
    pub move_history: Vec<RecordedMove>,
    pub captured_by_local: Vec<Piece>,
    pub captured_by_remote: Vec<Piece>,
    tally: CaptureTally,
    pub timer: TimerState,
    outcome: Option<SessionOutcome>,
}

impl GameSession {
    pub fn new(config: Config) -> GameSession {
        let timer = TimerState::new(config.turn_budget());
        GameSession {
            config,
            phase: Phase::WaitingForOpponent,
            board: Board::empty(),
            turn: Color::Red,
            selected: None,
            candidate_moves: 0,
            last_move: None,
            move_history: Vec::new(),
            captured_by_local: Vec::new(),
            captured_by_remote: Vec::new(),
            tally: CaptureTally::default(),
            timer,
            outcome: None,
        }
    }

    pub fn local_color(&self) -> Color {
        self.config.color
    }

    pub fn is_local_turn(&self) -> bool {
        self.turn == self.config.color
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinGame {
            room_code: self.config.room_code.clone(),
            username: self.config.username.clone(),
        }
    }

    // --- Inbound dispatch ---

    pub fn handle_server(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::GameState { board, players } => self.apply_game_state(board, players),
            ServerMessage::MoveMade(payload) => self.apply_move_made(payload),
            ServerMessage::MoveError { message } => {
                warn!("move rejected by arbiter: {message}");
                self.clear_selection();
            }
            ServerMessage::GameOver { winner, reason } => self.apply_game_over(winner, reason),
            ServerMessage::PlayerJoined { username } => info!("{username} joined the room"),
            ServerMessage::PlayerLeft { .. } => info!("opponent left the room"),
            ServerMessage::DrawOffered => info!("opponent offers a draw; `accept` to take it"),
            ServerMessage::TimeSync {
                red_time,
                black_time,
            } => self.apply_time_sync(red_time, black_time),
            ServerMessage::ChatMessage { username, message } => info!("[chat] {username}: {message}"),
        }
    }

    fn apply_game_state(&mut self, snapshot: Option<BoardSnapshot>, players: Option<Players>) {
        let Some(snap) = snapshot else {
            warn!("game_state without a board; ignored");
            return;
        };
        let Some(board) = snap.to_board() else {
            warn!("game_state with a malformed board; ignored");
            return;
        };
        self.board = board;
        self.turn = snap.turn;
        self.activate();
        if let Some(players) = players {
            let name = |info: Option<crate::protocol::PlayerInfo>| {
                info.and_then(|p| p.name).unwrap_or_else(|| "?".to_string())
            };
            info!("players: red {} vs black {}", name(players.red), name(players.black));
        }
    }

    fn activate(&mut self) {
        if self.phase == Phase::WaitingForOpponent {
            self.phase = Phase::Active;
            self.timer.start();
            self.timer.reset_turn(self.is_local_turn());
            info!("game on: you play {:?}", self.config.color);
        }
    }

    fn apply_move_made(&mut self, payload: MovePayload) {
        if self.phase == Phase::GameOver {
            return;
        }
        let Some(snap) = payload.board.as_ref() else {
            warn!("move_made without a board; ignored");
            return;
        };
        let Some(board) = snap.to_board() else {
            warn!("move_made with a malformed board; ignored");
            return;
        };
        if !in_bounds(payload.from_row as isize, payload.from_col as isize)
            || !in_bounds(payload.to_row as isize, payload.to_col as isize)
        {
            warn!("move_made with out-of-range squares; ignored");
            return;
        }

        if self.config.mode.is_pve() && payload.is_ai {
            self.timer.resume_thinking();
        }

        self.turn = snap.turn;
        self.board = board;
        self.activate();

        if let Some(remaining) = payload.remaining_time {
            if payload.player == self.config.color {
                self.timer.set_local_seconds(remaining);
            } else {
                self.timer.set_remote_seconds(remaining);
            }
        }

        let mv = Move::new(
            sq(payload.from_row as usize, payload.from_col as usize),
            sq(payload.to_row as usize, payload.to_col as usize),
        );
        self.last_move = Some(mv);

        if let Some(captured) = payload.captured {
            if payload.player == self.config.color {
                self.tally.record(captured.kind);
                self.captured_by_local.push(captured);
            } else {
                self.captured_by_remote.push(captured);
            }
        }
        self.move_history.push(RecordedMove {
            player: payload.player,
            mv,
            piece: payload.piece,
            captured: payload.captured,
        });

        if self.config.mode.is_pve() && !payload.is_ai && payload.player == self.config.color {
            // Our move is confirmed; the engine is thinking now.
            self.timer.suspend_thinking();
        }
        self.timer.reset_turn(self.is_local_turn());

        info!(
            "{:?} played {}{}",
            payload.player,
            mv.to_coord_string(),
            payload
                .captured
                .map(|p| format!(", capturing {:?}", p.kind))
                .unwrap_or_default()
        );
    }

    fn apply_game_over(&mut self, winner: Option<Color>, reason: EndReason) {
        if self.phase == Phase::GameOver {
            return;
        }
        self.phase = Phase::GameOver;
        self.timer.halt();
        self.clear_selection();

        let local_won = winner == Some(self.config.color);
        let breakdown = score::final_breakdown(
            self.tally.tenths(),
            self.move_history.len(),
            &self.captured_by_remote,
            local_won,
            reason,
        );
        match winner {
            Some(color) if local_won => info!("you win as {:?} ({:?})", color, reason),
            Some(color) => info!("{:?} wins ({:?})", color, reason),
            None => info!("game drawn"),
        }
        self.outcome = Some(SessionOutcome {
            winner,
            reason,
            breakdown,
        });
    }

    fn apply_time_sync(&mut self, red_time: Option<u32>, black_time: Option<u32>) {
        for (color, seconds) in [(Color::Red, red_time), (Color::Black, black_time)] {
            if let Some(seconds) = seconds {
                if color == self.config.color {
                    self.timer.set_local_seconds(seconds);
                } else {
                    self.timer.set_remote_seconds(seconds);
                }
            }
        }
    }

    // --- Timer tick ---

    pub fn handle_tick(&mut self) -> Vec<ClientMessage> {
        if self.phase != Phase::Active {
            return Vec::new();
        }
        match self
            .timer
            .tick(self.is_local_turn(), self.config.mode.is_pve())
        {
            TickAction::Idle => Vec::new(),
            TickAction::LocalExpired => {
                if self.config.mode.is_pve() {
                    // Turn forfeited, not resigned: skip and let the engine move.
                    info!("out of time: turn forfeited");
                    self.turn = self.config.color.opponent();
                    self.clear_selection();
                    self.timer.suspend_thinking();
                    vec![ClientMessage::SkipTurn {
                        room_code: self.config.room_code.clone(),
                    }]
                } else {
                    info!("out of time: reporting timeout to the arbiter");
                    vec![ClientMessage::Timeout {
                        room_code: self.config.room_code.clone(),
                        loser: self.config.color,
                    }]
                }
            }
            TickAction::RemoteExpired => {
                info!("opponent out of time: reporting timeout to the arbiter");
                vec![ClientMessage::Timeout {
                    room_code: self.config.room_code.clone(),
                    loser: self.config.color.opponent(),
                }]
            }
        }
    }

    // --- Local speculative actions ---

    /// Selects an own piece and returns its candidate destinations for
    /// display. Purely advisory: nothing is sent and nothing on the
    /// board changes.
    pub fn select(&mut self, square: usize) -> Option<Vec<usize>> {
        if self.phase != Phase::Active {
            return None;
        }
        match self.board.piece_at(square) {
            Some(piece) if piece.color == self.config.color => {
                if !self.is_local_turn() {
                    info!("not your turn");
                    return None;
                }
                self.selected = Some(square);
                self.candidate_moves = movegen::candidates(&self.board, square);
                Some(movegen::candidate_squares(&self.board, square))
            }
            _ => {
                debug!("square {} is not yours to select", square_name(square));
                None
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.candidate_moves = 0;
    }

    /// Proposes a move. Returns the intent message if the move is a
    /// generated candidate; anything else is silently ignored. The board
    /// is not touched; truth arrives with the confirmation.
    pub fn propose(&mut self, mv: Move) -> Option<ClientMessage> {
        if self.phase != Phase::Active || !self.is_local_turn() {
            debug!("ignoring proposal: not an active local turn");
            return None;
        }
        match self.board.piece_at(mv.from) {
            Some(piece) if piece.color == self.config.color => {}
            _ => {
                debug!("ignoring proposal from {}", square_name(mv.from));
                return None;
            }
        }
        if !movegen::is_candidate(&self.board, mv) {
            debug!("{} is not a candidate; ignored", mv.to_coord_string());
            return None;
        }
        self.clear_selection();
        Some(ClientMessage::MakeMove {
            room_code: self.config.room_code.clone(),
            from_row: row_of(mv.from) as u8,
            from_col: col_of(mv.from) as u8,
            to_row: row_of(mv.to) as u8,
            to_col: col_of(mv.to) as u8,
            player_color: self.config.color,
        })
    }

    pub fn offer_draw_message(&self) -> Option<ClientMessage> {
        if self.config.mode.is_pve() {
            info!("the engine does not negotiate draws");
            return None;
        }
        Some(ClientMessage::OfferDraw {
            room_code: self.config.room_code.clone(),
        })
    }

    pub fn accept_draw_message(&self) -> ClientMessage {
        ClientMessage::AcceptDraw {
            room_code: self.config.room_code.clone(),
        }
    }

    pub fn resign_message(&self) -> ClientMessage {
        ClientMessage::Resign {
            room_code: self.config.room_code.clone(),
            player_color: self.config.color,
        }
    }

    pub fn leave_message(&self) -> ClientMessage {
        ClientMessage::LeaveGame {
            room_code: self.config.room_code.clone(),
        }
    }

    pub fn chat_message(&self, text: String) -> ClientMessage {
        ClientMessage::ChatMessage {
            room_code: self.config.room_code.clone(),
            username: self.config.username.clone(),
            message: text,
        }
    }

    /// The record to post after a PvE win; `None` otherwise.
    pub fn highscore_record(&self) -> Option<HighscoreRecord> {
        if !self.config.mode.is_pve() {
            return None;
        }
        let outcome = self.outcome.as_ref()?;
        if outcome.winner != Some(self.config.color) {
            return None;
        }
        Some(HighscoreRecord {
            difficulty: self.config.difficulty.as_str().to_string(),
            game_score: outcome.breakdown.total_points(),
            moves_count: outcome.breakdown.total_moves,
            elapsed_time: self.timer.elapsed_seconds(),
            pieces_captured: self.captured_by_local.len(),
            pieces_lost: self.captured_by_remote.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, GameMode};
    use engine::constants::PieceKind;

    fn snapshot(pieces: &[(usize, usize, PieceKind, Color)], turn: Color) -> BoardSnapshot {
        let mut grid = vec![vec![None; 9]; 10];
        for &(r, c, kind, color) in pieces {
            grid[r][c] = Some(Piece::new(kind, color));
        }
        BoardSnapshot { grid, turn }
    }

    fn opening_snapshot(turn: Color) -> BoardSnapshot {
        let board = Board::opening();
        let mut grid = vec![vec![None; 9]; 10];
        for r in 0..10 {
            for c in 0..9 {
                grid[r][c] = board.piece_at(sq(r, c));
            }
        }
        BoardSnapshot { grid, turn }
    }

    fn pvp_session() -> GameSession {
        let mut session = GameSession::new(Config::default());
        session.handle_server(ServerMessage::GameState {
            board: Some(opening_snapshot(Color::Red)),
            players: None,
        });
        session
    }

    fn pve_session() -> GameSession {
        let config = Config {
            mode: GameMode::Pve,
            difficulty: Difficulty::Hard,
            ..Config::default()
        };
        let mut session = GameSession::new(config);
        session.handle_server(ServerMessage::GameState {
            board: Some(opening_snapshot(Color::Red)),
            players: None,
        });
        session
    }

    fn confirmed_move(
        from: (usize, usize),
        to: (usize, usize),
        player: Color,
        captured: Option<Piece>,
        is_ai: bool,
        after: BoardSnapshot,
    ) -> ServerMessage {
        ServerMessage::MoveMade(MovePayload {
            from_row: from.0 as u8,
            from_col: from.1 as u8,
            to_row: to.0 as u8,
            to_col: to.1 as u8,
            player,
            piece: None,
            captured,
            board: Some(after),
            is_ai,
            remaining_time: None,
        })
    }

    #[test]
    fn game_state_activates_session_and_starts_timer() {
        let session = pvp_session();
        assert_eq!(session.phase, Phase::Active);
        assert!(session.timer.is_running());
        assert!(session.is_local_turn());
    }

    #[test]
    fn rejection_clears_selection_and_leaves_board_alone() {
        let mut session = pvp_session();
        let from = sq(6, 4);
        assert!(session.select(from).is_some());

        let intent = session.propose(Move::new(from, sq(5, 4)));
        assert!(intent.is_some());

        session.handle_server(ServerMessage::MoveError {
            message: "not allowed".to_string(),
        });
        assert_eq!(session.selected, None);
        assert_eq!(session.candidate_moves, 0);
        // Board untouched: the soldier never moved.
        assert_eq!(
            session.board.piece_at(from),
            Some(Piece::new(PieceKind::Soldier, Color::Red))
        );
        assert_eq!(session.board.piece_at(sq(5, 4)), None);
        assert!(session.is_local_turn());
    }

    #[test]
    fn confirmation_overwrites_board_and_records_capture() {
        let mut session = pvp_session();
        session.timer.set_remote_seconds(5);
        let captured = Piece::new(PieceKind::Horse, Color::Black);
        let after = snapshot(
            &[
                (0, 1, PieceKind::Cannon, Color::Red),
                (9, 4, PieceKind::General, Color::Red),
                (0, 4, PieceKind::General, Color::Black),
            ],
            Color::Black,
        );
        session.handle_server(confirmed_move(
            (7, 1),
            (0, 1),
            Color::Red,
            Some(captured),
            false,
            after,
        ));

        assert_eq!(
            session.board.piece_at(sq(0, 1)),
            Some(Piece::new(PieceKind::Cannon, Color::Red))
        );
        assert_eq!(session.turn, Color::Black);
        assert!(!session.is_local_turn());
        assert_eq!(session.last_move, Some(Move::new(sq(7, 1), sq(0, 1))));
        assert_eq!(session.move_history.len(), 1);
        assert_eq!(session.captured_by_local, vec![captured]);
        // The now-active side's clock was refilled to the full budget.
        assert_eq!(session.timer.remote_seconds, 30);
    }

    #[test]
    fn malformed_move_made_is_a_no_op() {
        let mut session = pvp_session();
        session.handle_server(ServerMessage::MoveMade(MovePayload {
            from_row: 7,
            from_col: 1,
            to_row: 0,
            to_col: 1,
            player: Color::Red,
            piece: None,
            captured: None,
            board: None,
            is_ai: false,
            remaining_time: None,
        }));
        assert_eq!(session.move_history.len(), 0);
        assert_eq!(session.turn, Color::Red);
        assert_eq!(
            session.board.piece_at(sq(7, 1)),
            Some(Piece::new(PieceKind::Cannon, Color::Red))
        );
    }

    #[test]
    fn proposal_outside_candidates_is_silently_ignored() {
        let mut session = pvp_session();
        // A soldier cannot move sideways before the river.
        assert_eq!(session.propose(Move::new(sq(6, 4), sq(6, 3))), None);
        // Opponent pieces cannot be proposed at all.
        assert_eq!(session.propose(Move::new(sq(3, 4), sq(4, 4))), None);
    }

    #[test]
    fn ai_thinking_suspends_after_confirmed_local_move() {
        let mut session = pve_session();
        let after = opening_snapshot(Color::Black);
        session.handle_server(confirmed_move(
            (6, 4),
            (5, 4),
            Color::Red,
            None,
            false,
            after,
        ));
        assert!(session.timer.thinking_suspended);

        // Ticks are frozen while the engine thinks.
        assert!(session.handle_tick().is_empty());
        assert_eq!(session.timer.remote_seconds, 30);

        let after = opening_snapshot(Color::Red);
        session.handle_server(confirmed_move(
            (3, 4),
            (4, 4),
            Color::Black,
            None,
            true,
            after,
        ));
        assert!(!session.timer.thinking_suspended);
        assert!(session.is_local_turn());
    }

    #[test]
    fn local_expiry_in_pve_forfeits_the_turn() {
        let mut session = pve_session();
        session.timer.set_local_seconds(1);
        let outbound = session.handle_tick();
        assert_eq!(
            outbound,
            vec![ClientMessage::SkipTurn {
                room_code: "LOCAL".to_string()
            }]
        );
        assert!(!session.is_local_turn());
        assert!(session.timer.thinking_suspended);
        assert_eq!(session.phase, Phase::Active);
    }

    #[test]
    fn local_expiry_in_pvp_reports_timeout_loss() {
        let mut session = pvp_session();
        session.timer.set_local_seconds(1);
        let outbound = session.handle_tick();
        assert_eq!(
            outbound,
            vec![ClientMessage::Timeout {
                room_code: "LOCAL".to_string(),
                loser: Color::Red,
            }]
        );
        // The arbiter, not the local clock, ends the game.
        assert_eq!(session.phase, Phase::Active);
    }

    #[test]
    fn remote_expiry_in_pvp_reports_opponent_timeout() {
        let mut session = pvp_session();
        let after = opening_snapshot(Color::Black);
        session.handle_server(confirmed_move(
            (6, 4),
            (5, 4),
            Color::Red,
            None,
            false,
            after,
        ));
        session.timer.set_remote_seconds(1);
        let outbound = session.handle_tick();
        assert_eq!(
            outbound,
            vec![ClientMessage::Timeout {
                room_code: "LOCAL".to_string(),
                loser: Color::Black,
            }]
        );
    }

    #[test]
    fn game_over_halts_ticks_and_builds_breakdown() {
        let mut session = pve_session();
        let captured = Piece::new(PieceKind::Chariot, Color::Black);
        let after = snapshot(
            &[
                (9, 4, PieceKind::General, Color::Red),
                (0, 4, PieceKind::General, Color::Black),
            ],
            Color::Black,
        );
        session.handle_server(confirmed_move(
            (7, 1),
            (0, 1),
            Color::Red,
            Some(captured),
            false,
            after,
        ));
        session.handle_server(ServerMessage::GameOver {
            winner: Some(Color::Red),
            reason: EndReason::Checkmate,
        });

        assert_eq!(session.phase, Phase::GameOver);
        assert!(session.handle_tick().is_empty());

        let outcome = session.outcome().expect("outcome recorded");
        // 90 capture tenths + checkmate 1000 + fast win 1500 + perfect
        // defense 800.
        assert_eq!(outcome.breakdown.total, 90 + 1000 + 1500 + 800);

        let record = session.highscore_record().expect("pve win posts a record");
        assert_eq!(record.difficulty, "hard");
        assert_eq!(record.pieces_captured, 1);
        assert_eq!(record.pieces_lost, 0);
        assert_eq!(record.moves_count, 1);
    }

    #[test]
    fn breakdown_recomputation_is_stable() {
        let mut session = pvp_session();
        session.handle_server(ServerMessage::GameOver {
            winner: Some(Color::Black),
            reason: EndReason::Resign,
        });
        let first = session.outcome().expect("recorded").breakdown;
        // A duplicate terminal event must not change anything.
        session.handle_server(ServerMessage::GameOver {
            winner: Some(Color::Black),
            reason: EndReason::Resign,
        });
        assert_eq!(session.outcome().expect("recorded").breakdown, first);
        assert_eq!(first.total, first.capture_points);
    }

    #[test]
    fn time_sync_overwrites_by_color() {
        let mut session = pvp_session();
        session.handle_server(ServerMessage::TimeSync {
            red_time: Some(12),
            black_time: Some(7),
        });
        assert_eq!(session.timer.local_seconds, 12);
        assert_eq!(session.timer.remote_seconds, 7);
    }
}
