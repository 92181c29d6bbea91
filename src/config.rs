//! Session configuration.

use clap::ValueEnum;
use engine::constants::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GameMode {
    /// Two humans over the arbiter.
    Pvp,
    /// A human against the server-side engine.
    Pve,
}

impl GameMode {
    pub fn is_pve(self) -> bool {
        self == GameMode::Pve
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// WebSocket URL of the game arbiter.
    pub server_url: String,
    /// HTTP base URL for the high-score endpoint.
    pub api_url: String,
    pub room_code: String,
    pub username: String,
    /// The side this client plays.
    pub color: Color,
    pub mode: GameMode,
    pub difficulty: Difficulty,
}

impl Config {
    /// Per-turn countdown in seconds. Fixed at session start and never
    /// recomputed: an easier engine opponent grants the human more time.
    pub fn turn_budget(&self) -> u32 {
        match self.mode {
            GameMode::Pvp => 30,
            GameMode::Pve => match self.difficulty {
                Difficulty::Easy => 60,
                Difficulty::Medium => 45,
                Difficulty::Hard => 30,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:5000/ws".to_string(),
            api_url: "http://127.0.0.1:5000".to_string(),
            room_code: "LOCAL".to_string(),
            username: "guest".to_string(),
            color: Color::Red,
            mode: GameMode::Pvp,
            difficulty: Difficulty::Medium,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_budget_follows_mode_and_difficulty() {
        let mut config = Config::default();
        assert_eq!(config.turn_budget(), 30);

        config.mode = GameMode::Pve;
        config.difficulty = Difficulty::Easy;
        assert_eq!(config.turn_budget(), 60);
        config.difficulty = Difficulty::Medium;
        assert_eq!(config.turn_budget(), 45);
        config.difficulty = Difficulty::Hard;
        assert_eq!(config.turn_budget(), 30);
    }
}
