mod client;
mod config;
mod error;
mod highscore;
mod protocol;
mod session;
mod timer;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use engine::constants::Color;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Difficulty, GameMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Red,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::Red => Color::Red,
            Side::Black => Color::Black,
        }
    }
}

/// Xiangqi client: plays a room on a remote arbiter over its realtime
/// channel, against a human or the server-side engine.
#[derive(Parser)]
#[command(name = "xiangqi_online", version, about)]
struct Args {
    /// WebSocket URL of the game arbiter
    #[arg(long, default_value = "ws://127.0.0.1:5000/ws")]
    server: String,
    /// HTTP base URL for the high-score endpoint
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    api: String,
    /// Room code to join
    #[arg(long)]
    room: String,
    #[arg(long, default_value = "guest")]
    username: String,
    /// The side this client plays
    #[arg(long, value_enum, default_value = "red")]
    color: Side,
    #[arg(long, value_enum, default_value = "pvp")]
    mode: GameMode,
    /// Engine strength; also sets the per-turn clock in PvE
    #[arg(long, value_enum, default_value = "medium")]
    difficulty: Difficulty,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = Config {
        server_url: args.server,
        api_url: args.api,
        room_code: args.room,
        username: args.username,
        color: args.color.into(),
        mode: args.mode,
        difficulty: args.difficulty,
    };

    client::run(config).await?;
    Ok(())
}
