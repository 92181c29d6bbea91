//! The single-threaded session event loop.
//!
//! One cooperative task processes everything: arbiter messages (via an
//! mpsc queue fed by the channel reader), one-second timer ticks, and
//! stdin commands. Each handler runs to completion before the next event
//! is dispatched, so the session state needs no locking.

use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_websockets::{ClientBuilder, MaybeTlsStream, Message, WebSocketStream};
use tracing::{info, warn};

use engine::moves::{parse_move, parse_square, square_name, Move};
use engine::score::format_tenths;

use crate::config::Config;
use crate::error::ClientError;
use crate::highscore;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{GameSession, Phase, SessionOutcome};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

enum Command {
    Select(usize),
    Move(Move),
    Board,
    OfferDraw,
    AcceptDraw,
    Resign,
    Chat(String),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "select" => parts.next().and_then(parse_square).map(Command::Select),
        "move" => parts.next().and_then(parse_move).map(Command::Move),
        "board" => Some(Command::Board),
        "draw" => Some(Command::OfferDraw),
        "accept" => Some(Command::AcceptDraw),
        "resign" => Some(Command::Resign),
        "chat" => {
            let text = parts.collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                None
            } else {
                Some(Command::Chat(text))
            }
        }
        "quit" => Some(Command::Quit),
        _ => None,
    }
}

async fn send(sink: &mut WsSink, msg: &ClientMessage) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            if let Err(err) = sink.send(Message::text(json)).await {
                warn!("send failed: {err}");
            }
        }
        Err(err) => warn!("failed to encode outbound message: {err}"),
    }
}

pub async fn run(config: Config) -> Result<(), ClientError> {
    let (ws, _response) = ClientBuilder::new()
        .uri(&config.server_url)
        .map_err(|err| ClientError::InvalidUrl(err.to_string()))?
        .connect()
        .await?;
    info!("connected to {}", config.server_url);
    let (mut sink, mut stream) = ws.split();

    // The reader forwards decoded messages in arrival order; dropping
    // the sender is the disconnect signal.
    let (inbound_tx, mut inbound) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            let frame = match item {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("channel error: {err}");
                    break;
                }
            };
            let Some(text) = frame.as_text() else { continue };
            match serde_json::from_str::<ServerMessage>(text) {
                Ok(msg) => {
                    if inbound_tx.send(msg).is_err() {
                        break;
                    }
                }
                Err(err) => warn!("ignoring malformed message: {err}"),
            }
        }
    });

    let mut session = GameSession::new(config.clone());
    send(&mut sink, &session.join_message()).await;

    // First tick one second from now, not immediately.
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + Duration::from_secs(1),
        Duration::from_secs(1),
    );
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut link_up = true;
    let mut stdin_open = true;

    loop {
        tokio::select! {
            inbound_msg = inbound.recv(), if link_up => {
                match inbound_msg {
                    Some(msg) => {
                        session.handle_server(msg);
                        if session.phase == Phase::GameOver {
                            break;
                        }
                    }
                    None => {
                        // The session stays up but will see no further
                        // updates until the user quits.
                        link_up = false;
                        warn!("connection to the arbiter lost");
                    }
                }
            }
            _ = ticker.tick() => {
                for msg in session.handle_tick() {
                    send(&mut sink, &msg).await;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        if dispatch_command(&line, &mut session, &mut sink).await {
                            send(&mut sink, &session.leave_message()).await;
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(err) => {
                        warn!("stdin error: {err}");
                        stdin_open = false;
                    }
                }
            }
        }
    }

    if let Some(outcome) = session.outcome() {
        report(outcome);
        if let Some(record) = session.highscore_record() {
            match highscore::submit(&config.api_url, &record).await {
                Ok(reply) if reply.is_new_highscore() => {
                    info!("new high score for {} difficulty!", record.difficulty)
                }
                Ok(_) => info!("score submitted"),
                Err(err) => warn!("high-score submission failed: {err}"),
            }
        }
    }
    Ok(())
}

/// Returns `true` when the user asked to quit.
async fn dispatch_command(line: &str, session: &mut GameSession, sink: &mut WsSink) -> bool {
    let Some(command) = parse_command(line) else {
        if !line.trim().is_empty() {
            info!(
                "commands: select <sq> | move <from><to> | board | draw | accept | resign | chat <text> | quit"
            );
        }
        return false;
    };
    match command {
        Command::Select(square) => {
            if let Some(candidates) = session.select(square) {
                let names: Vec<String> = candidates.iter().map(|&s| square_name(s)).collect();
                info!("{} can reach: {}", square_name(square), names.join(" "));
            }
        }
        Command::Move(mv) => {
            if let Some(msg) = session.propose(mv) {
                send(sink, &msg).await;
            }
        }
        Command::Board => {
            println!("{}", session.board);
            info!(
                "you play {:?}; clock: you {}s, opponent {}s",
                session.local_color(),
                session.timer.local_seconds,
                session.timer.remote_seconds
            );
        }
        Command::OfferDraw => {
            if let Some(msg) = session.offer_draw_message() {
                send(sink, &msg).await;
                info!("draw offered");
            }
        }
        Command::AcceptDraw => send(sink, &session.accept_draw_message()).await,
        Command::Resign => send(sink, &session.resign_message()).await,
        Command::Chat(text) => send(sink, &session.chat_message(text)).await,
        Command::Quit => return true,
    }
    false
}

fn report(outcome: &SessionOutcome) {
    let breakdown = &outcome.breakdown;
    info!("capture points: {}", format_tenths(breakdown.capture_points));
    if breakdown.checkmate_bonus > 0 {
        info!("checkmate bonus: +{}", format_tenths(breakdown.checkmate_bonus));
    }
    if breakdown.speed_bonus > 0 {
        info!("speed bonus: +{}", format_tenths(breakdown.speed_bonus));
    }
    if breakdown.defense_bonus > 0 {
        info!("defense bonus: +{}", format_tenths(breakdown.defense_bonus));
    }
    info!(
        "total: {} over {} recorded moves",
        format_tenths(breakdown.total),
        breakdown.total_moves
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::board::sq;

    #[test]
    fn parses_driver_commands() {
        assert!(matches!(
            parse_command("select h2"),
            Some(Command::Select(s)) if s == sq(7, 7)
        ));
        assert!(matches!(
            parse_command("move h2e2"),
            Some(Command::Move(mv)) if mv == Move::new(sq(7, 7), sq(7, 4))
        ));
        assert!(matches!(
            parse_command("chat  good game "),
            Some(Command::Chat(text)) if text == "good game"
        ));
        assert!(parse_command("").is_none());
        assert!(parse_command("chat").is_none());
        assert!(parse_command("move h2").is_none());
        assert!(parse_command("castle").is_none());
    }
}
