//! Completed-game high-score submission.

use crate::error::ClientError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighscoreRecord {
    pub difficulty: String,
    pub game_score: f64,
    pub moves_count: usize,
    pub elapsed_time: u64,
    pub pieces_captured: usize,
    pub pieces_lost: usize,
}

#[derive(Debug, Deserialize)]
pub struct HighscoreReply {
    pub success: bool,
    #[serde(default)]
    pub result: Option<String>,
}

impl HighscoreReply {
    pub fn is_new_highscore(&self) -> bool {
        self.success && self.result.as_deref() == Some("new_highscore")
    }
}

pub async fn submit(api_url: &str, record: &HighscoreRecord) -> Result<HighscoreReply, ClientError> {
    let url = format!("{}/api/pve-highscore", api_url.trim_end_matches('/'));
    let reply = reqwest::Client::new()
        .post(&url)
        .json(record)
        .send()
        .await?
        .json()
        .await?;
    Ok(reply)
}
