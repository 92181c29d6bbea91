//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    #[error("realtime channel error: {0}")]
    Channel(#[from] tokio_websockets::Error),
    #[error("high-score endpoint error: {0}")]
    Endpoint(#[from] reqwest::Error),
}
