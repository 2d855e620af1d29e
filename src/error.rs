use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WxError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("please enter a location")]
    MissingLocation,

    #[error("no WeatherAPI key configured (use --api-key or set WEATHERAPI_KEY)")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("weather provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed timestamp \"{value}\": {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unreadable preferences file {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T, E = WxError> = std::result::Result<T, E>;
