use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoboError {
    /// Missing credentials, malformed interval or date, invalid order input.
    /// Always raised before any request leaves the process.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): code {code}, {msg}")]
    Api {
        status: StatusCode,
        code: i64,
        msg: String,
    },

    #[error("Malformed candle: {0}")]
    MalformedCandle(String),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL")]
    UrlParseError(#[from] url::ParseError),
}

impl RoboError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Fatal setup problems, raised before network I/O.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::UrlParseError(_))
    }

    /// Failures of a single request that a caller may restart.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }
}

pub type Result<T> = std::result::Result<T, RoboError>;
