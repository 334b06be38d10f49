//! Error Types for the DCA Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Rate limited while fetching {token}")]
    RateLimited { token: String },

    #[error("Transport error for {token}: {message}")]
    Transport { token: String, message: String },

    #[error("Price provider returned HTTP {status} for {token}")]
    HttpStatus { token: String, status: u16 },

    #[error("Giving up on {token} after {attempts} attempts: {last}")]
    RetriesExhausted {
        token: String,
        attempts: u32,
        last: Box<AdvisorError>,
    },

    #[error("Empty price history for {0}")]
    EmptyHistory(String),

    #[error("Insufficient history for {token}: need {needed} points, have {available}")]
    InsufficientHistory {
        token: String,
        needed: usize,
        available: usize,
    },

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Could not analyze portfolio: {0}")]
    AnalysisUnavailable(String),

    #[error("Invalid allocation: {0}")]
    InvalidAllocation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdvisorError {
    /// Check if a fetch attempt that failed with this error should be retried
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Transport { .. }
        )
    }
}
