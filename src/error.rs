//! Error types for the frameboard render pipeline.

use thiserror::Error;

/// Errors that can occur while producing a frame.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// A weather provider returned a payload we could not use
    #[error("weather provider '{provider}' returned unusable data: {reason}")]
    Provider {
        /// Provider name ("dwd" or "owm")
        provider: &'static str,
        /// What was wrong with the payload
        reason: String,
    },

    /// Both the primary and the fallback weather provider failed.
    ///
    /// The render aborts; a partial weather panel is never drawn.
    #[error("weather unavailable: primary and fallback provider both failed")]
    WeatherUnavailable,

    /// Configuration file could not be read or parsed
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Request(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::WeatherUnavailable;
        assert!(err.to_string().contains("weather unavailable"));

        let err = Error::Provider {
            provider: "dwd",
            reason: "no hourly rows".to_string(),
        };
        assert!(err.to_string().contains("dwd"));
        assert!(err.to_string().contains("no hourly rows"));
    }
}
