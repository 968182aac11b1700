//! Error types for the application

use thiserror::Error;

/// Result type alias using our MonitorError
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Main error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Filesystem errors from the file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database errors from the SQL-backed store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Price feed returned nothing usable
    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(String),

    /// Portfolio fetch failed or reported an error
    #[error("Portfolio unavailable: {0}")]
    PortfolioUnavailable(String),

    /// Persistent store errors that are not I/O or SQL level
    #[error("Storage error: {0}")]
    Storage(String),

    /// Rejected user-supplied alert parameters
    #[error("Invalid alert: {0}")]
    InvalidAlert(String),

    /// Rejected user-supplied setting values
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// Rejected user-supplied calculator input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Notification hand-off errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    /// Whether the error is a transient fetch failure that the next cycle
    /// should simply retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::HttpRequest(_)
                | MonitorError::MarketDataUnavailable(_)
                | MonitorError::PortfolioUnavailable(_)
                | MonitorError::InvalidResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(MonitorError::MarketDataUnavailable("empty".into()).is_transient());
        assert!(MonitorError::PortfolioUnavailable("no key".into()).is_transient());
        assert!(!MonitorError::Storage("disk full".into()).is_transient());
        assert!(!MonitorError::InvalidAlert("bad".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        let err = MonitorError::InvalidAlert("target must be positive".into());
        assert_eq!(err.to_string(), "Invalid alert: target must be positive");
    }
}
