//! Error types for baryscore
//!
//! Provides the error taxonomy shared by the estimator, the venue search and
//! the geocoding collaborator, plus fuzzy suggestions for mistyped inputs.

use strsim::jaro_winkler;

/// Minimum Jaro-Winkler similarity for a "did you mean" suggestion
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Main error type for baryscore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Speed grid resource missing, unreachable or corrupt
    #[error("Routing grid for '{mode}' unavailable: {reason}")]
    GridUnavailable { mode: String, reason: String },

    /// Live venue search exhausted its retries
    #[error("Venue search unavailable: {0}")]
    SearchUnavailable(String),

    /// Geocoding collaborator could not resolve an address
    #[error("Unable to locate address '{0}'")]
    AddressNotFound(String),

    /// HTTP-specific error (non-retryable status, unexpected payload)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network connectivity issues (connect failure, timeout)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed resource payload
    #[error("Parse error: {0}")]
    ParseError(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Network-classed failures that are worth retrying locally
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::NetworkError(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ParseError(err.to_string())
    }
}

/// Suggest the closest known value for a mistyped input
pub fn suggest_correction(input: &str, candidates: &[&str]) -> Option<String> {
    let input_lower = input.to_lowercase();
    if candidates.iter().any(|c| c.eq_ignore_ascii_case(&input_lower)) {
        return None;
    }

    candidates
        .iter()
        .map(|candidate| (jaro_winkler(&input_lower, candidate), *candidate))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// Convenience result type for baryscore operations
pub type Result<T> = std::result::Result<T, Error>;
