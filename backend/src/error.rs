use thiserror::Error;

/// Failure reasons the Data API reports when a key has run out of quota.
pub const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

/// Raw failure of a single request against the YouTube Data API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP {status} ({reason}): {message}")]
    Http {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),
}

// The request URL carries the API key as a query parameter, so it is
// stripped before the error text can reach a log line.
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Quota-shaped failure, worth rotating the key for.
    Recoverable,
    Fatal,
}

/// Only 403/429 responses carrying a quota reason are recoverable.
pub fn classify_failure(status: u16, reason: &str) -> FailureClass {
    if matches!(status, 403 | 429) && QUOTA_REASONS.contains(&reason) {
        FailureClass::Recoverable
    } else {
        FailureClass::Fatal
    }
}

impl ApiError {
    pub fn class(&self) -> FailureClass {
        match self {
            ApiError::Http { status, reason, .. } => classify_failure(*status, reason),
            _ => FailureClass::Fatal,
        }
    }
}

/// What a pipeline stage sees when a request does not produce a payload.
/// None of these ever leave the pipeline; they end up as log lines.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no API key available")]
    NoCredentialAvailable,

    /// The key was exhausted. `retry_possible` is true when the store handed
    /// out another key and the session was rebound to it. A failed retry
    /// always reports false.
    #[error("quota exceeded (retry possible: {retry_possible})")]
    RecoverableQuota { retry_possible: bool },

    #[error("request failed: {0}")]
    FatalRequest(#[source] ApiError),

    #[error("could not parse {field}: {value:?}")]
    Parse { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum KeyStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed key file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("key store lock poisoned")]
    Poisoned,
}
