use thiserror::Error;

/// Outcome taxonomy for a single source call.
///
/// `NotFound` is a valid result (the source simply has no record for the
/// identifier), `Transient` covers network, timeout, authentication, and
/// malformed-response problems, and `Configuration` is fatal and surfaced
/// immediately (e.g. querying an inactive region).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("process not found at source")]
    NotFound,
    #[error("transient source failure: {0}")]
    Transient(String),
    #[error("source configuration error: {0}")]
    Configuration(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transient(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::Transient(format!("malformed source response: {err}"))
        } else {
            Self::Transient(err.to_string())
        }
    }
}

/// Environment configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration value '{key}'")]
    MissingValue { key: String },
    #[error("invalid configuration value '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
