use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by the session core and the API clients.
///
/// The type is `Clone` because a single refresh outcome is fanned out to every
/// request waiting on it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("token expired")]
    TokenExpired,
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout: {0}")]
    Timeout(String),
    /// A 2xx envelope that reports `success: false`.
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("response error: {0}")]
    Parse(String),
    #[error("request error: {0}")]
    Serialization(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("session refresh was abandoned before it settled")]
    RefreshAbandoned,
}

impl Error {
    /// True for 401 responses, whether raw or after a failed recovery.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::Http { status: 401, .. })
    }
}
