use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("invalid satellite id: {0}")]
    InvalidId(String),
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog transport error: {0}")]
    Transport(String),
    #[error("catalog returned HTTP status {0}")]
    Status(u16),
    #[error("no catalog data for {0}")]
    NotFound(String),
    #[error("invalid catalog response: {0}")]
    InvalidResponse(String),
    #[error("invalid TLE for {id}: {message}")]
    InvalidTle { id: String, message: String },
}

impl CatalogError {
    /// Errors worth another attempt after a backoff.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Timeout | CatalogError::Transport(_) => true,
            CatalogError::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }

    /// The catalog could not be reached or refused to answer, as opposed to
    /// answering that it has no (usable) data.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            CatalogError::Timeout | CatalogError::Transport(_) | CatalogError::Status(_)
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout
        } else if let Some(status) = err.status() {
            CatalogError::Status(status.as_u16())
        } else {
            CatalogError::Transport(err.to_string())
        }
    }
}
