use reqwest::StatusCode;
use shared::error::ApiFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {endpoint}")]
    UnexpectedStatus {
        endpoint: String,
        status: StatusCode,
    },
    #[error("malformed response from {endpoint}: {source}")]
    Malformed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{0}")]
    Rejected(#[from] ApiFailure),
}

impl ClientError {
    /// True for failures the backend reported itself (`success: false`),
    /// as opposed to transport or decoding trouble.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ClientError::Rejected(_))
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
