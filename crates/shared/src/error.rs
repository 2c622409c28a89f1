use thiserror::Error;

const UNSPECIFIED_FAILURE: &str = "neznana napaka";

/// An application-level rejection: the backend answered with
/// `success: false` and, usually, a human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiFailure {
    pub message: String,
}

impl ApiFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Responses that carry the backend's `success`/`message` pair.
pub trait Acknowledged: Sized {
    fn success(&self) -> bool;
    fn message(&self) -> Option<&str>;

    fn into_result(self) -> Result<Self, ApiFailure> {
        if self.success() {
            return Ok(self);
        }
        let message = self
            .message()
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(UNSPECIFIED_FAILURE)
            .to_string();
        Err(ApiFailure::new(message))
    }
}
