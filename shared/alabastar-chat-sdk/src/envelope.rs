//! REST response envelope

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON envelope wrapping every REST response:
/// `{ "success": bool, "data": T?, "message": string? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Envelope-level failures
#[derive(Debug, Clone, Error)]
pub enum EnvelopeError {
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Missing data in successful response")]
    MissingData,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` and absent data into
    /// errors.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::Rejected(
                self.message.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }
}
