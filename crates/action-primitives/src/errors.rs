//! Error types for gesture synthesis

use device_adapter::DeviceError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ActionError {
    /// Logical coordinates resolved outside the permitted area
    #[error("{0}")]
    InvalidCoordinates(String),

    /// Malformed gesture description
    #[error("{0}")]
    InvalidArgument(String),

    /// The platform offers no way to perform the gesture
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The platform primitive ran and reported failure
    #[error("{0}")]
    ActionFailed(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ActionError::Device(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ActionError::Device(err) if err.is_fatal())
    }
}
