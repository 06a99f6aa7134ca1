//! Errors raised by the platform facade

use thiserror::Error;

/// Message the platform uses when the automation session is gone.
pub const SERVICE_NOT_CONNECTED: &str =
    "UiAutomationService not connected. Did you call #register()?";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The node behind a handle is no longer part of the tree
    #[error("UiObject not found: {0}")]
    NotFound(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Capability missing on this device
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The automation session died; nothing else can succeed
    #[error("{}", SERVICE_NOT_CONNECTED)]
    ServiceDisconnected,

    #[error("Device error: {0}")]
    Internal(String),
}

impl DeviceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeviceError::NotFound(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DeviceError::ServiceDisconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnected_message_matches_platform() {
        let err = DeviceError::ServiceDisconnected;
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), SERVICE_NOT_CONNECTED);
        assert!(!DeviceError::NotFound("x".into()).is_fatal());
    }
}
