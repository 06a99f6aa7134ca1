//! Error types for selector resolution

use device_adapter::DeviceError;
use thiserror::Error;
use uiauto_registry::CacheError;

/// Locator error enumeration
#[derive(Debug, Error, Clone)]
pub enum LocatorError {
    /// Strategy token is not one the agent knows
    #[error("Invalid locator strategy: {0}")]
    UnknownStrategy(String),

    /// Known strategy the agent refuses to handle
    #[error("Sorry, we don't support the '{0}' locator strategy yet")]
    UnsupportedStrategy(String),

    /// Criteria could not be turned into a selector
    #[error("{0}")]
    InvalidSelector(String),

    /// No live node matched any predicate
    #[error("{0}")]
    ElementNotFound(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl LocatorError {
    pub fn invalid(message: impl Into<String>) -> Self {
        LocatorError::InvalidSelector(message.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            LocatorError::ElementNotFound(_) => true,
            LocatorError::Cache(err) => err.is_retryable(),
            LocatorError::Device(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Lost automation session, surfaced from any layer.
    pub fn is_fatal(&self) -> bool {
        match self {
            LocatorError::Device(err) => err.is_fatal(),
            LocatorError::Cache(CacheError::Device(err)) => err.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_message_names_the_token() {
        let err = LocatorError::UnsupportedStrategy("link text".into());
        assert_eq!(
            err.to_string(),
            "Sorry, we don't support the 'link text' locator strategy yet"
        );
    }

    #[test]
    fn fatal_is_seen_through_the_cache_layer() {
        let err = LocatorError::from(CacheError::Device(DeviceError::ServiceDisconnected));
        assert!(err.is_fatal());
        assert!(!LocatorError::invalid("x").is_fatal());
    }
}
