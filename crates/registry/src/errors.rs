use device_adapter::DeviceError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CacheError {
    /// The key was never handed out
    #[error("Could not find element with key {0} in the element cache")]
    NotInHash(String),

    /// The key is known but its node left the tree
    #[error("Element {0} is no longer attached to the UI hierarchy")]
    Stale(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl CacheError {
    /// A stale node may come back after a UI change; an unknown key never will.
    pub fn is_retryable(&self) -> bool {
        match self {
            CacheError::Stale(_) => true,
            CacheError::NotInHash(_) => false,
            CacheError::Device(err) => err.is_retryable(),
        }
    }
}
