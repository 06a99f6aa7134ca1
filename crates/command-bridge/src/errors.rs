//! Handler failure taxonomy and its mapping to wire status codes.

use action_locator::LocatorError;
use action_primitives::ActionError;
use device_adapter::DeviceError;
use thiserror::Error;
use uiauto_registry::CacheError;

use crate::model::{CommandResult, WdStatus};

#[derive(Debug, Error, Clone)]
pub enum CommandError {
    /// Missing or malformed parameter
    #[error("{0}")]
    InvalidRequest(String),

    /// No handler for the action, or a strategy token nobody knows
    #[error("{0}")]
    UnknownCommand(String),

    #[error("{0}")]
    InvalidSelector(String),

    #[error("{0}")]
    NoSuchElement(String),

    /// Key was issued but its node is gone
    #[error("{0}")]
    StaleElement(String),

    #[error("{0}")]
    InvalidElementState(String),

    #[error("{0}")]
    InvalidCoordinates(String),

    /// The primitive ran and reported failure
    #[error("{0}")]
    ActionFailed(String),

    #[error("{0}")]
    Unknown(String),

    /// Automation session lost
    #[error("{0}")]
    Fatal(String),
}

/// Raised out of the dispatcher; the agent must stop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("fatal agent error: {0}")]
pub struct FatalError(pub String);

impl CommandError {
    pub fn missing(name: &str) -> Self {
        CommandError::InvalidRequest(format!("missing required parameter '{name}'"))
    }

    pub fn invalid_param(name: &str, expected: &str) -> Self {
        CommandError::InvalidRequest(format!("parameter '{name}' must be {expected}"))
    }

    pub fn status(&self) -> WdStatus {
        match self {
            CommandError::InvalidRequest(_) => WdStatus::UnknownError,
            CommandError::UnknownCommand(_) => WdStatus::UnknownCommand,
            CommandError::InvalidSelector(_) => WdStatus::InvalidSelector,
            CommandError::NoSuchElement(_) => WdStatus::NoSuchElement,
            CommandError::StaleElement(_) => WdStatus::StaleElementReference,
            CommandError::InvalidElementState(_) => WdStatus::InvalidElementState,
            CommandError::InvalidCoordinates(_) => WdStatus::InvalidElementCoordinates,
            CommandError::ActionFailed(_) => WdStatus::UnknownError,
            CommandError::Unknown(_) => WdStatus::UnknownError,
            CommandError::Fatal(_) => WdStatus::UnknownError,
        }
    }

    /// Whether a driver may reasonably retry after the UI changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CommandError::NoSuchElement(_) | CommandError::StaleElement(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, CommandError::Fatal(_))
    }

    /// Envelope for a recoverable failure; fatal errors escape.
    pub fn into_result(self) -> Result<CommandResult, FatalError> {
        match self {
            CommandError::Fatal(message) => Err(FatalError(message)),
            other => Ok(CommandResult::failure(other.status(), other.to_string())),
        }
    }
}

impl From<DeviceError> for CommandError {
    fn from(err: DeviceError) -> Self {
        let message = err.to_string();
        match err {
            DeviceError::ServiceDisconnected => CommandError::Fatal(message),
            DeviceError::NotFound(_) => CommandError::NoSuchElement(message),
            DeviceError::InvalidCoordinates(_) => CommandError::InvalidCoordinates(message),
            DeviceError::Unsupported(_) | DeviceError::Internal(_) => {
                CommandError::Unknown(message)
            }
        }
    }
}

impl From<CacheError> for CommandError {
    fn from(err: CacheError) -> Self {
        let message = err.to_string();
        match err {
            CacheError::NotInHash(_) => CommandError::Unknown(message),
            CacheError::Stale(_) => CommandError::StaleElement(message),
            CacheError::Device(err) => err.into(),
        }
    }
}

impl From<LocatorError> for CommandError {
    fn from(err: LocatorError) -> Self {
        let message = err.to_string();
        match err {
            LocatorError::UnknownStrategy(_) => CommandError::UnknownCommand(message),
            LocatorError::UnsupportedStrategy(_) | LocatorError::InvalidSelector(_) => {
                CommandError::InvalidSelector(message)
            }
            LocatorError::ElementNotFound(_) => CommandError::NoSuchElement(message),
            LocatorError::Cache(err) => err.into(),
            LocatorError::Device(err) => err.into(),
        }
    }
}

impl From<ActionError> for CommandError {
    fn from(err: ActionError) -> Self {
        let message = err.to_string();
        match err {
            ActionError::InvalidCoordinates(_) => CommandError::InvalidCoordinates(message),
            ActionError::InvalidArgument(_) => CommandError::InvalidRequest(message),
            ActionError::NotSupported(_) => CommandError::Unknown(message),
            ActionError::ActionFailed(_) => CommandError::ActionFailed(message),
            ActionError::Device(err) => err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_and_stale_key_map_apart() {
        let unknown = CommandError::from(CacheError::NotInHash("9".into()));
        let stale = CommandError::from(CacheError::Stale("9".into()));
        assert_eq!(unknown.status(), WdStatus::UnknownError);
        assert_eq!(stale.status(), WdStatus::StaleElementReference);
        assert!(!unknown.is_retryable());
        assert!(stale.is_retryable());
    }

    #[test]
    fn disconnect_is_fatal_through_every_layer() {
        let direct = CommandError::from(DeviceError::ServiceDisconnected);
        let nested = CommandError::from(LocatorError::Cache(CacheError::Device(
            DeviceError::ServiceDisconnected,
        )));
        let action = CommandError::from(ActionError::Device(DeviceError::ServiceDisconnected));
        for err in [direct, nested, action] {
            assert!(err.is_fatal());
            assert!(err.into_result().is_err());
        }
    }

    #[test]
    fn strategy_errors_keep_their_messages() {
        let unsupported = CommandError::from(LocatorError::UnsupportedStrategy("css selector".into()));
        let result = unsupported.into_result().unwrap();
        assert_eq!(result.status, WdStatus::InvalidSelector);
        assert_eq!(
            result.value,
            "Sorry, we don't support the 'css selector' locator strategy yet"
        );

        let unknown = CommandError::from(LocatorError::UnknownStrategy("bogus".into()));
        assert_eq!(unknown.status(), WdStatus::UnknownCommand);
    }
}
