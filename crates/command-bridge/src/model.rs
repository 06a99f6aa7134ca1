//! Wire model: one command in, one result envelope out.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uiauto_core_types::ElementKey;

use crate::errors::CommandError;

/// A decoded request from the remote driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_element_id: Option<String>,
}

impl Command {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Self::default()
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn on(mut self, element: impl Into<String>) -> Self {
        self.element_id = Some(element.into());
        self
    }

    /// Element id from the envelope, falling back to `params.elementId`.
    /// Empty ids count as absent.
    pub fn element_key(&self) -> Option<ElementKey> {
        self.element_id
            .as_deref()
            .or_else(|| self.params.get("elementId").and_then(Value::as_str))
            .filter(|id| !id.is_empty())
            .map(ElementKey::from)
    }

    /// Destination element of a drag (`destElementId`, or `params.destElId`).
    pub fn dest_element_key(&self) -> Option<ElementKey> {
        self.dest_element_id
            .as_deref()
            .or_else(|| {
                ["destElId", "destElementId"]
                    .iter()
                    .find_map(|name| self.params.get(*name).and_then(Value::as_str))
            })
            .filter(|id| !id.is_empty())
            .map(ElementKey::from)
    }

    pub fn has(&self, name: &str) -> bool {
        self.params.get(name).is_some_and(|v| !v.is_null())
    }

    pub fn value(&self, name: &str) -> Result<&Value, CommandError> {
        self.params
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| CommandError::missing(name))
    }

    pub fn str(&self, name: &str) -> Result<&str, CommandError> {
        self.value(name)?
            .as_str()
            .ok_or_else(|| CommandError::invalid_param(name, "a string"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Numbers may arrive as JSON numbers or numeric strings.
    pub fn f64(&self, name: &str) -> Result<f64, CommandError> {
        let value = self.value(name)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| CommandError::invalid_param(name, "a number"))
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64, CommandError> {
        if self.has(name) {
            self.f64(name)
        } else {
            Ok(default)
        }
    }

    pub fn u32_or(&self, name: &str, default: u32) -> Result<u32, CommandError> {
        if !self.has(name) {
            return Ok(default);
        }
        let value = self.f64(name)?;
        if value < 0.0 || value > f64::from(u32::MAX) {
            return Err(CommandError::invalid_param(name, "a non-negative integer"));
        }
        Ok(value.round() as u32)
    }

    pub fn i32(&self, name: &str) -> Result<i32, CommandError> {
        let value = self.f64(name)?;
        if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
            return Err(CommandError::invalid_param(name, "an integer"));
        }
        Ok(value as i32)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, CommandError> {
        match self.params.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(CommandError::invalid_param(name, "a boolean")),
            },
            Some(_) => Err(CommandError::invalid_param(name, "a boolean")),
        }
    }

    /// Deserializes `params[name]` into `T`.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, CommandError> {
        serde_json::from_value(self.value(name)?.clone()).map_err(|e| {
            CommandError::InvalidRequest(format!("parameter '{name}' is malformed: {e}"))
        })
    }
}

/// JSON Wire status codes used in result envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum WdStatus {
    Success,
    NoSuchElement,
    UnknownCommand,
    StaleElementReference,
    InvalidElementState,
    UnknownError,
    InvalidElementCoordinates,
    InvalidSelector,
}

impl WdStatus {
    pub fn code(&self) -> i32 {
        match self {
            WdStatus::Success => 0,
            WdStatus::NoSuchElement => 7,
            WdStatus::UnknownCommand => 9,
            WdStatus::StaleElementReference => 10,
            WdStatus::InvalidElementState => 12,
            WdStatus::UnknownError => 13,
            WdStatus::InvalidElementCoordinates => 29,
            WdStatus::InvalidSelector => 32,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WdStatus::Success => "success",
            WdStatus::NoSuchElement => "no such element",
            WdStatus::UnknownCommand => "unknown command",
            WdStatus::StaleElementReference => "stale element reference",
            WdStatus::InvalidElementState => "invalid element state",
            WdStatus::UnknownError => "unknown error",
            WdStatus::InvalidElementCoordinates => "invalid element coordinates",
            WdStatus::InvalidSelector => "invalid selector",
        }
    }
}

impl From<WdStatus> for i32 {
    fn from(status: WdStatus) -> Self {
        status.code()
    }
}

impl TryFrom<i32> for WdStatus {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => WdStatus::Success,
            7 => WdStatus::NoSuchElement,
            9 => WdStatus::UnknownCommand,
            10 => WdStatus::StaleElementReference,
            12 => WdStatus::InvalidElementState,
            13 => WdStatus::UnknownError,
            29 => WdStatus::InvalidElementCoordinates,
            32 => WdStatus::InvalidSelector,
            other => return Err(format!("unknown status code {other}")),
        })
    }
}

impl fmt::Display for WdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// `{ "status": <int>, "value": <any> }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub status: WdStatus,
    #[serde(default)]
    pub value: Value,
}

impl CommandResult {
    pub fn success(value: Value) -> Self {
        Self {
            status: WdStatus::Success,
            value,
        }
    }

    pub fn failure(status: WdStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            value: Value::String(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == WdStatus::Success
    }
}
