//! Dynamic selectors: `[option?, [[code, arg], ...], ...]`.
//!
//! Codes below 100 set one selector attribute; codes from 100 up are
//! finalizers that turn the located element into a value.

use device_adapter::{DeviceError, UiObject};
use serde_json::Value;
use uiauto_core_types::{NodeFlag, UiSelector};

use crate::errors::LocatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicMode {
    /// First element of the first selector that matches.
    First,
    /// Every match of every selector.
    All,
    /// Scroll a container until one of the selectors is visible.
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finalizer {
    /// Content description, falling back to text.
    Name,
    Text,
    ClassName,
}

impl Finalizer {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            100 => Some(Finalizer::Name),
            101 => Some(Finalizer::Text),
            102 => Some(Finalizer::ClassName),
            _ => None,
        }
    }

    pub async fn apply(&self, element: &dyn UiObject) -> Result<String, DeviceError> {
        match self {
            Finalizer::Name => {
                let desc = element.content_description().await?;
                if desc.is_empty() {
                    element.text().await
                } else {
                    Ok(desc)
                }
            }
            Finalizer::Text => element.text().await,
            Finalizer::ClassName => element.class_name().await,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicSelector {
    pub selector: UiSelector,
    pub finalizer: Option<Finalizer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicQuery {
    pub mode: DynamicMode,
    pub selectors: Vec<DynamicSelector>,
}

impl DynamicQuery {
    pub fn from_json(value: &Value) -> Result<Self, LocatorError> {
        let items = value
            .as_array()
            .ok_or_else(|| LocatorError::invalid("dynamic selector must be an array"))?;
        let (mode, rest) = match items.first() {
            Some(Value::String(option)) => {
                let mode = match option.to_ascii_lowercase().as_str() {
                    "all" => DynamicMode::All,
                    "scroll" => DynamicMode::Scroll,
                    other => {
                        return Err(LocatorError::invalid(format!(
                            "unknown dynamic selector option '{other}'"
                        )))
                    }
                };
                (mode, &items[1..])
            }
            _ => (DynamicMode::First, &items[..]),
        };
        if rest.is_empty() {
            return Err(LocatorError::invalid("dynamic selector has no selectors"));
        }
        let selectors = rest
            .iter()
            .map(build_selector)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mode, selectors })
    }

    pub fn predicates(&self) -> Vec<UiSelector> {
        self.selectors.iter().map(|s| s.selector.clone()).collect()
    }
}

fn build_selector(value: &Value) -> Result<DynamicSelector, LocatorError> {
    let pairs = value
        .as_array()
        .ok_or_else(|| LocatorError::invalid(format!("selector {value} is not an array of pairs")))?;
    let mut selector = UiSelector::new();
    let mut finalizer = None;
    for pair in pairs {
        let parts = pair
            .as_array()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| LocatorError::invalid(format!("selector pair {pair} is malformed")))?;
        let code = parts[0]
            .as_i64()
            .ok_or_else(|| LocatorError::invalid(format!("selector code {} is not an integer", parts[0])))?;
        if code >= 100 {
            finalizer = Some(Finalizer::from_code(code).ok_or_else(|| {
                LocatorError::invalid(format!("unknown finalizer {code}"))
            })?);
            continue;
        }
        selector = apply_code(selector, code, parts.get(1))?;
    }
    Ok(DynamicSelector {
        selector,
        finalizer,
    })
}

fn apply_code(sel: UiSelector, code: i64, arg: Option<&Value>) -> Result<UiSelector, LocatorError> {
    let text = || {
        arg.and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LocatorError::invalid(format!("selector code {code} expects a string")))
    };
    let flag = |f: NodeFlag| {
        arg.and_then(Value::as_bool)
            .map(|v| (f, v))
            .ok_or_else(|| LocatorError::invalid(format!("selector code {code} expects a boolean")))
    };
    let number = || {
        arg.and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| LocatorError::invalid(format!("selector code {code} expects an integer")))
    };
    let with_flag = |sel: UiSelector, f: NodeFlag| -> Result<UiSelector, LocatorError> {
        let (f, v) = flag(f)?;
        Ok(sel.flag(f, v))
    };
    Ok(match code {
        1 => sel.text(text()?),
        2 => sel.text_starts_with(text()?),
        3 => sel.text_contains(text()?),
        4 => sel.class_name(text()?),
        5 => sel.description(text()?),
        6 => sel.description_starts_with(text()?),
        7 => sel.description_contains(text()?),
        8 => sel.index(number()?),
        9 => sel.instance(number()?),
        10 => with_flag(sel, NodeFlag::Enabled)?,
        11 => with_flag(sel, NodeFlag::Focused)?,
        12 => with_flag(sel, NodeFlag::Focusable)?,
        13 => with_flag(sel, NodeFlag::Scrollable)?,
        14 => with_flag(sel, NodeFlag::Clickable)?,
        15 => with_flag(sel, NodeFlag::Checked)?,
        16 => with_flag(sel, NodeFlag::Selected)?,
        18 => sel.package_name(text()?),
        24 => with_flag(sel, NodeFlag::LongClickable)?,
        25 => sel.text_matches(text()?),
        26 => sel.class_name_matches(text()?),
        27 => sel.description_matches(text()?),
        28 => sel.package_name_matches(text()?),
        29 => sel.resource_id(text()?),
        30 => with_flag(sel, NodeFlag::Checkable)?,
        31 => sel.resource_id_matches(text()?),
        other => {
            return Err(LocatorError::invalid(format!(
                "unsupported dynamic selector code {other}"
            )))
        }
    })
}
