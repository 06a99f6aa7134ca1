//! Application string resources used as a locator fallback.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::errors::DeviceError;

pub trait StringResources: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Key/value string table, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StringTable {
    entries: RwLock<BTreeMap<String, String>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a flat JSON object of string values. Non-string values are
    /// rendered with their JSON text.
    pub fn from_json(raw: &str) -> Result<Self, DeviceError> {
        let table = Self::new();
        table.replace_json(raw)?;
        Ok(table)
    }

    pub fn replace_json(&self, raw: &str) -> Result<usize, DeviceError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| DeviceError::Internal(format!("invalid strings json: {e}")))?;
        let object = value
            .as_object()
            .ok_or_else(|| DeviceError::Internal("strings json must be an object".into()))?;
        let entries: BTreeMap<String, String> = object
            .iter()
            .map(|(k, v)| {
                let text = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), text)
            })
            .collect();
        let count = entries.len();
        *self.entries.write() = entries;
        Ok(count)
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.read().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl StringResources for StringTable {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}
