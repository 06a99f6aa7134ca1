//! Agent tunables, loaded once at startup.

use std::path::PathBuf;
use std::time::Duration;

use action_primitives::{GestureConfig, DEFAULT_MAX_GESTURE_DURATION, DEFAULT_MAX_GESTURE_STEPS};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uiauto_registry::DEFAULT_MAX_ENUMERATION;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("setting '{field}' {problem}")]
pub struct SettingsError {
    pub field: &'static str,
    pub problem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Initial value of the hierarchy compression toggle.
    pub compressed_layout: bool,
    /// JSON object of application string resources.
    pub strings_path: Option<PathBuf>,
    /// Qualifies bare resource ids as `<package>:id/<name>`.
    pub app_package: Option<String>,
    pub long_press_ms: u64,
    pub wait_for_idle_ms: u64,
    /// Upper bound on instance probing when enumerating matches.
    pub max_enumeration: u32,
    pub swipe_steps_per_sec: u32,
    pub drag_steps_per_sec: u32,
    /// Upper bound on drag, swipe, flick and pinch steps.
    pub max_gesture_steps: u32,
    /// Longest long-press or sampled gesture, in milliseconds.
    pub max_gesture_ms: u64,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            compressed_layout: false,
            strings_path: None,
            app_package: None,
            long_press_ms: 2000,
            wait_for_idle_ms: 10_000,
            max_enumeration: DEFAULT_MAX_ENUMERATION,
            swipe_steps_per_sec: 28,
            drag_steps_per_sec: 40,
            max_gesture_steps: DEFAULT_MAX_GESTURE_STEPS,
            max_gesture_ms: DEFAULT_MAX_GESTURE_DURATION.as_millis() as u64,
        }
    }
}

impl AgentSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("long_press_ms", self.long_press_ms),
            ("wait_for_idle_ms", self.wait_for_idle_ms),
            ("max_enumeration", u64::from(self.max_enumeration)),
            ("swipe_steps_per_sec", u64::from(self.swipe_steps_per_sec)),
            ("drag_steps_per_sec", u64::from(self.drag_steps_per_sec)),
            ("max_gesture_steps", u64::from(self.max_gesture_steps)),
            ("max_gesture_ms", self.max_gesture_ms),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(SettingsError {
                field,
                problem: "must be greater than zero".to_string(),
            });
        }
        if self.long_press_ms > self.max_gesture_ms {
            return Err(SettingsError {
                field: "long_press_ms",
                problem: format!("must not exceed max_gesture_ms ({})", self.max_gesture_ms),
            });
        }
        if let Some(package) = &self.app_package {
            if package.trim().is_empty() || package.contains(char::is_whitespace) {
                return Err(SettingsError {
                    field: "app_package",
                    problem: format!("'{package}' is not a package name"),
                });
            }
        }
        Ok(())
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn wait_for_idle(&self) -> Duration {
        Duration::from_millis(self.wait_for_idle_ms)
    }

    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            long_press: self.long_press(),
            swipe_steps_per_sec: self.swipe_steps_per_sec,
            drag_steps_per_sec: self.drag_steps_per_sec,
            max_steps: self.max_gesture_steps,
            max_duration: Duration::from_millis(self.max_gesture_ms),
        }
    }
}
