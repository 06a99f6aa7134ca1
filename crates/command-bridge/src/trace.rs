use tracing::{span, Level, Span};

use crate::model::Command;

#[derive(Clone, Default)]
pub struct CommandTracer;

impl CommandTracer {
    pub fn span(&self, command: &Command) -> Span {
        let element = command.element_key().map(|key| key.to_string());
        span!(
            target: "command",
            Level::INFO,
            "command",
            action = %command.action,
            element = element.as_deref().unwrap_or("-")
        )
    }
}
