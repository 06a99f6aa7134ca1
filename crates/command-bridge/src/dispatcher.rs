use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, error, warn, Instrument};

use crate::context::AgentContext;
use crate::errors::{CommandError, FatalError};
use crate::handler::HandlerRegistry;
use crate::model::{Command, CommandResult, WdStatus};
use crate::trace::CommandTracer;

/// Runs one command at a time against the shared [`AgentContext`].
pub struct Dispatcher {
    context: Arc<AgentContext>,
    registry: HandlerRegistry,
    tracer: CommandTracer,
}

impl Dispatcher {
    pub fn new(context: Arc<AgentContext>, registry: HandlerRegistry) -> Self {
        Self {
            context,
            registry,
            tracer: CommandTracer,
        }
    }

    pub fn context(&self) -> &Arc<AgentContext> {
        &self.context
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Every failure becomes a result envelope except a lost automation
    /// session, which is returned as [`FatalError`].
    pub async fn dispatch(&self, command: Command) -> Result<CommandResult, FatalError> {
        let span = self.tracer.span(&command);
        let Some(handler) = self.registry.get(&command.action) else {
            warn!(parent: &span, action = %command.action, "no handler registered");
            return Ok(CommandResult::failure(
                WdStatus::UnknownCommand,
                format!("Unknown command: {}", command.action),
            ));
        };

        let context = self.context.clone();
        let task = tokio::spawn(
            async move { handler.execute(&context, &command).await }.instrument(span.clone()),
        );
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join) => Err(CommandError::Unknown(panic_message(join))),
        };

        span.in_scope(|| match outcome {
            Ok(value) => {
                debug!("command succeeded");
                Ok(CommandResult::success(value))
            }
            Err(err) if err.is_fatal() => {
                error!(error = %err, "automation session lost");
                err.into_result()
            }
            Err(err) => {
                warn!(status = err.status().code(), error = %err, "command failed");
                err.into_result()
            }
        })
    }

    /// Line-level entry point: decodes one JSON command and encodes the
    /// result envelope.
    pub async fn dispatch_json(&self, raw: &str) -> Result<String, FatalError> {
        let result = match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.dispatch(command).await?,
            Err(err) => {
                warn!(error = %err, "undecodable command");
                CommandResult::failure(WdStatus::UnknownError, format!("Invalid command: {err}"))
            }
        };
        Ok(encode(&result))
    }
}

pub fn encode(result: &CommandResult) -> String {
    serde_json::to_string(result).unwrap_or_else(|err| {
        let fallback = CommandResult::failure(WdStatus::UnknownError, err.to_string());
        serde_json::json!({ "status": fallback.status.code(), "value": fallback.value })
            .to_string()
    })
}

fn panic_message(join: JoinError) -> String {
    if !join.is_panic() {
        return format!("command task did not finish: {join}");
    }
    let payload = join.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());
    format!("Unknown error: {detail}")
}
