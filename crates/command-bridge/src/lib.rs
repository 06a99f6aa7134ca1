//! Command bridge for the on-device automation agent
//!
//! Decodes commands from the remote driver, routes each one by action name
//! to a [`CommandHandler`], and wraps the outcome in a JSON Wire status
//! envelope. Handlers share one [`AgentContext`]: the device, the element
//! cache, the selector resolver and the gesture synthesizer.

pub mod context;
pub mod dispatcher;
pub mod errors;
pub mod handler;
pub mod handlers;
pub mod model;
pub mod settings;
pub mod trace;

pub use context::AgentContext;
pub use dispatcher::{encode, Dispatcher};
pub use errors::{CommandError, FatalError};
pub use handler::{CommandHandler, HandlerRegistry};
pub use model::{Command, CommandResult, WdStatus};
pub use settings::{AgentSettings, SettingsError};
pub use trace::CommandTracer;
