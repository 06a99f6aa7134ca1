//! uiauto agent library
//!
//! Configuration loading, the stdio command loop and script replay, exposed
//! for the binary and for integration testing.

pub mod cli;
pub mod config;
pub mod session;

pub use config::{AgentConfig, LoadedConfig, LogFormat, LoggingConfig};
pub use session::{build_dispatcher, load_screen, serve_lines};
