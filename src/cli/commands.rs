use clap::Subcommand;

use super::config::ConfigArgs;
use super::replay::ReplayArgs;
use super::serve::ServeArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Answer JSON commands from stdin, one result envelope per line on stdout
    Serve(ServeArgs),

    /// Run a script of commands against a screen fixture
    Replay(ReplayArgs),

    /// Inspect the agent configuration
    Config(ConfigArgs),
}
