//! Command dispatch: bridges CLI args -> session operations -> output formatting.

pub mod command;
pub mod shutdown;
pub mod status;
pub mod util;
pub mod venues;

use clap::ValueEnum;

use hallctl_config::Config;
use hallctl_core::{Session, Venue};

use crate::cli::{ColorMode, Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Resolved global settings plus the loaded configuration.
pub struct AppContext {
    pub config: Config,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

impl AppContext {
    /// Flags win over `[defaults]` in the config file.
    pub fn new(global: &GlobalOpts, config: Config) -> Self {
        let output = global
            .output
            .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let color = global
            .color
            .or_else(|| ColorMode::from_str(&config.defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);

        Self {
            config,
            output,
            color: output::should_color(color),
            quiet: global.quiet,
            yes: global.yes,
        }
    }

    /// Validated venue registry. An empty registry is an error.
    pub fn venues(&self) -> Result<Vec<Venue>, CliError> {
        let venues = self.config.resolve_venues()?;
        if venues.is_empty() {
            return Err(CliError::NoVenues {
                path: hallctl_config::config_path().display().to_string(),
            });
        }
        Ok(venues)
    }

    /// Open a session against the configured backend.
    pub fn session(&self) -> Result<Session, CliError> {
        let session_config = self.config.session_config()?;
        Ok(Session::new(&session_config, self.venues()?)?)
    }
}

/// Dispatch a configured command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &AppContext) -> Result<(), CliError> {
    match cmd {
        Command::Venues => venues::handle(ctx),
        Command::Status(args) => status::handle(ctx, args).await,
        Command::Shutdown(args) => shutdown::handle(ctx, args).await,
        Command::Command(args) => command::handle(ctx, args).await,
        // Completions are handled before configuration is loaded
        Command::Completions(_) => Ok(()),
    }
}
