//! Clap derive structures for the `hallctl` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hallctl -- operator console for cinema presentation venues
#[derive(Debug, Parser)]
#[command(
    name = "hallctl",
    version,
    about = "Monitor and control cinema venues from the command line",
    long_about = "Operator console for cinema presentation venues.\n\n\
        Shows live projector and audio status, sends device commands, and\n\
        runs the end-of-day shutdown sequence through the hall backend.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the config file
    #[arg(long, env = "HALLCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the configured venues
    #[command(alias = "halls", alias = "ls")]
    Venues,

    /// Show live status for a venue
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Run the shutdown sequence for a venue
    Shutdown(ShutdownArgs),

    /// Send a single device command to a venue
    #[command(alias = "cmd")]
    Command(CommandArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Subcommand arguments ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Venue id
    pub venue: String,

    /// Keep printing updates until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,
}

#[derive(Debug, Args)]
pub struct ShutdownArgs {
    /// Venue id
    pub venue: String,
}

#[derive(Debug, Args)]
pub struct CommandArgs {
    /// Venue id
    pub venue: String,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Subcommand)]
pub enum Action {
    /// Start playback
    Play,
    /// Stop playback
    Stop,
    /// Switch the projector lamp
    Lamp {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Switch the auditorium lights
    Light {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Open or close the dowser (shutter)
    Dowser {
        #[arg(value_enum)]
        state: Shutter,
    },
    /// Set the audio fader level (0-100)
    Level {
        value: u8,
        /// Apply even if the processor is in a locked state
        #[arg(long)]
        force: bool,
    },
    /// Mute or unmute audio
    Mute {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Select the audio input mode, e.g. `non_sync`
    Input { mode: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shutter {
    Open,
    Closed,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
