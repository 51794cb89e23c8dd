//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Scene keeper - offline administration of scene presets and tool groups.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "sk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SK_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, short = 'c', global = true, env = "SK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and manage saved scene presets
    #[command(subcommand)]
    Presets(PresetsCommand),

    /// Inspect and toggle tool groups
    #[command(subcommand)]
    Tools(ToolsCommand),

    /// Show effective settings
    Config(ConfigArgs),

    /// Show version and build information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum PresetsCommand {
    /// List saved presets
    List {
        /// Only presets captured from this scene
        #[arg(long, short = 's')]
        scene: Option<String>,
    },

    /// Show a preset with its source list
    Show { name: String },

    /// Rename a preset
    Rename { old_name: String, new_name: String },

    /// Delete a preset
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ToolsCommand {
    /// List tool groups
    List {
        /// Include disabled groups
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Show group configuration
    Show {
        /// Only this group
        group: Option<String>,

        /// Include each group's tool names
        #[arg(long, short = 't')]
        tools: bool,
    },

    /// Enable or disable a group
    Set {
        group: String,

        state: Toggle,

        /// Change only this process's view; do not write to the store
        #[arg(long)]
        no_persist: bool,
    },
}

/// Desired group state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    #[must_use]
    pub const fn enabled(self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print only the settings file path
    #[arg(long)]
    pub path: bool,
}
