//! Clap derive structures for the `vrmlink` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vrmlink -- VRM cloud to MQTT telemetry bridge
#[derive(Debug, Parser)]
#[command(
    name = "vrmlink",
    version,
    about = "Bridge Victron VRM cloud telemetry to a local MQTT broker",
    long_about = "Polls the Victron Energy VRM cloud API on an interval and \
        republishes each device's telemetry as JSON messages on an MQTT \
        topic tree, with retained online/offline liveness announcements.",
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
    /// Path to the TOML settings file
    #[arg(long, env = "VRM_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bridge: poll VRM and republish to MQTT until interrupted
    Run,

    /// Inspect configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the resolved settings with secrets redacted
    Show,
}
