use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "gatewayctl")]
#[command(about = "Open and close clients through the audio server gateway")]
#[command(version)]
pub struct Cli {
    /// Directory holding gateway.toml (defaults to the user config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Directory for gatewayctl.log (defaults to the user data dir)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open each named client, report on it, then close it
    Probe(ProbeArgs),

    /// Print the effective gateway configuration as TOML
    Config,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Client names to open, in order
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Do not start a server if none is running
    #[arg(long)]
    pub no_start: bool,

    /// Fail instead of renaming on a name collision
    #[arg(long)]
    pub exact: bool,

    /// Server to attach to
    #[arg(long)]
    pub server: Option<String>,

    /// Session id to register the clients under
    #[arg(long)]
    pub session: Option<String>,

    /// Keep the clients open this long before closing them
    #[arg(long, default_value = "0")]
    pub hold_ms: u64,
}
