use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stagehand", version, about = "Stage helper tools, archives and gems for an installer build")]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "stagehand.toml")]
    pub config: PathBuf,

    /// More output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download and unpack the tar and 7-Zip tools into stage/bin
    Provision,
    /// Unpack one archive that is already in the archives directory
    Extract {
        /// URL the archive was downloaded from
        url: String,
        /// Subdirectory of the stage to unpack into
        #[arg(long)]
        target: Option<String>,
        /// Only unpack zip entries matching this pattern
        #[arg(long)]
        regex: Option<String>,
    },
    /// Install gems into the staged runtime
    Gems {
        /// Gems to install; the configured ones when empty
        names: Vec<String>,
    },
    /// Provision tools, fetch and unpack every package, then install gems
    Install,
}
