mod cli;
mod config;
mod download;
mod workflow;

use anyhow::{Context, Result};
use clap::Parser;
use stagehand_archive::Package;
use stagehand_platform::ShellExecutor;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::download::HttpDownloader;
use crate::workflow::Installer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;
    let downloader = HttpDownloader::new().context("failed to build the HTTP client")?;
    let shell = ShellExecutor::new(config.layout()?.bin());
    let mut installer = Installer::new(config, downloader, shell)?;

    match cli.command {
        Commands::Provision => installer.provision(),
        Commands::Extract { url, target, regex } => {
            let package = Package { url, target, regex };
            installer.extract(&package).map(drop)
        }
        Commands::Gems { names } => {
            let specs = installer
                .gem_specs(names)
                .context("no gems given and none configured")?;
            installer.gems(&specs)
        }
        Commands::Install => installer.install(),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
