use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Toml};
use figment::{Figment, Provider};
use serde::Deserialize;
use stagehand_archive::{Package, StagingLayout, Toolset};
use stagehand_gem::GemSpecs;

const ENV_PREFIX: &str = "STAGEHAND_";

/// Contents of `stagehand.toml`.
///
/// Any key but `gems` can be overridden from the environment, e.g.
/// `STAGEHAND_STAGE` or `STAGEHAND_TOOLS__SEVENZIP__URL`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_archives")]
    pub archives: PathBuf,
    #[serde(default = "default_stage")]
    pub stage: PathBuf,
    /// Ruby runtime whose `bin/gem` installs gems.
    #[serde(default)]
    pub runtime: Option<PathBuf>,
    pub tools: Toolset,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(skip)]
    pub gems: Option<GemSpecs>,
}

#[derive(Deserialize)]
struct GemSection {
    #[serde(default)]
    gems: Option<GemSpecs>,
}

fn default_archives() -> PathBuf {
    PathBuf::from("archives")
}

fn default_stage() -> PathBuf {
    PathBuf::from("stage")
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration '{}'", path.display()))?;
        Self::parse(&source, Env::prefixed(ENV_PREFIX).split("__"))
            .with_context(|| format!("invalid configuration '{}'", path.display()))
    }

    pub fn parse(source: &str, overrides: impl Provider) -> Result<Self> {
        let mut config: Self = Figment::new()
            .merge(Toml::string(source))
            .merge(overrides)
            .extract()?;

        // figment sorts table keys; gems install in file order
        config.gems = toml::from_str::<GemSection>(source)?.gems;
        Ok(config)
    }

    /// The staging layout, resolved against the current directory.
    pub fn layout(&self) -> Result<StagingLayout> {
        StagingLayout::resolve(&self.archives, &self.stage)
            .context("failed to resolve the staging directories")
    }
}
