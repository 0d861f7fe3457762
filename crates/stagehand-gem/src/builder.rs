use std::path::{Path, PathBuf};

use stagehand_platform::{Command, CommandRunner, ShellExecutor};
use tracing::info;

use crate::error::{Error, Result};
use crate::spec::{GemOptions, GemSpecs};

/// Variables that point RubyGems at a gem repository.
const GEM_ROOT_VARS: [&str; 2] = ["GEM_HOME", "GEM_PATH"];

/// Installs gems with the `gem` executable of one Ruby runtime.
#[derive(Clone, Debug)]
pub struct GemBuilder {
    runtime: PathBuf,
}

impl GemBuilder {
    pub fn new(runtime: impl Into<PathBuf>) -> Self {
        Self {
            runtime: runtime.into(),
        }
    }

    pub fn runtime(&self) -> &Path {
        &self.runtime
    }

    pub fn gem_executable(&self) -> PathBuf {
        self.runtime.join("bin").join("gem")
    }

    /// `<runtime>/bin/gem install <name> [-v<version>] --no-document [args…]`
    pub fn command(&self, name: &str, options: &GemOptions) -> Command {
        let mut command = Command::new(self.gem_executable()).args(["install", name]);
        if let Some(version) = &options.version {
            command = command.joined_arg("-v", version);
        }
        command.arg("--no-document").args(&options.args)
    }

    /// Install one gem. `GEM_HOME` and `GEM_PATH` are dropped from the
    /// executor's environment first and stay dropped afterwards.
    pub fn build_gem<R: CommandRunner>(
        &self,
        shell: &mut ShellExecutor<R>,
        name: &str,
        options: &GemOptions,
    ) -> Result<()> {
        info!(gem = name, version = options.version.as_deref(), "installing gem");

        for var in GEM_ROOT_VARS {
            shell.env_mut().remove(var);
        }

        shell
            .run(&self.command(name, options))
            .map_err(|source| Error::Install {
                gem: name.to_owned(),
                source,
            })?;
        Ok(())
    }

    /// Install every gem in `specs` in order, stopping at the first failure.
    pub fn build_gems<R: CommandRunner>(
        &self,
        shell: &mut ShellExecutor<R>,
        specs: &GemSpecs,
    ) -> Result<()> {
        for (name, options) in specs.entries() {
            self.build_gem(shell, name, &options)?;
        }
        Ok(())
    }
}
