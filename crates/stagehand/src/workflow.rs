use anyhow::{Context, Result};
use stagehand_archive::{
    Downloader, Extracted, ExtractionDispatcher, Package, Provisioned, StagingLayout,
    UtilityProvisioner,
};
use stagehand_gem::{GemBuilder, GemSpecs};
use stagehand_platform::{CommandRunner, ShellExecutor};
use tracing::info;

use crate::config::Config;

/// One installer run over a fixed staging layout.
pub struct Installer<D, R> {
    config: Config,
    layout: StagingLayout,
    downloader: D,
    shell: ShellExecutor<R>,
}

impl<D: Downloader, R: CommandRunner> Installer<D, R> {
    pub fn new(config: Config, downloader: D, shell: ShellExecutor<R>) -> Result<Self> {
        let layout = config.layout()?;
        Ok(Self {
            config,
            layout,
            downloader,
            shell,
        })
    }

    /// Make sure both helper tools are in `stage/bin`.
    pub fn provision(&mut self) -> Result<()> {
        let mut provisioner = UtilityProvisioner::new(&self.layout, &mut self.downloader);
        for provisioned in provisioner
            .ensure_toolset(&self.config.tools)
            .context("failed to provision helper tools")?
        {
            if let Provisioned::Installed(path) = provisioned {
                info!(path = %path.display(), "installed helper tool");
            }
        }
        Ok(())
    }

    /// Download `package` into the archives directory unless it is
    /// already there.
    pub fn fetch(&mut self, package: &Package) -> Result<()> {
        let file_name = package.file_name()?;
        let dest = self.layout.archive_path(&file_name);
        if dest.is_file() {
            info!(archive = %file_name, "already downloaded");
            return Ok(());
        }

        info!(url = %package.url, "downloading");
        self.downloader
            .download(&package.url, &dest)
            .map_err(|e| anyhow::anyhow!(e))
            .with_context(|| format!("failed to download '{}'", package.url))
    }

    pub fn extract(&mut self, package: &Package) -> Result<Extracted> {
        let extracted = ExtractionDispatcher::new(&self.layout, &self.config.tools)
            .extract(package, &mut self.shell)
            .with_context(|| format!("failed to extract '{}'", package.url))?;

        if let Some(entries) = extracted.entries() {
            info!(count = entries.len(), "unpacked zip entries into bin");
        }
        Ok(extracted)
    }

    pub fn gems(&mut self, specs: &GemSpecs) -> Result<()> {
        let runtime = self
            .config
            .runtime
            .as_ref()
            .context("`runtime` must be configured to install gems")?;
        GemBuilder::new(runtime)
            .build_gems(&mut self.shell, specs)
            .context("gem installation failed")
    }

    /// Configured gems, or `names` when given.
    pub fn gem_specs(&self, names: Vec<String>) -> Option<GemSpecs> {
        if names.is_empty() {
            self.config.gems.clone()
        } else {
            Some(GemSpecs::from(names))
        }
    }

    /// Tools, then every configured package in order, then gems.
    pub fn install(&mut self) -> Result<()> {
        self.provision()?;

        let packages = self.config.packages.clone();
        for package in &packages {
            self.fetch(package)?;
            self.extract(package)?;
        }

        if let Some(specs) = self.config.gems.clone().filter(|specs| !specs.is_empty()) {
            self.gems(&specs)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use stagehand_archive::{BoxError, Toolset, Utility};
    use stagehand_platform::{Captured, Command, CommandEnv};
    use zip::write::SimpleFileOptions;

    use super::*;

    /// Serves every URL as a zip containing one file named after the URL's
    /// last segment with the extension stripped.
    #[derive(Default)]
    struct ZipServer {
        fetched: Vec<String>,
    }

    impl Downloader for ZipServer {
        fn download(&mut self, url: &str, dest: &Path) -> Result<(), BoxError> {
            self.fetched.push(url.to_owned());
            let name = Path::new(url).file_stem().ok_or("no file name")?;
            let mut writer = zip::ZipWriter::new(fs::File::create(dest)?);
            writer.start_file(name.to_string_lossy(), SimpleFileOptions::default())?;
            writer.write_all(b"binary")?;
            writer.finish()?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Command>,
    }

    impl CommandRunner for Recorder {
        fn run(
            &mut self,
            command: &Command,
            _env: &CommandEnv,
        ) -> stagehand_platform::Result<Captured> {
            self.calls.push(command.clone());
            Ok(Captured {
                code: Some(0),
                ..Captured::default()
            })
        }
    }

    fn installer(root: &Path, gems: Option<GemSpecs>) -> Installer<ZipServer, Recorder> {
        let config = Config {
            archives: root.join("archives"),
            stage: root.join("stage"),
            runtime: Some(root.join("stage/ruby")),
            tools: Toolset {
                tar: Utility::new("https://example.org/bsdtar.zip", "bsdtar"),
                sevenzip: Utility::new("https://example.org/7za.zip", "7za"),
            },
            packages: vec![
                Package::new("https://example.org/ruby-1.9.3.7z").with_target("ruby"),
                Package::new("https://example.org/zlib.tar.gz"),
            ],
            gems,
        };
        let shell =
            ShellExecutor::with_runner(root.join("stage/bin"), CommandEnv::new(), Recorder::default());
        Installer::new(config, ZipServer::default(), shell).unwrap()
    }

    fn programs(installer: &Installer<ZipServer, Recorder>) -> Vec<PathBuf> {
        installer
            .shell
            .runner()
            .calls
            .iter()
            .map(|command| command.get_program().to_path_buf())
            .collect()
    }

    #[test]
    fn test_install_runs_every_step_in_order() {
        let root = tempfile::tempdir().unwrap();
        let mut installer = installer(root.path(), Some(GemSpecs::One("rake".into())));

        installer.install().unwrap();

        assert_eq!(
            installer.downloader.fetched,
            [
                "https://example.org/bsdtar.zip",
                "https://example.org/7za.zip",
                "https://example.org/ruby-1.9.3.7z",
                "https://example.org/zlib.tar.gz",
            ]
        );
        let bin = installer.layout.bin();
        assert_eq!(
            programs(&installer),
            [bin.join("7za"), bin.join("bsdtar"), root.path().join("stage/ruby/bin/gem")]
        );
    }

    #[test]
    fn test_second_install_downloads_nothing() {
        let root = tempfile::tempdir().unwrap();
        let mut installer = installer(root.path(), None);

        installer.install().unwrap();
        installer.downloader.fetched.clear();
        installer.install().unwrap();

        assert!(installer.downloader.fetched.is_empty());
    }

    #[test]
    fn test_gems_need_a_runtime() {
        let root = tempfile::tempdir().unwrap();
        let mut installer = installer(root.path(), None);
        installer.config.runtime = None;

        let err = installer.gems(&GemSpecs::One("rake".into())).unwrap_err();
        assert!(err.to_string().contains("runtime"));
    }

    #[test]
    fn test_named_gems_take_precedence() {
        let root = tempfile::tempdir().unwrap();
        let installer = installer(root.path(), Some(GemSpecs::One("rake".into())));

        assert_eq!(
            installer.gem_specs(vec!["bundler".into()]),
            Some(GemSpecs::List(vec!["bundler".into()]))
        );
        assert_eq!(installer.gem_specs(Vec::new()), Some(GemSpecs::One("rake".into())));
    }
}
