use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{BoxError, Error, Result};
use crate::format::ArchiveFormat;
use crate::layout::StagingLayout;
use crate::package::{Toolset, Utility, file_name_from_url};
use crate::unzip::ZipExtractor;

/// Fetches the bytes behind a URL into a local file.
pub trait Downloader {
    fn download(&mut self, url: &str, dest: &Path) -> std::result::Result<(), BoxError>;
}

impl<D: Downloader + ?Sized> Downloader for &mut D {
    fn download(&mut self, url: &str, dest: &Path) -> std::result::Result<(), BoxError> {
        (**self).download(url, dest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provisioned {
    /// The executable was already in `stage/bin`.
    AlreadyPresent(PathBuf),
    /// Downloaded and unpacked by this call.
    Installed(PathBuf),
}

impl Provisioned {
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyPresent(path) | Self::Installed(path) => path,
        }
    }
}

/// Installs helper tools into `stage/bin`, each at most once.
///
/// Tool archives are always unpacked with the in-process zip reader. The
/// external tools cannot be used here since they are what is being
/// installed.
#[derive(Debug)]
pub struct UtilityProvisioner<'a, D> {
    layout: &'a StagingLayout,
    downloader: D,
}

impl<'a, D: Downloader> UtilityProvisioner<'a, D> {
    pub fn new(layout: &'a StagingLayout, downloader: D) -> Self {
        Self { layout, downloader }
    }

    pub fn downloader(&self) -> &D {
        &self.downloader
    }

    pub fn ensure_utility(&mut self, utility: &Utility) -> Result<Provisioned> {
        let binary = utility.path_in(self.layout);
        if binary.is_file() {
            debug!(binary = %binary.display(), "utility already present");
            return Ok(Provisioned::AlreadyPresent(binary));
        }

        let file_name = file_name_from_url(&utility.url)?;
        if ArchiveFormat::classify(&file_name) != Some(ArchiveFormat::Zip) {
            return Err(Error::UnsupportedFormat { file: file_name });
        }

        let stage = self.layout.stage();
        fs::create_dir_all(stage).map_err(Error::io(stage))?;

        let download = stage.join(&file_name);
        if download.exists() {
            fs::remove_file(&download).map_err(Error::io(&download))?;
        }

        info!(url = %utility.url, binary = %utility.binary, "downloading utility");
        self.downloader
            .download(&utility.url, &download)
            .map_err(|source| download_error(utility, &download, source))?;
        if !download.is_file() {
            return Err(download_error(
                utility,
                &download,
                "no file was written".into(),
            ));
        }

        ZipExtractor::new(self.layout).extract_from(&download, None)?;
        fs::remove_file(&download).map_err(Error::io(&download))?;

        if !binary.is_file() {
            return Err(Error::MissingBinary {
                url: utility.url.clone(),
                path: binary,
            });
        }

        info!(binary = %binary.display(), "utility installed");
        Ok(Provisioned::Installed(binary))
    }

    /// Tar tool first, then 7-Zip.
    pub fn ensure_toolset(&mut self, tools: &Toolset) -> Result<[Provisioned; 2]> {
        Ok([
            self.ensure_utility(&tools.tar)?,
            self.ensure_utility(&tools.sevenzip)?,
        ])
    }
}

fn download_error(utility: &Utility, dest: &Path, source: BoxError) -> Error {
    Error::Download {
        url: utility.url.clone(),
        dest: dest.to_path_buf(),
        source,
    }
}
