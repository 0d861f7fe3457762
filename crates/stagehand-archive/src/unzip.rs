use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::layout::StagingLayout;
use crate::package::Package;

/// In-process zip reader.
///
/// This is the bootstrap path: it needs no external tool, so it is what
/// unpacks the helper tools themselves. Entries always land in
/// `stage/bin`, whatever the package's `target` says.
#[derive(Clone, Copy, Debug)]
pub struct ZipExtractor<'a> {
    layout: &'a StagingLayout,
}

impl<'a> ZipExtractor<'a> {
    pub fn new(layout: &'a StagingLayout) -> Self {
        Self { layout }
    }

    /// Unpack `archives/<file name>` of `package` into `stage/bin`.
    ///
    /// Returns the names of the processed entries in archive order.
    pub fn extract_zip(&self, package: &Package) -> Result<Vec<String>> {
        let file_name = package.file_name()?;
        let pattern = package.pattern()?;
        self.extract_from(&self.layout.archive_path(&file_name), pattern.as_ref())
    }

    /// Unpack the zip at `archive` into `stage/bin`, keeping only entries
    /// whose name matches `pattern` when one is given.
    ///
    /// Each entry is written to a scratch directory inside the stage and
    /// then moved over any existing file of the same name. Entries moved
    /// before a failure stay where they are.
    pub fn extract_from(&self, archive: &Path, pattern: Option<&Regex>) -> Result<Vec<String>> {
        info!(archive = %archive.display(), "extracting zip contents");

        let read_error = |source: ZipError| Error::ArchiveRead {
            archive: archive.to_path_buf(),
            source,
        };

        let file = File::open(archive).map_err(|e| read_error(ZipError::Io(e)))?;
        let mut zip = ZipArchive::new(BufReader::new(file)).map_err(read_error)?;

        let bin = self.layout.bin();
        fs::create_dir_all(&bin).map_err(Error::io(&bin))?;
        let scratch = tempfile::Builder::new()
            .prefix(".unzip-")
            .tempdir_in(self.layout.stage())
            .map_err(Error::io(self.layout.stage()))?;

        let mut files = Vec::new();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(read_error)?;
            let name = entry.name().to_owned();

            if pattern.is_some_and(|pattern| !pattern.is_match(&name)) {
                continue;
            }

            let relative = entry.enclosed_name().ok_or_else(|| Error::UnsafeEntry {
                archive: archive.to_path_buf(),
                entry: name.clone(),
            })?;
            let dest = bin.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest).map_err(Error::io(&dest))?;
                files.push(name);
                continue;
            }

            let staged = scratch.path().join(&relative);
            if let Some(parent) = staged.parent() {
                fs::create_dir_all(parent).map_err(Error::io(parent))?;
            }
            let mut out = File::create(&staged).map_err(Error::io(&staged))?;
            io::copy(&mut entry, &mut out).map_err(Error::io(&staged))?;
            drop(out);

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&staged, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(Error::io(&staged))?;
            }

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(Error::io(parent))?;
            }
            if dest.is_file() {
                fs::remove_file(&dest).map_err(Error::io(&dest))?;
            }
            fs::rename(&staged, &dest).map_err(Error::io(&dest))?;

            debug!(entry = %name, dest = %dest.display(), "staged zip entry");
            files.push(name);
        }

        Ok(files)
    }
}
