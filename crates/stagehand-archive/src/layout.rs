use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Fixed directory layout of one installer run.
///
/// Extraction only ever reads from `archives`; everything it produces
/// lands under `stage`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StagingLayout {
    archives: PathBuf,
    stage: PathBuf,
}

/// Stage subdirectory that holds the provisioned helper tools.
const BIN_DIR: &str = "bin";

impl StagingLayout {
    /// Builds a layout from paths taken as-is.
    ///
    /// External tools run with the stage as their working directory, so
    /// relative paths here would be resolved twice. Use [`resolve`] for
    /// paths that may be relative.
    ///
    /// [`resolve`]: StagingLayout::resolve
    pub fn new(archives: impl Into<PathBuf>, stage: impl Into<PathBuf>) -> Self {
        Self {
            archives: archives.into(),
            stage: stage.into(),
        }
    }

    /// Builds a layout with both paths made absolute against the current
    /// directory.
    pub fn resolve(archives: impl AsRef<Path>, stage: impl AsRef<Path>) -> Result<Self> {
        let absolute = |path: &Path| std::path::absolute(path).map_err(Error::io(path));
        Ok(Self::new(
            absolute(archives.as_ref())?,
            absolute(stage.as_ref())?,
        ))
    }

    pub fn archives(&self) -> &Path {
        &self.archives
    }

    pub fn stage(&self) -> &Path {
        &self.stage
    }

    /// Helper executables and zip-bootstrapped files.
    pub fn bin(&self) -> PathBuf {
        self.stage.join(BIN_DIR)
    }

    pub fn archive_path(&self, file_name: &str) -> PathBuf {
        self.archives.join(file_name)
    }

    /// Where a package's contents belong: the stage root, or a
    /// subdirectory of it when `target` is given.
    ///
    /// `bin` itself is refused since extraction clears the target first.
    /// Subdirectories of `bin` are allowed.
    pub fn target_path(&self, target: Option<&str>) -> Result<PathBuf> {
        let Some(target) = target else {
            return Ok(self.stage.clone());
        };

        let mut relative = PathBuf::new();
        for component in Path::new(target).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(Error::InvalidTarget {
                        target: target.to_owned(),
                    });
                }
            }
        }

        if relative == Path::new(BIN_DIR) {
            return Err(Error::ReservedTarget {
                target: target.to_owned(),
            });
        }

        if relative.as_os_str().is_empty() {
            Ok(self.stage.clone())
        } else {
            Ok(self.stage.join(relative))
        }
    }
}
