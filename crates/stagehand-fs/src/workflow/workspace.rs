use std::path::{Path, PathBuf};

use crate::primitives::{ReplaceDirOptions, clear_dir, replace_dir};
use crate::{Error, Result};

/// A scratch directory that either replaces `destination` on
/// [`commit`](Workspace::commit) or disappears when dropped.
///
/// Keep the staging path on the same filesystem as the destination so the
/// final step is a rename.
#[derive(Debug)]
pub struct Workspace {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl Workspace {
    /// Create a fresh, empty staging directory. Leftovers from an earlier
    /// interrupted run at the same path are removed first.
    pub fn new(staging_dir: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Self> {
        let staging_path = staging_dir.as_ref().to_path_buf();
        let destination_path = destination.as_ref().to_path_buf();

        clear_dir(&staging_path)?;
        std::fs::create_dir_all(&staging_path).map_err(|e| Error::Create {
            path: staging_path.clone(),
            source: e,
        })?;

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    pub fn commit(mut self) -> Result<()> {
        replace_dir(
            &self.staging_path,
            &self.destination_path,
            ReplaceDirOptions::default(),
        )?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed {
            let _ = std::fs::remove_dir_all(&self.staging_path);
        }
    }
}
