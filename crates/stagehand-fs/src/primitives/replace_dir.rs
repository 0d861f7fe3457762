use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::{Error, Result};

/// Retry policy for [`replace_dir`] on Windows, where a directory can stay
/// locked for a moment after a child process exits. Unix renames once.
#[derive(Clone, Copy, Debug)]
pub struct ReplaceDirOptions {
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for ReplaceDirOptions {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Remove `path` and everything below it if it is a directory.
///
/// Returns whether anything was removed.
pub fn clear_dir(path: impl AsRef<Path>) -> Result<bool> {
    let path = path.as_ref();
    if !path.is_dir() {
        return Ok(false);
    }
    debug!(path = %path.display(), "removing previous contents");
    std::fs::remove_dir_all(path).map_err(|source| Error::Remove {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Move the directory `src` to `dest`, replacing whatever `dest` held.
///
/// `src` and `dest` must live on the same filesystem.
pub fn replace_dir(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    #[cfg_attr(unix, allow(unused_variables))] options: ReplaceDirOptions,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| Error::Create {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    #[cfg(unix)]
    {
        clear_dir(dest)?;
        std::fs::rename(src, dest).map_err(|e| Error::ReplaceDir {
            path: dest.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        use std::thread;
        let mut attempts = 0;
        loop {
            if dest.exists()
                && let Err(e) = std::fs::remove_dir_all(dest)
            {
                attempts += 1;
                if attempts >= options.retry_count {
                    return Err(Error::Remove {
                        path: dest.to_path_buf(),
                        source: e,
                    });
                }
                thread::sleep(options.retry_delay * attempts);
                continue;
            }

            match std::fs::rename(src, dest) {
                Ok(_) => return Ok(()),
                Err(e) => {
                    attempts += 1;
                    if attempts >= options.retry_count {
                        return Err(Error::ReplaceDir {
                            path: dest.to_path_buf(),
                            source: e,
                        });
                    }
                    thread::sleep(options.retry_delay * attempts);
                }
            }
        }
    }
}
