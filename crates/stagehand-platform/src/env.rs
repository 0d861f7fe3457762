use std::collections::BTreeMap;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const PATH_VAR: &str = "PATH";

fn paths_equal(p1: &Path, p2: &Path) -> bool {
    fn normalize(p: &Path) -> String {
        p.to_string_lossy().trim_end_matches(['/', '\\']).to_string()
    }
    #[cfg(target_os = "windows")]
    {
        normalize(p1).eq_ignore_ascii_case(&normalize(p2))
    }
    #[cfg(not(target_os = "windows"))]
    {
        normalize(p1) == normalize(p2)
    }
}

/// Edits a search path list without touching any environment.
#[derive(Debug, Clone, Default)]
pub struct PathModifier {
    paths: Vec<PathBuf>,
}

impl PathModifier {
    pub fn parse(value: Option<&OsStr>) -> Self {
        Self {
            paths: value
                .map(|v| env::split_paths(v).collect())
                .unwrap_or_default(),
        }
    }

    pub fn prepend(mut self, path: PathBuf) -> Self {
        if !self.contains(&path) {
            self.paths.insert(0, path);
        }
        self
    }

    pub fn remove(mut self, path: &Path) -> Self {
        self.paths.retain(|p| !paths_equal(p, path));
        self
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| paths_equal(p, path))
    }

    pub fn build(self) -> Result<OsString> {
        env::join_paths(self.paths).map_err(|_| Error::JoinPaths)
    }
}

/// Environment handed to every child process.
///
/// Mutations here never leak into the parent process, which keeps the
/// search-path and package-root handling testable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl CommandEnv {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: env::vars_os().collect(),
        }
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn set(&mut self, key: impl Into<OsString>, value: impl Into<OsString>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: impl AsRef<OsStr>) -> Option<OsString> {
        self.vars.remove(key.as_ref())
    }

    pub fn contains_key(&self, key: impl AsRef<OsStr>) -> bool {
        self.vars.contains_key(key.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    pub fn path_contains(&self, dir: &Path) -> bool {
        PathModifier::parse(self.get(PATH_VAR)).contains(dir)
    }

    /// Put `dir` in front of `PATH`. Does nothing if it is already listed.
    pub fn prepend_path(&mut self, dir: &Path) -> Result<()> {
        if self.path_contains(dir) {
            return Ok(());
        }
        let joined = PathModifier::parse(self.get(PATH_VAR))
            .prepend(dir.to_path_buf())
            .build()?;
        self.set(PATH_VAR, joined);
        Ok(())
    }
}
