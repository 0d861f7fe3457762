use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::layout::StagingLayout;

/// One archive to unpack into the stage.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Package {
    pub url: String,
    /// Subdirectory of the stage root; the stage root itself when absent.
    #[serde(default)]
    pub target: Option<String>,
    /// Restricts which zip entries are extracted (native zip path only).
    #[serde(default)]
    pub regex: Option<String>,
}

impl Package {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            target: None,
            regex: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    pub fn file_name(&self) -> Result<String> {
        file_name_from_url(&self.url)
    }

    pub fn pattern(&self) -> Result<Option<Regex>> {
        self.regex
            .as_deref()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| Error::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                })
            })
            .transpose()
    }
}

/// A helper tool shipped as a zip archive.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Utility {
    pub url: String,
    /// Executable name expected in `stage/bin` once unpacked.
    pub binary: String,
}

impl Utility {
    pub fn new(url: impl Into<String>, binary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            binary: binary.into(),
        }
    }

    pub fn path_in(&self, layout: &StagingLayout) -> PathBuf {
        layout.bin().join(&self.binary)
    }
}

/// The two helper tools extraction relies on.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Toolset {
    /// Tar-family decompressor (bsdtar).
    pub tar: Utility,
    pub sevenzip: Utility,
}

/// Last path segment of `url`. Plain filesystem paths are accepted too.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let name = match Url::parse(url) {
        // a one-letter scheme is a Windows drive letter, not a URL
        Ok(parsed) if parsed.scheme().len() > 1 => parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .map(str::to_owned),
        _ => Path::new(url)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
    };

    name.filter(|name| !name.is_empty())
        .ok_or_else(|| Error::InvalidUrl {
            url: url.to_owned(),
        })
}
