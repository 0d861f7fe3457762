use indexmap::IndexMap;
use serde::Deserialize;

/// Per-gem install options.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GemOptions {
    /// Exact version to install.
    pub version: Option<String>,
    /// Extra arguments appended to the install command as given.
    pub args: Vec<String>,
}

impl GemOptions {
    pub fn pinned(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            args: Vec::new(),
        }
    }
}

/// What to install, in any of the shapes a config file may use.
///
/// ```toml
/// gems = "rake"
/// # or
/// gems = ["rake", "bundler"]
/// # or
/// gems = { rake = "10.0.0", rails = "3.2.0" }
/// # or
/// [gems.sqlite3]
/// version = "1.3.6"
/// args = ["--", "--with-sqlite3-dir=/opt/sqlite"]
/// ```
///
/// Map shapes keep the order they were written in.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum GemSpecs {
    One(String),
    List(Vec<String>),
    Pinned(IndexMap<String, String>),
    Detailed(IndexMap<String, GemOptions>),
}

impl GemSpecs {
    /// Every gem with its options, in install order.
    pub fn entries(&self) -> Vec<(&str, GemOptions)> {
        match self {
            Self::One(name) => vec![(name.as_str(), GemOptions::default())],
            Self::List(names) => names
                .iter()
                .map(|name| (name.as_str(), GemOptions::default()))
                .collect(),
            Self::Pinned(versions) => versions
                .iter()
                .map(|(name, version)| (name.as_str(), GemOptions::pinned(version)))
                .collect(),
            Self::Detailed(gems) => gems
                .iter()
                .map(|(name, options)| (name.as_str(), options.clone()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::List(names) => names.is_empty(),
            Self::Pinned(versions) => versions.is_empty(),
            Self::Detailed(gems) => gems.is_empty(),
        }
    }
}

impl From<Vec<String>> for GemSpecs {
    fn from(names: Vec<String>) -> Self {
        Self::List(names)
    }
}
