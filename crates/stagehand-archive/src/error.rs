use std::io;
use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("archive '{}' does not exist, did the download step fail?", archive.display())]
    MissingArchive { archive: PathBuf },

    #[error("cannot extract '{file}': unhandled file extension")]
    UnsupportedFormat { file: String },

    #[error("failed to read zip archive '{}': {source}", archive.display())]
    ArchiveRead {
        archive: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("entry '{entry}' in '{}' escapes the extraction directory", archive.display())]
    UnsafeEntry { archive: PathBuf, entry: String },

    #[error("cannot derive an archive file name from '{url}'")]
    InvalidUrl { url: String },

    #[error("target '{target}' must be a relative path inside the stage")]
    InvalidTarget { target: String },

    #[error("target '{target}' would overwrite the helper tools in the stage's bin directory")]
    ReservedTarget { target: String },

    #[error("invalid entry pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("failed to extract '{}' into '{}': {source}", archive.display(), target.display())]
    ExternalTool {
        archive: PathBuf,
        target: PathBuf,
        source: stagehand_platform::Error,
    },

    #[error("failed to download '{url}' to '{}': {source}", dest.display())]
    Download {
        url: String,
        dest: PathBuf,
        source: BoxError,
    },

    #[error("'{}' is missing after unpacking '{url}'", path.display())]
    MissingBinary { url: String, path: PathBuf },

    #[error(transparent)]
    Staging(#[from] stagehand_fs::Error),

    #[error("i/o error at '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
