#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to install gem '{gem}': {source}")]
    Install {
        gem: String,
        source: stagehand_platform::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
