//! Drives `gem install` for a staged Ruby runtime.
//!
//! Installs never see `GEM_HOME` or `GEM_PATH` from the host, so a gem
//! can only land in the runtime's own repository.

pub use builder::GemBuilder;
pub use error::{Error, Result};
pub use spec::{GemOptions, GemSpecs};

mod builder;
mod error;
mod spec;
