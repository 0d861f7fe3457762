//! Filesystem primitives for replacing staged directories in one step.

pub use error::{Error, Result};
pub use primitives::{ReplaceDirOptions, clear_dir, replace_dir};
pub use workflow::Workspace;

mod error;
pub mod primitives;
pub mod workflow;
