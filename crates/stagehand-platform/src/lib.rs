//! Process plumbing for stagehand.
//!
//! Every external tool invocation goes through [`ShellExecutor`], which
//! owns an explicit [`CommandEnv`] instead of mutating the process-wide
//! environment.

pub use command::Command;
pub use env::{CommandEnv, PathModifier};
pub use error::{Error, Result};
pub use executor::{Captured, CommandRunner, ProcessRunner, ShellExecutor};

pub mod command;
pub mod env;
mod error;
pub mod executor;
