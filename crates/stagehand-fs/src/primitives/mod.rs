pub mod replace_dir;

pub use replace_dir::{ReplaceDirOptions, clear_dir, replace_dir};
