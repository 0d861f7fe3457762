//! Archive extraction and helper-tool provisioning for an installer stage.
//!
//! # Architecture
//!
//! - `layout.rs` - Archives directory, stage root and `stage/bin`
//! - `package.rs` - Package and helper-tool descriptors
//! - `format.rs` - File-name based format classification
//! - `unzip.rs` - In-process zip reader used for bootstrapping
//! - `dispatch.rs` - Strategy selection and external tool invocation
//! - `provision.rs` - Download-once installation of helper tools

pub use dispatch::{Extracted, ExtractionDispatcher, Plan};
pub use error::{BoxError, Error, Result};
pub use format::{ArchiveFormat, Compression};
pub use layout::StagingLayout;
pub use package::{Package, Toolset, Utility, file_name_from_url};
pub use provision::{Downloader, Provisioned, UtilityProvisioner};
pub use unzip::ZipExtractor;

pub mod dispatch;
mod error;
pub mod format;
mod layout;
mod package;
pub mod provision;
mod unzip;
