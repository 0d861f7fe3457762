use std::fs::{self, File};
use std::io;
use std::path::Path;

use reqwest::blocking::Client;
use stagehand_archive::{BoxError, Downloader};
use tracing::debug;
use url::Url;

/// Fetches `http(s)` URLs with reqwest; `file:` URLs and plain paths are
/// copied from disk.
///
/// The body is written to a temporary file next to `dest` and renamed
/// into place once complete, so an interrupted transfer never leaves a
/// truncated archive behind.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("stagehand/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&mut self, url: &str, dest: &Path) -> Result<(), BoxError> {
        let parent = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;
        let mut temp = tempfile::NamedTempFile::new_in(parent)?;

        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                debug!(url, "fetching over http");
                let mut response = self.client.get(parsed).send()?.error_for_status()?;
                response.copy_to(temp.as_file_mut())?;
            }
            Ok(parsed) if parsed.scheme() == "file" => {
                let source = parsed
                    .to_file_path()
                    .map_err(|()| format!("'{url}' is not a local file URL"))?;
                copy_local(&source, temp.as_file_mut())?;
            }
            // one-letter schemes are Windows drive letters
            Ok(parsed) if parsed.scheme().len() > 1 => {
                return Err(format!("unsupported URL scheme '{}'", parsed.scheme()).into());
            }
            _ => copy_local(Path::new(url), temp.as_file_mut())?,
        }

        temp.persist(dest)?;
        Ok(())
    }
}

fn copy_local(source: &Path, dest: &mut File) -> io::Result<()> {
    debug!(source = %source.display(), "copying local archive");
    io::copy(&mut File::open(source)?, dest)?;
    Ok(())
}
