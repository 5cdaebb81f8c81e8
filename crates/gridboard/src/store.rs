//! Layout stores: where the serialized layout document lives.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use tempfile::NamedTempFile;

use crate::config::StoreTarget;
use crate::error::{GridboardError, Result};

/// Path of the layout resource under a backend base URL.
pub const LAYOUT_PATH: &str = "/api/layout";

/// Raw access to a stored layout document.
///
/// Stores move bodies only; decoding and validation happen in
/// [`gridboard_layout::persist`].
pub trait LayoutStore: Send + Sync {
    /// Current document body, or `None` when nothing has been stored yet.
    fn fetch(&self) -> Result<Option<String>>;

    /// Replace the stored document with `body`.
    fn store(&self, body: &str) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}

/// Build the store named by `target`.
pub fn open_store(target: &StoreTarget, timeout: Duration) -> Result<Box<dyn LayoutStore>> {
    Ok(match target {
        StoreTarget::Http { base_url } => Box::new(HttpLayoutStore::new(base_url, timeout)?),
        StoreTarget::File { path } => Box::new(FileLayoutStore::new(path.clone())),
    })
}

/// Dashboard backend speaking `GET`/`POST {base}/api/layout`.
#[derive(Debug, Clone)]
pub struct HttpLayoutStore {
    client: Client,
    url: String,
}

impl HttpLayoutStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = base_url.trim().trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(GridboardError::invalid(format!(
                "endpoint must be an http(s) URL, got {base_url:?}"
            )));
        }
        let client = Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(2)))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: format!("{base}{LAYOUT_PATH}"),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn check_status(&self, status: reqwest::StatusCode) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(GridboardError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            })
        }
    }
}

impl LayoutStore for HttpLayoutStore {
    fn fetch(&self) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()?;
        self.check_status(response.status())?;
        let body = response.text()?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(body))
    }

    fn store(&self, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .body(body.to_owned())
            .send()?;
        self.check_status(response.status())
    }

    fn location(&self) -> String {
        self.url.clone()
    }
}

/// Layout document kept in a local JSON file.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    path: PathBuf,
}

impl FileLayoutStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LayoutStore for FileLayoutStore {
    fn fetch(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(body) if body.trim().is_empty() => Ok(None),
            Ok(body) => Ok(Some(body)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn store(&self, body: &str) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;
        // Stage in a uniquely named sibling, then rename over the target, so
        // readers never see a partial document and concurrent writers never
        // share a staging file.
        let mut staging = NamedTempFile::new_in(parent)?;
        staging.write_all(body.as_bytes())?;
        staging.flush()?;
        staging
            .persist(&self.path)
            .map_err(|error| GridboardError::Io(error.error))?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
