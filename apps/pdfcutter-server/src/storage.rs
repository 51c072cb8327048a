//! On-disk storage for generated documents
//!
//! Every stored file is prefixed with a fresh UUID so concurrent requests
//! producing the same display name never collide. Downloads strip the prefix
//! again so the browser sees the display name.

use std::io::{Cursor, Write};
use std::path::PathBuf;

use pdfcutter_core::naming;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ServerError;

/// A generated file written to the download directory
#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub stored_name: String,
    pub display_name: String,
}

impl StoredFile {
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.stored_name)
    }
}

#[derive(Debug, Clone)]
pub struct DownloadStore {
    dir: PathBuf,
}

impl DownloadStore {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub async fn save(&self, display_name: &str, bytes: &[u8]) -> Result<StoredFile, ServerError> {
        let stored_name = format!("{}_{}", Uuid::new_v4(), display_name);
        let path = self.dir.join(&stored_name);
        if let Err(err) = tokio::fs::write(&path, bytes).await {
            // A short write must not stay downloadable
            let _ = tokio::fs::remove_file(&path).await;
            return Err(err.into());
        }

        debug!(file = %stored_name, size = bytes.len(), "stored download");

        Ok(StoredFile {
            stored_name,
            display_name: display_name.to_string(),
        })
    }

    /// Store several files as one unit.
    ///
    /// If any write fails, the files already written by this call are removed
    /// again before the error is returned.
    pub async fn save_all<'a>(
        &self,
        entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    ) -> Result<Vec<StoredFile>, ServerError> {
        let mut stored = Vec::new();
        for (display_name, bytes) in entries {
            match self.save(display_name, bytes).await {
                Ok(file) => stored.push(file),
                Err(err) => {
                    self.remove(&stored).await;
                    return Err(err);
                }
            }
        }
        Ok(stored)
    }

    async fn remove(&self, files: &[StoredFile]) {
        for file in files {
            if let Err(err) = tokio::fs::remove_file(self.dir.join(&file.stored_name)).await {
                warn!(file = %file.stored_name, "failed to remove partial download: {}", err);
            }
        }
    }

    /// Map a requested download name to its path and display name.
    ///
    /// Only names this store produced are accepted: a UUID prefix followed by
    /// a sanitized display name, with no path components.
    pub async fn resolve(&self, stored_name: &str) -> Result<(PathBuf, String), ServerError> {
        let not_found = || ServerError::NotFound(stored_name.to_string());

        if stored_name.is_empty()
            || stored_name.contains("..")
            || naming::secure_filename(stored_name) != stored_name
        {
            return Err(not_found());
        }

        let display_name = stored_name
            .split_once('_')
            .filter(|(prefix, rest)| Uuid::parse_str(prefix).is_ok() && !rest.is_empty())
            .map(|(_, rest)| rest.to_string())
            .ok_or_else(not_found)?;

        let path = self.dir.join(stored_name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(not_found());
        }

        Ok((path, display_name))
    }
}

/// Package split pages into a single deflated ZIP archive
pub fn zip_pages<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// MIME type served for a stored file
pub fn content_type(display_name: &str) -> &'static str {
    if display_name.to_ascii_lowercase().ends_with(".zip") {
        "application/zip"
    } else {
        "application/pdf"
    }
}
