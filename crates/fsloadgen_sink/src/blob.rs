//! The blob sink: where the aggregate summary and rotated detailed-results
//! CSVs are written. Stands in for Google Cloud Storage; a real GCS client
//! is a drop-in behind [`BlobSink`].

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Opens named objects for writing. One [`BlobHandle`] is live per object at
/// a time; rotation closes the current one and opens the next.
pub trait BlobSink: Send + Sync {
    /// Opens `object_name` for writing, truncating it if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalUnavailable`] if the object cannot be
    /// created.
    fn create(&self, object_name: &str) -> Result<Box<dyn BlobHandle>>;
}

/// A single object's write stream.
pub trait BlobHandle: Send {
    /// Appends `bytes` to the object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying write fails.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flushes and closes the object, returning a path-like identifier a
    /// [`crate::TableSink`] can load from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the final flush fails.
    fn finish(self: Box<Self>) -> Result<PathBuf>;
}

/// A [`BlobSink`] backed by the local filesystem, standing in for GCS.
#[derive(Debug, Clone)]
pub struct LocalBlobSink {
    root: PathBuf,
}

impl LocalBlobSink {
    /// Creates a sink that writes objects under `root`, creating the
    /// directory on first use.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BlobSink for LocalBlobSink {
    fn create(&self, object_name: &str) -> Result<Box<dyn BlobHandle>> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(object_name);
        let file = File::create(&path)?;
        Ok(Box::new(LocalBlobHandle { path, file }))
    }
}

struct LocalBlobHandle {
    path: PathBuf,
    file: File,
}

impl BlobHandle for LocalBlobHandle {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        Write::write_all(&mut self.file, bytes)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<PathBuf> {
        self.file.flush()?;
        Ok(self.path)
    }
}

/// Validates and normalizes a `gs://bucket/object` path against
/// `^gs://([^/]+)/?(.*)$`, ensuring the normalized form always ends with
/// `/`.
///
/// # Errors
///
/// Returns [`Error::InvalidGcsPath`] if `path` does not start with `gs://`
/// or names an empty bucket.
pub fn normalize_gcs_output_path(path: &str) -> Result<String> {
    let rest = path
        .strip_prefix("gs://")
        .ok_or_else(|| Error::InvalidGcsPath(path.to_string()))?;
    let mut parts = rest.splitn(2, '/');
    let bucket = parts
        .next()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| Error::InvalidGcsPath(path.to_string()))?;
    let object = parts.next().unwrap_or("").trim_end_matches('/');

    if object.is_empty() {
        Ok(format!("gs://{bucket}/"))
    } else {
        Ok(format!("gs://{bucket}/{object}/"))
    }
}
