//! Pluggable collaborators the corpus builder reads from: object storage for
//! template and listing documents, and a warehouse for entity listings
//! produced by a query instead of a static file.
//!
//! Concrete implementations here stand in for the real Google Cloud Storage
//! and BigQuery clients the production system talks to; the trait boundary
//! is what a caller swaps out to wire those in.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Reads a document given its URI. Supports local filesystem paths
/// directly; `gs://bucket/object` URIs are resolved against a configured
/// local mirror directory, standing in for a real GCS client.
pub trait BlobSource: Send + Sync {
    /// Reads the object at `uri` into a `String`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalUnavailable`] if the object cannot be
    /// reached, or [`Error::Io`] for local filesystem failures.
    fn read_to_string(&self, uri: &str) -> Result<String>;
}

/// A [`BlobSource`] backed by the local filesystem.
///
/// `gs://` URIs are rewritten to `{mirror_root}/{bucket}/{object}` when a
/// mirror root is configured; without one, `gs://` reads fail with
/// [`Error::ExternalUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct LocalFileBlobSource {
    gcs_mirror_root: Option<PathBuf>,
}

impl LocalFileBlobSource {
    /// Creates a source that only serves local filesystem paths.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source that also serves `gs://` URIs by reading from
    /// `mirror_root` as though it were the bucket root.
    #[must_use]
    pub fn with_gcs_mirror(mirror_root: impl Into<PathBuf>) -> Self {
        Self {
            gcs_mirror_root: Some(mirror_root.into()),
        }
    }
}

impl BlobSource for LocalFileBlobSource {
    fn read_to_string(&self, uri: &str) -> Result<String> {
        if let Some(object) = uri.strip_prefix("gs://") {
            let root = self.gcs_mirror_root.as_ref().ok_or_else(|| {
                Error::ExternalUnavailable(format!(
                    "no local GCS mirror configured to resolve '{uri}'"
                ))
            })?;
            let path: PathBuf = root.join(object);
            fs::read_to_string(&path).map_err(|source| {
                Error::ExternalUnavailable(format!(
                    "failed to read mirrored object '{}': {source}",
                    path.display()
                ))
            })
        } else {
            fs::read_to_string(Path::new(uri)).map_err(Error::from)
        }
    }
}

/// One row of a warehouse entity query result: the `featurestore_id`,
/// `entity_type_id`, and `entity_id` columns a query against the warehouse
/// is expected to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseRow {
    /// The `featurestore_id` column.
    pub featurestore_id: String,
    /// The `entity_type_id` column.
    pub entity_type_id: String,
    /// The `entity_id` column.
    pub entity_id: String,
}

/// Resolves an entity listing from a warehouse query instead of a static
/// file, as an alternative entity-source path through the corpus builder.
pub trait WarehouseEntitySource: Send + Sync {
    /// Executes `query` and returns the resulting rows, each a
    /// `(featurestore_id, entity_type_id, entity_id)` triple, for the
    /// corpus builder to fold directly into its entity map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ExternalUnavailable`] if the query cannot be
    /// executed, or [`Error::InputMalformed`] if a returned row is missing
    /// one of the three required columns.
    fn query(&self, query: &str) -> Result<Vec<WarehouseRow>>;
}

/// A [`WarehouseEntitySource`] that treats `query` as a local CSV file path
/// with a `featurestore_id,entity_type_id,entity_id` header, standing in
/// for a real BigQuery client executing a SQL query against a warehouse
/// table and returning its result rows.
#[derive(Debug, Clone, Default)]
pub struct LocalWarehouseEntitySource;

impl WarehouseEntitySource for LocalWarehouseEntitySource {
    fn query(&self, query: &str) -> Result<Vec<WarehouseRow>> {
        let mut reader = csv::Reader::from_path(query).map_err(|source| {
            Error::ExternalUnavailable(format!("warehouse query '{query}' failed: {source}"))
        })?;

        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let record: RawWarehouseRow = record.map_err(|source| Error::InputMalformed {
                location: query.to_string(),
                reason: format!("malformed warehouse result row: {source}"),
            })?;
            rows.push(WarehouseRow {
                featurestore_id: record.featurestore_id,
                entity_type_id: record.entity_type_id,
                entity_id: record.entity_id,
            });
        }
        Ok(rows)
    }
}

#[derive(serde::Deserialize)]
struct RawWarehouseRow {
    featurestore_id: String,
    entity_type_id: String,
    entity_id: String,
}
