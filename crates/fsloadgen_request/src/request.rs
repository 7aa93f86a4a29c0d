//! The `Request` value type: one immutable, parameterized call to the
//! remote feature-retrieval service.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which entity-addressing shape a request uses.
///
/// Exactly one of these is populated on any given [`Request`], the `oneof`
/// between `ReadFeatureValuesRequest` (single-entity) and
/// `StreamingReadFeatureValuesRequest` (multi-entity) modeled directly as a
/// Rust enum so the invariant is unrepresentable any other way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    /// A single entity ID (`ReadFeatureValuesRequest`).
    Single(String),
    /// An ordered list of entity IDs (`StreamingReadFeatureValuesRequest`).
    Streaming(Vec<String>),
}

impl EntityRef {
    /// Returns true if this is the single-entity variant.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Returns true if this is the streaming variant.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming(_))
    }
}

/// One immutable, parameterized call to the remote feature-retrieval
/// service.
///
/// A `Request` is a pure value: it carries everything the [`Caller`] needs
/// to issue one RPC, and nothing more. Requests are built once by the
/// corpus builder and never mutated afterwards.
///
/// [`Caller`]: https://docs.rs/fsloadgen_caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The feature store the request targets.
    pub featurestore_id: String,
    /// The entity type within the feature store.
    pub entity_type: String,
    /// Which entity or entities this request addresses.
    pub entity_ref: EntityRef,
    /// The feature IDs to read. Always non-empty.
    pub feature_ids: Vec<String>,
}

impl Request {
    /// Builds a single-entity request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFeatureIds`] if `feature_ids` is empty.
    pub fn single(
        featurestore_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        feature_ids: Vec<String>,
    ) -> Result<Self> {
        let entity_type = entity_type.into();
        if feature_ids.is_empty() {
            return Err(Error::EmptyFeatureIds { entity_type });
        }
        Ok(Self {
            featurestore_id: featurestore_id.into(),
            entity_type,
            entity_ref: EntityRef::Single(entity_id.into()),
            feature_ids,
        })
    }

    /// Builds a streaming (multi-entity) request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFeatureIds`] if `feature_ids` is empty, or
    /// [`Error::EmptyEntityIds`] if `entity_ids` is empty.
    pub fn streaming(
        featurestore_id: impl Into<String>,
        entity_type: impl Into<String>,
        entity_ids: Vec<String>,
        feature_ids: Vec<String>,
    ) -> Result<Self> {
        let entity_type = entity_type.into();
        if entity_ids.is_empty() {
            return Err(Error::EmptyEntityIds { entity_type });
        }
        if feature_ids.is_empty() {
            return Err(Error::EmptyFeatureIds { entity_type });
        }
        Ok(Self {
            featurestore_id: featurestore_id.into(),
            entity_type,
            entity_ref: EntityRef::Streaming(entity_ids),
            feature_ids,
        })
    }

    /// Returns true if this is a single-entity request.
    #[must_use]
    pub const fn is_single(&self) -> bool {
        self.entity_ref.is_single()
    }

    /// Returns true if this is a streaming (multi-entity) request.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        self.entity_ref.is_streaming()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("feature_{i}")).collect()
    }

    #[test]
    fn single_request_builds() {
        let req = Request::single("fs1", "users", "user-1", ids(2)).unwrap();
        assert!(req.is_single());
        assert!(!req.is_streaming());
        assert_eq!(req.entity_ref, EntityRef::Single("user-1".to_string()));
    }

    #[test]
    fn single_request_rejects_empty_features() {
        let result = Request::single("fs1", "users", "user-1", vec![]);
        assert!(matches!(result, Err(Error::EmptyFeatureIds { .. })));
    }

    #[test]
    fn streaming_request_builds() {
        let req = Request::streaming(
            "fs1",
            "users",
            vec!["a".to_string(), "b".to_string()],
            ids(1),
        )
        .unwrap();
        assert!(req.is_streaming());
        assert!(!req.is_single());
    }

    #[test]
    fn streaming_request_rejects_empty_entities() {
        let result = Request::streaming("fs1", "users", vec![], ids(1));
        assert!(matches!(result, Err(Error::EmptyEntityIds { .. })));
    }

    #[test]
    fn streaming_request_rejects_empty_features() {
        let result = Request::streaming("fs1", "users", vec!["a".to_string()], vec![]);
        assert!(matches!(result, Err(Error::EmptyFeatureIds { .. })));
    }
}
