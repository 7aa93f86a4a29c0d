//! Error types for request construction.

use thiserror::Error;

/// Errors that can occur while constructing a [`crate::Request`].
#[derive(Debug, Error)]
pub enum Error {
    /// A request was constructed with no feature IDs.
    #[error("request for entity type '{entity_type}' has no feature IDs")]
    EmptyFeatureIds {
        /// The entity type of the offending request.
        entity_type: String,
    },

    /// A streaming request was constructed with no entity IDs.
    #[error("streaming request for entity type '{entity_type}' has no entity IDs")]
    EmptyEntityIds {
        /// The entity type of the offending request.
        entity_type: String,
    },
}

/// Result type alias for request construction.
pub type Result<T> = std::result::Result<T, Error>;
