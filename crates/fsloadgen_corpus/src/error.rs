//! Error types for corpus construction.

use thiserror::Error;

/// Errors that can occur while building a corpus from a template and an
/// entity listing.
#[derive(Debug, Error)]
pub enum Error {
    /// The template or entity listing document could not be parsed.
    #[error("malformed input at {location}: {reason}")]
    InputMalformed {
        /// Where in the document the problem was found, e.g. `line 4`.
        location: String,
        /// What was wrong.
        reason: String,
    },

    /// A blob or warehouse source could not be reached.
    #[error("external source unavailable: {0}")]
    ExternalUnavailable(String),

    /// A request template referenced an entity type with no matching
    /// entities in the listing.
    #[error("no entities found for entity type '{entity_type}'")]
    NoMatchingEntities {
        /// The entity type that had no entities.
        entity_type: String,
    },

    /// Building one of the expanded requests failed.
    #[error(transparent)]
    Request(#[from] fsloadgen_request::Error),

    /// I/O error reading a local blob.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for corpus construction.
pub type Result<T> = std::result::Result<T, Error>;
