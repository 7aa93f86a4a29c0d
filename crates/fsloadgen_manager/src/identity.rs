//! The `(formattedTimestamp, uuid)` pair that names every artifact a run
//! produces, so concurrent runs never collide.

use chrono::Local;
use uuid::Uuid;

/// Names every output artifact a run produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    /// `yyyyMMdd_HHmmss` in the system's local time zone.
    pub formatted_timestamp: String,
    /// A random v4 UUID, unique per run.
    pub uuid: Uuid,
}

impl RunIdentity {
    /// Captures a fresh identity: the current local timestamp and a new v4
    /// UUID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatted_timestamp: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            uuid: Uuid::new_v4(),
        }
    }
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}
