//! The `Caller` trait: the one seam between the load generator and the
//! remote feature-retrieval service.

use async_trait::async_trait;
use fsloadgen_request::Request;

use crate::error::Result;

/// Which wire version of the feature-retrieval API a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    /// The stable `v1` API.
    V1,
    /// The `v1beta1` API.
    V1Beta1,
}

impl ApiVersion {
    /// The path segment this version is addressed by.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V1Beta1 => "v1beta1",
        }
    }
}

/// Issues one [`Request`] against a remote feature-retrieval service and
/// waits for the response.
///
/// Implementations are expected to be cheap to clone (typically an `Arc`
/// around a pooled HTTP client) since the sample executor holds one shared
/// instance across every concurrent in-flight call.
#[async_trait]
pub trait Caller: Send + Sync {
    /// Issues `request` and resolves once a response (or definitive
    /// failure) is available. The returned value carries no payload: the
    /// sample executor only needs to know how long the call took and
    /// whether it succeeded.
    ///
    /// # Errors
    ///
    /// Returns an [`crate::Error`] if the call fails. Implementations do
    /// not apply their own timeout; the caller (the sample executor) is
    /// responsible for bounding call duration.
    async fn issue(&self, request: &Request) -> Result<()>;
}
