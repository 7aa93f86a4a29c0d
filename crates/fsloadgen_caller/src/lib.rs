//! Issues feature-retrieval requests against a remote service and reports
//! success or failure back to the sample executor.
//!
//! The [`Caller`] trait is the one seam between the load generator and the
//! outside world: [`HttpCaller`] talks to the real Vertex AI Feature Store
//! API, and [`TestCaller`] is an in-process deterministic double used by
//! scenario tests.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod caller;
pub mod error;
mod factory;
mod http;
mod test_caller;

pub use caller::{ApiVersion, Caller};
pub use error::{Error, Result};
pub use factory::{build_caller, CallerKind};
pub use http::{HttpCaller, HttpCallerConfig};
pub use test_caller::TestCaller;
