//! Executes one batch of requests concurrently, bounded by a fixed-size
//! pool, and measures end-to-end latency for each.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod error;
mod executor;
mod result;

pub use error::{Error, Result};
pub use executor::Executor;
pub use result::{SampleResult, TaskContext};
