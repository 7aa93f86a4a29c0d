//! Owns the work queue, sampling strategy, warmup/measured phases,
//! per-sample pacing, and aggregate statistics for one load-generation run.
//!
//! [`LoadManager::run`] is the one entry point: given a [`fsloadgen_request::Request`]
//! corpus and a [`fsloadgen_caller::Caller`], it builds the work queue,
//! drives the warmup and measured phases through freshly constructed
//! [`fsloadgen_executor::Executor`]s, and reduces the measured phase to an
//! [`Aggregate`] plus the full ordered result sequence for a results writer
//! to persist.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod aggregate;
mod config;
mod error;
mod identity;
mod manager;
mod state;
mod work_queue;

pub use aggregate::Aggregate;
pub use config::LoadManagerConfig;
pub use error::{Error, Result};
pub use identity::RunIdentity;
pub use manager::{LoadManager, RunReport};
pub use state::RunState;
pub use work_queue::{build_work_queue, wrapping_batch, SampleStrategy};
