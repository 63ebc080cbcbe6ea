// src/engine/mod.rs

//! Talking to the external workflow scheduler.
//!
//! lakedag never runs notebooks itself: registration hands a pipeline to
//! the scheduler, which owns periods, catchup, submission order and the
//! retry loop. This module carries the wire types of that contract
//! (`api`), the backend seam the rest of the crate talks through
//! (`backend`), and the HTTP implementation (`http`).

pub mod api;
pub mod backend;
pub mod http;

pub use api::{RegisteredPipeline, RunId, RunState, RunStatus, TriggeredRun};
pub use backend::SchedulerBackend;
pub use http::HttpScheduler;
