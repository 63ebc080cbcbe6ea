// src/engine/backend.rs

//! Pluggable scheduler backend abstraction.
//!
//! The rest of the crate talks to a `SchedulerBackend` instead of a
//! concrete HTTP client. This makes it easy to swap in a fake scheduler in
//! tests while keeping the production implementation in `http.rs`.

use std::future::Future;
use std::pin::Pin;

use crate::engine::api::{RegisteredPipeline, RunId, RunStatus};
use crate::errors::Result;
use crate::pipeline::PipelineSpec;

/// Trait abstracting the external workflow scheduler.
///
/// Production code uses the HTTP implementation; tests can provide their
/// own implementation that doesn't touch the network.
pub trait SchedulerBackend: Send {
    /// Upsert a pipeline definition, keyed by its name.
    ///
    /// Registering a name that is already known replaces the stored
    /// definition instead of creating a second pipeline.
    fn register_pipeline(
        &mut self,
        spec: PipelineSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RegisteredPipeline>> + Send + '_>>;

    /// Start a run of a registered pipeline outside its schedule.
    fn trigger_run(
        &mut self,
        name: String,
    ) -> Pin<Box<dyn Future<Output = Result<RunId>> + Send + '_>>;

    /// Poll the state of a run.
    fn run_state(
        &mut self,
        run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<RunStatus>> + Send + '_>>;
}
