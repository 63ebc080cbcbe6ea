// src/pipeline/mod.rs

//! The registration payload and its programmatic builder.
//!
//! A [`PipelineSpec`] is the complete description handed to the external
//! scheduler: name, schedule and retry policy, one notebook task per job
//! (each carrying the cluster shape), and the dependency edges between
//! tasks. It is produced either from a validated definition file
//! (`From<&PipelineFile>`) or assembled in code via [`PipelineBuilder`].

pub mod builder;
pub mod spec;

pub use builder::{JobHandle, PipelineBuilder};
pub use spec::{DependencyEdge, NotebookTask, PipelineSpec, ScheduleSpec, TaskSpec};
