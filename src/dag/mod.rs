// src/dag/mod.rs

//! Job-graph structures derived from pipeline definitions.
//!
//! Acyclicity is enforced when a definition is validated or built; the
//! types here keep adjacency information and derive the submission order
//! the external engine is expected to honour.

pub mod graph;
pub mod plan;

pub use graph::{JobGraph, toposort_names};
pub use plan::SubmissionPlan;
