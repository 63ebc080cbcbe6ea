// src/config/mod.rs

//! Pipeline-definition loading and validation for lakedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load definition files from disk (`loader.rs`).
//! - Validate invariants like non-negative counts and DAG correctness
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_pipelines_dir, load_and_validate, load_dir, load_from_path};
pub use model::{
    ClusterSpec, DefaultArgs, JobConfig, ParamValue, PipelineFile, RawPipelineFile,
};
