// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PipelineFile, RawPipelineFile};
use crate::errors::{LakedagError, Result};

/// Directory definitions are loaded from when `--dir` is not given.
pub fn default_pipelines_dir() -> PathBuf {
    PathBuf::from("pipelines")
}

/// Load a pipeline definition from a given path and return the raw
/// `RawPipelineFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (count ranges, DAG correctness, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawPipelineFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawPipelineFile = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a pipeline definition from path and run validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - negative retry or worker counts,
///   - unknown or self `after` references,
///   - cycles in the job graph,
///   - unparseable `start`, `cadence` and `retry_delay` values.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<PipelineFile> {
    let raw = load_from_path(&path)?;
    let pipeline = PipelineFile::try_from(raw)?;
    Ok(pipeline)
}

/// Load and validate every `*.toml` definition in a directory.
///
/// Files are processed in path order so output and registration order are
/// stable. Errors are tagged with the offending file.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<PipelineFile>> {
    let dir = dir.as_ref();

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut pipelines = Vec::with_capacity(paths.len());
    for path in &paths {
        let pipeline = load_and_validate(path).map_err(|e| {
            LakedagError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        pipelines.push(pipeline);
    }

    Ok(pipelines)
}
