// src/config/model.rs

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Cadence;

/// Top-level pipeline definition as read from a TOML file, before validation.
///
/// This is a direct mapping of the definition files:
///
/// ```toml
/// [pipeline]
/// name = "covid_datalake"
/// start = "2022-10-06"
/// cadence = "daily"
/// catchup = true
///
/// [defaults]
/// owner = "data-eng"
/// retries = 1
/// retry_delay = "2m"
///
/// [cluster]
/// spark_version = "10.4.x-scala2.12"
/// num_workers = 8
/// node_type_id = "i3.xlarge"
///
/// [job.covid-raw]
/// notebook_path = "/Users/someone/covid-raw"
///
/// [job.covid-bronze]
/// notebook_path = "/Users/someone/covid-bronze"
/// after = ["covid-raw"]
/// ```
///
/// Integer fields are kept wide and signed here so that out-of-range values
/// reach `validate` and produce a configuration error instead of a serde one.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPipelineFile {
    /// Identity and schedule from `[pipeline]`.
    pub pipeline: PipelineSection,

    /// Per-job defaults from `[defaults]`.
    #[serde(default)]
    pub defaults: DefaultsSection,

    /// Cluster shape from `[cluster]`, shared by every job in the pipeline.
    pub cluster: ClusterSection,

    /// All jobs from `[job.<name>]`.
    ///
    /// Keys are the *job names* (e.g. `"covid-raw"`, `"show-dbs"`).
    #[serde(default)]
    pub job: BTreeMap<String, JobSection>,
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Name the pipeline is registered under. Registration is idempotent
    /// per name: re-registering replaces the stored definition.
    pub name: String,

    /// First period start, either an RFC 3339 instant
    /// (`"2022-10-06T00:00:00Z"`) or a bare date (`"2022-10-06"`, meaning
    /// midnight UTC).
    pub start: String,

    /// How often the scheduler starts a run: `"hourly"`, `"daily"`,
    /// `"weekly"` or `"monthly"` (the `@`-prefixed spellings also parse).
    #[serde(default = "default_cadence")]
    pub cadence: String,

    /// Whether the scheduler should backfill periods between `start` and
    /// now when the pipeline is first registered.
    #[serde(default)]
    pub catchup: bool,

    /// Connection the scheduler uses to reach the execution platform,
    /// unless a job overrides it.
    #[serde(default = "default_connection")]
    pub connection: String,
}

fn default_cadence() -> String {
    "daily".to_string()
}

pub(crate) fn default_connection() -> String {
    "notebook_default".to_string()
}

/// `[defaults]` section: arguments applied to every job in the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsSection {
    /// Owner recorded on the registered pipeline.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// If true, a job also waits for its own success in the previous
    /// period before the engine submits it.
    #[serde(default)]
    pub depends_on_past: bool,

    /// Retries after the first failed attempt. `retries = 1` means up to
    /// two attempts in total.
    #[serde(default)]
    pub retries: i64,

    /// Pause between attempts, as a duration string (`"2m"`, `"30s"`).
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
}

pub(crate) fn default_owner() -> String {
    "lakedag".to_string()
}

fn default_retry_delay() -> String {
    "5m".to_string()
}

impl Default for DefaultsSection {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            depends_on_past: false,
            retries: 0,
            retry_delay: default_retry_delay(),
        }
    }
}

/// `[cluster]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterSection {
    /// Runtime version string understood by the execution platform.
    pub spark_version: String,

    /// Worker count; `0` means a single-node cluster.
    pub num_workers: i64,

    /// Instance type for the cluster nodes.
    pub node_type_id: String,

    /// IAM instance profile attached to the cluster, if any.
    #[serde(default)]
    pub instance_profile_arn: Option<String>,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    /// Workspace path of the notebook this job runs.
    pub notebook_path: String,

    /// Parameters passed to the notebook.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,

    /// Dependency list: this job waits for all jobs listed here.
    ///
    /// This is the TOML `after = ["covid-raw"]` field.
    #[serde(default)]
    pub after: Vec<String>,

    /// Per-job connection override; if `None`, the pipeline connection
    /// applies.
    #[serde(default)]
    pub connection: Option<String>,
}

/// A scalar notebook parameter value.
///
/// The execution platform receives parameters as strings, but definitions
/// may write them as native TOML scalars; the original type is kept so the
/// wire form can serialize it faithfully.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// A validated pipeline definition.
///
/// Produced from [`RawPipelineFile`] via `TryFrom` (see `validate.rs`);
/// by then every count is non-negative, `start` and `cadence` are parsed,
/// all `after` references resolve, and the job graph is acyclic.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineFile {
    pub name: String,
    pub start: DateTime<Utc>,
    pub cadence: Cadence,
    pub catchup: bool,
    pub connection: String,
    pub defaults: DefaultArgs,
    pub cluster: ClusterSpec,
    pub jobs: BTreeMap<String, JobConfig>,
}

/// Validated `[defaults]`: the retry policy and ownership applied to every
/// job.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultArgs {
    pub owner: String,
    pub depends_on_past: bool,
    pub retries: u32,
    pub retry_delay: Duration,
}

/// Validated `[cluster]`: the shape of the cluster every job runs on.
///
/// Serializes directly as the `new_cluster` object of the registration
/// payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSpec {
    pub spark_version: String,
    pub num_workers: u32,
    pub node_type_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_profile_arn: Option<String>,
}

/// Validated `[job.<name>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub notebook_path: String,
    pub params: BTreeMap<String, ParamValue>,
    pub after: Vec<String>,
    pub connection: Option<String>,
}

impl PipelineFile {
    /// Effective connection for a job: its own override, or the pipeline
    /// connection.
    pub fn connection_for<'a>(&'a self, job: &'a JobConfig) -> &'a str {
        job.connection.as_deref().unwrap_or(&self.connection)
    }
}
