// src/pipeline/spec.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::model::{ClusterSpec, ParamValue, PipelineFile};
use crate::dag::{JobGraph, SubmissionPlan};
use crate::pipeline::builder::PipelineBuilder;
use crate::types::Cadence;

/// Schedule block of the registration payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSpec {
    /// First period start. Periods after it follow `interval`.
    pub start: DateTime<Utc>,
    /// Wire form is the scheduler shorthand, e.g. `"@daily"`.
    pub interval: Cadence,
    /// Backfill periods between `start` and now on first registration.
    pub catchup: bool,
    pub owner: String,
    pub depends_on_past: bool,
    /// Retries after the first failed attempt; `1` means two attempts.
    pub retries: u32,
    pub retry_delay_seconds: u64,
}

/// One notebook task of the registration payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpec {
    pub task_id: String,
    /// Connection the scheduler uses to reach the execution platform.
    pub connection_id: String,
    /// The task runs on a fresh cluster of this shape every attempt.
    pub new_cluster: ClusterSpec,
    pub notebook_task: NotebookTask,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotebookTask {
    pub notebook_path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub base_parameters: BTreeMap<String, ParamValue>,
}

/// `downstream` is submitted only after `upstream` succeeds in the same
/// period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub upstream: String,
    pub downstream: String,
}

/// Complete registration payload for one pipeline.
///
/// Registration is an upsert keyed by `name`: submitting an already
/// registered name replaces the stored definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSpec {
    pub name: String,
    pub schedule: ScheduleSpec,
    pub tasks: Vec<TaskSpec>,
    pub edges: Vec<DependencyEdge>,
}

impl PipelineSpec {
    /// Start assembling a spec in code instead of loading one from TOML.
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn task(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Adjacency view over the pipeline's tasks and edges.
    pub fn graph(&self) -> JobGraph {
        JobGraph::from_edges(
            self.tasks.iter().map(|t| t.task_id.as_str()),
            self.edges
                .iter()
                .map(|e| (e.upstream.as_str(), e.downstream.as_str())),
        )
    }

    /// The per-period submission order the engine is expected to honour.
    pub fn plan(&self) -> SubmissionPlan {
        SubmissionPlan::from_graph(&self.graph())
    }
}

impl From<&PipelineFile> for PipelineSpec {
    fn from(file: &PipelineFile) -> Self {
        let tasks = file
            .jobs
            .iter()
            .map(|(name, job)| TaskSpec {
                task_id: name.clone(),
                connection_id: file.connection_for(job).to_string(),
                new_cluster: file.cluster.clone(),
                notebook_task: NotebookTask {
                    notebook_path: job.notebook_path.clone(),
                    base_parameters: job.params.clone(),
                },
            })
            .collect();

        let edges = file
            .jobs
            .iter()
            .flat_map(|(name, job)| {
                job.after.iter().map(move |dep| DependencyEdge {
                    upstream: dep.clone(),
                    downstream: name.clone(),
                })
            })
            .collect();

        PipelineSpec {
            name: file.name.clone(),
            schedule: ScheduleSpec {
                start: file.start,
                interval: file.cadence,
                catchup: file.catchup,
                owner: file.defaults.owner.clone(),
                depends_on_past: file.defaults.depends_on_past,
                retries: file.defaults.retries,
                retry_delay_seconds: file.defaults.retry_delay.as_secs(),
            },
            tasks,
            edges,
        }
    }
}

impl From<PipelineFile> for PipelineSpec {
    fn from(file: PipelineFile) -> Self {
        PipelineSpec::from(&file)
    }
}
