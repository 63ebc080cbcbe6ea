// src/pipeline/builder.rs

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::model::{self, ClusterSpec, ParamValue};
use crate::dag::toposort_names;
use crate::errors::{LakedagError, Result};
use crate::pipeline::spec::{
    DependencyEdge, NotebookTask, PipelineSpec, ScheduleSpec, TaskSpec,
};
use crate::types::Cadence;

/// Handle to a job added to a [`PipelineBuilder`].
///
/// Handles are cheap copies and only meaningful for the builder that issued
/// them; `build` rejects edges whose handles came from another builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobHandle(usize);

#[derive(Debug, Clone)]
struct BuilderJob {
    task_id: String,
    notebook_path: String,
    params: BTreeMap<String, ParamValue>,
    connection: Option<String>,
}

/// Assembles a [`PipelineSpec`] in code.
///
/// Scalar settings chain by value; jobs are added with [`notebook_job`],
/// which returns a [`JobHandle`] used to declare ordering:
///
/// ```no_run
/// use lakedag::config::ClusterSpec;
/// use lakedag::pipeline::PipelineSpec;
///
/// # fn demo() -> lakedag::errors::Result<()> {
/// let mut builder = PipelineSpec::builder("covid_datalake")
///     .start("2022-10-06T00:00:00Z".parse().expect("valid timestamp"))
///     .cluster(ClusterSpec {
///         spark_version: "10.4.x-scala2.12".to_string(),
///         num_workers: 8,
///         node_type_id: "i3.xlarge".to_string(),
///         instance_profile_arn: None,
///     });
///
/// let raw = builder.notebook_job("covid-raw", "/Users/someone/covid-raw");
/// let bronze = builder.notebook_job("covid-bronze", "/Users/someone/covid-bronze");
/// builder.chain(&[raw, bronze]);
///
/// let spec = builder.build()?;
/// # Ok(())
/// # }
/// ```
///
/// [`notebook_job`]: PipelineBuilder::notebook_job
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    start: Option<DateTime<Utc>>,
    cadence: Cadence,
    catchup: bool,
    connection: String,
    owner: String,
    depends_on_past: bool,
    retries: u32,
    retry_delay: Duration,
    cluster: Option<ClusterSpec>,
    jobs: Vec<BuilderJob>,
    edges: Vec<(usize, usize)>,
}

impl PipelineBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: None,
            cadence: Cadence::default(),
            catchup: false,
            connection: model::default_connection(),
            owner: model::default_owner(),
            depends_on_past: false,
            retries: 0,
            retry_delay: Duration::from_secs(5 * 60),
            cluster: None,
            jobs: Vec::new(),
            edges: Vec::new(),
        }
    }

    /// First period start. Required.
    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn catchup(mut self, catchup: bool) -> Self {
        self.catchup = catchup;
        self
    }

    /// Connection used by every job that does not override it.
    pub fn connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = connection.into();
        self
    }

    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn depends_on_past(mut self, val: bool) -> Self {
        self.depends_on_past = val;
        self
    }

    /// Retries after the first failed attempt; `1` means two attempts.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Cluster shape every job runs on. Required.
    pub fn cluster(mut self, cluster: ClusterSpec) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Add a notebook job and return its handle.
    pub fn notebook_job(
        &mut self,
        task_id: impl Into<String>,
        notebook_path: impl Into<String>,
    ) -> JobHandle {
        let handle = JobHandle(self.jobs.len());
        self.jobs.push(BuilderJob {
            task_id: task_id.into(),
            notebook_path: notebook_path.into(),
            params: BTreeMap::new(),
            connection: None,
        });
        handle
    }

    /// Set a notebook parameter on a previously added job.
    pub fn job_param(
        &mut self,
        job: JobHandle,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> &mut Self {
        if let Some(entry) = self.jobs.get_mut(job.0) {
            entry.params.insert(key.into(), value.into());
        }
        self
    }

    /// Override the connection for a previously added job.
    pub fn job_connection(
        &mut self,
        job: JobHandle,
        connection: impl Into<String>,
    ) -> &mut Self {
        if let Some(entry) = self.jobs.get_mut(job.0) {
            entry.connection = Some(connection.into());
        }
        self
    }

    /// Declare that `downstream` runs only after `upstream` succeeds.
    pub fn runs_after(&mut self, upstream: JobHandle, downstream: JobHandle) -> &mut Self {
        self.edges.push((upstream.0, downstream.0));
        self
    }

    /// Declare a left-to-right ordering over several jobs at once:
    /// `chain(&[a, b, c])` is `runs_after(a, b)` plus `runs_after(b, c)`.
    pub fn chain(&mut self, jobs: &[JobHandle]) -> &mut Self {
        for pair in jobs.windows(2) {
            self.runs_after(pair[0], pair[1]);
        }
        self
    }

    /// Validate and produce the registration payload.
    pub fn build(self) -> Result<PipelineSpec> {
        if self.jobs.is_empty() {
            return Err(LakedagError::ConfigError(format!(
                "pipeline '{}' has no jobs; add at least one notebook job",
                self.name
            )));
        }

        let cluster = self.cluster.ok_or_else(|| {
            LakedagError::ConfigError(format!(
                "pipeline '{}' has no cluster; call cluster() before build()",
                self.name
            ))
        })?;

        let start = self.start.ok_or_else(|| {
            LakedagError::ConfigError(format!(
                "pipeline '{}' has no start instant; call start() before build()",
                self.name
            ))
        })?;

        let mut seen = BTreeSet::new();
        for job in &self.jobs {
            if !seen.insert(job.task_id.as_str()) {
                return Err(LakedagError::ConfigError(format!(
                    "duplicate job id '{}'",
                    job.task_id
                )));
            }
        }

        for (upstream, downstream) in &self.edges {
            if *upstream >= self.jobs.len() || *downstream >= self.jobs.len() {
                return Err(LakedagError::ConfigError(format!(
                    "pipeline '{}' has a dependency edge referencing a job from another builder",
                    self.name
                )));
            }
            if upstream == downstream {
                return Err(LakedagError::ConfigError(format!(
                    "job '{}' cannot depend on itself",
                    self.jobs[*upstream].task_id
                )));
            }
        }

        let ids = self.jobs.iter().map(|j| j.task_id.as_str());
        let named_edges = self
            .edges
            .iter()
            .map(|(up, down)| {
                (
                    self.jobs[*up].task_id.as_str(),
                    self.jobs[*down].task_id.as_str(),
                )
            })
            .collect::<Vec<_>>();

        if let Err(node) = toposort_names(ids, named_edges.iter().copied()) {
            return Err(LakedagError::DagCycle(format!(
                "cycle detected in job DAG involving job '{}'",
                node
            )));
        }

        let mut edges: Vec<DependencyEdge> = named_edges
            .into_iter()
            .map(|(up, down)| DependencyEdge {
                upstream: up.to_string(),
                downstream: down.to_string(),
            })
            .collect();
        edges.sort_by(|a, b| {
            (a.upstream.as_str(), a.downstream.as_str())
                .cmp(&(b.upstream.as_str(), b.downstream.as_str()))
        });
        edges.dedup();

        let connection = self.connection;
        let tasks = self
            .jobs
            .into_iter()
            .map(|job| TaskSpec {
                task_id: job.task_id,
                connection_id: job.connection.unwrap_or_else(|| connection.clone()),
                new_cluster: cluster.clone(),
                notebook_task: NotebookTask {
                    notebook_path: job.notebook_path,
                    base_parameters: job.params,
                },
            })
            .collect();

        Ok(PipelineSpec {
            name: self.name,
            schedule: ScheduleSpec {
                start,
                interval: self.cadence,
                catchup: self.catchup,
                owner: self.owner,
                depends_on_past: self.depends_on_past,
                retries: self.retries,
                retry_delay_seconds: self.retry_delay.as_secs(),
            },
            tasks,
            edges,
        })
    }
}
