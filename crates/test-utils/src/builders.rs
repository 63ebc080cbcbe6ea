#![allow(dead_code)]

use std::collections::BTreeMap;

use lakedag::config::model::{
    ClusterSection, DefaultsSection, JobSection, ParamValue, PipelineFile, PipelineSection,
    RawPipelineFile,
};

/// Builder for `PipelineFile` to simplify test setup.
///
/// Starts from a small valid definition (daily cadence, two-worker
/// cluster) so tests only set the fields they care about.
pub struct PipelineFileBuilder {
    raw: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            raw: RawPipelineFile {
                pipeline: PipelineSection {
                    name: name.to_string(),
                    start: "2022-10-05".to_string(),
                    cadence: "daily".to_string(),
                    catchup: false,
                    connection: "databricks_default".to_string(),
                },
                defaults: DefaultsSection::default(),
                cluster: ClusterSection {
                    spark_version: "10.4.x-scala2.12".to_string(),
                    num_workers: 2,
                    node_type_id: "i3.xlarge".to_string(),
                    instance_profile_arn: None,
                },
                job: BTreeMap::new(),
            },
        }
    }

    pub fn with_job(mut self, name: &str, job: JobSection) -> Self {
        self.raw.job.insert(name.to_string(), job);
        self
    }

    pub fn start(mut self, start: &str) -> Self {
        self.raw.pipeline.start = start.to_string();
        self
    }

    pub fn cadence(mut self, cadence: &str) -> Self {
        self.raw.pipeline.cadence = cadence.to_string();
        self
    }

    pub fn catchup(mut self, catchup: bool) -> Self {
        self.raw.pipeline.catchup = catchup;
        self
    }

    pub fn connection(mut self, connection: &str) -> Self {
        self.raw.pipeline.connection = connection.to_string();
        self
    }

    pub fn owner(mut self, owner: &str) -> Self {
        self.raw.defaults.owner = owner.to_string();
        self
    }

    pub fn depends_on_past(mut self, val: bool) -> Self {
        self.raw.defaults.depends_on_past = val;
        self
    }

    pub fn retries(mut self, retries: i64) -> Self {
        self.raw.defaults.retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: &str) -> Self {
        self.raw.defaults.retry_delay = delay.to_string();
        self
    }

    pub fn num_workers(mut self, n: i64) -> Self {
        self.raw.cluster.num_workers = n;
        self
    }

    /// The raw file, for tests exercising validation failures.
    pub fn build_raw(self) -> RawPipelineFile {
        self.raw
    }

    pub fn build(self) -> PipelineFile {
        PipelineFile::try_from(self.raw).expect("Failed to build valid pipeline from builder")
    }
}

/// Builder for `JobSection`.
pub struct JobSectionBuilder {
    job: JobSection,
}

impl JobSectionBuilder {
    pub fn new(notebook_path: &str) -> Self {
        Self {
            job: JobSection {
                notebook_path: notebook_path.to_string(),
                params: BTreeMap::new(),
                after: vec![],
                connection: None,
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.job.after.push(dep.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: ParamValue) -> Self {
        self.job.params.insert(key.to_string(), value);
        self
    }

    pub fn connection(mut self, connection: &str) -> Self {
        self.job.connection = Some(connection.to_string());
        self
    }

    pub fn build(self) -> JobSection {
        self.job
    }
}
