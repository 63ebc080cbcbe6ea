// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::model::{
    ClusterSection, ClusterSpec, DefaultArgs, DefaultsSection, JobConfig, JobSection,
    PipelineFile, PipelineSection, RawPipelineFile,
};
use crate::dag::graph::toposort_names;
use crate::errors::{LakedagError, Result};
use crate::types::Cadence;

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = crate::errors::LakedagError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_jobs(&raw)?;
        validate_job_references(&raw)?;
        validate_dag(&raw)?;

        let RawPipelineFile {
            pipeline,
            defaults,
            cluster,
            job,
        } = raw;

        let name = validated_name(&pipeline)?;
        let start = parse_start(&pipeline.start)?;
        let cadence = parse_cadence(&pipeline.cadence)?;
        let defaults = validated_defaults(defaults)?;
        let cluster = validated_cluster(cluster)?;
        let jobs = validated_jobs(job)?;

        Ok(PipelineFile {
            name,
            start,
            cadence,
            catchup: pipeline.catchup,
            connection: pipeline.connection,
            defaults,
            cluster,
            jobs,
        })
    }
}

fn ensure_has_jobs(raw: &RawPipelineFile) -> Result<()> {
    if raw.job.is_empty() {
        return Err(LakedagError::ConfigError(
            "pipeline must contain at least one [job.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_job_references(raw: &RawPipelineFile) -> Result<()> {
    for (name, job) in raw.job.iter() {
        for dep in job.after.iter() {
            if !raw.job.contains_key(dep) {
                return Err(LakedagError::UnknownJob(format!(
                    "job '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(LakedagError::ConfigError(format!(
                    "job '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(raw: &RawPipelineFile) -> Result<()> {
    // Edge direction: dep -> job
    // For:
    //   [job.covid-bronze]
    //   after = ["covid-raw"]
    // we add edge covid-raw -> covid-bronze.
    let nodes = raw.job.keys().map(|s| s.as_str());
    let edges = raw.job.iter().flat_map(|(name, job)| {
        job.after.iter().map(move |dep| (dep.as_str(), name.as_str()))
    });

    match toposort_names(nodes, edges) {
        Ok(_order) => Ok(()),
        Err(node) => Err(LakedagError::DagCycle(format!(
            "cycle detected in job DAG involving job '{}'",
            node
        ))),
    }
}

fn validated_name(pipeline: &PipelineSection) -> Result<String> {
    let name = pipeline.name.trim();
    if name.is_empty() {
        return Err(LakedagError::ConfigError(
            "[pipeline].name must not be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn parse_start(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(s) {
        return Ok(instant.with_timezone(&Utc));
    }

    // A bare date means midnight UTC of that day.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(LakedagError::ConfigError(format!(
        "[pipeline].start must be an RFC 3339 instant or a YYYY-MM-DD date (got '{s}')"
    )))
}

fn parse_cadence(s: &str) -> Result<Cadence> {
    s.parse::<Cadence>()
        .map_err(|e| LakedagError::ConfigError(format!("[pipeline].cadence: {e}")))
}

fn validated_defaults(defaults: DefaultsSection) -> Result<DefaultArgs> {
    let retries = non_negative_u32("[defaults].retries", defaults.retries)?;
    let retry_delay = parse_duration(&defaults.retry_delay)
        .map_err(|e| LakedagError::ConfigError(format!("[defaults].retry_delay: {e}")))?;

    Ok(DefaultArgs {
        owner: defaults.owner,
        depends_on_past: defaults.depends_on_past,
        retries,
        retry_delay,
    })
}

fn validated_cluster(cluster: ClusterSection) -> Result<ClusterSpec> {
    if cluster.spark_version.trim().is_empty() {
        return Err(LakedagError::ConfigError(
            "[cluster].spark_version must not be empty".to_string(),
        ));
    }
    if cluster.node_type_id.trim().is_empty() {
        return Err(LakedagError::ConfigError(
            "[cluster].node_type_id must not be empty".to_string(),
        ));
    }

    let num_workers = non_negative_u32("[cluster].num_workers", cluster.num_workers)?;

    Ok(ClusterSpec {
        spark_version: cluster.spark_version,
        num_workers,
        node_type_id: cluster.node_type_id,
        instance_profile_arn: cluster.instance_profile_arn,
    })
}

fn validated_jobs(
    jobs: BTreeMap<String, JobSection>,
) -> Result<BTreeMap<String, JobConfig>> {
    let mut out = BTreeMap::new();

    for (name, job) in jobs {
        if job.notebook_path.trim().is_empty() {
            return Err(LakedagError::ConfigError(format!(
                "job '{}' has an empty notebook_path",
                name
            )));
        }

        out.insert(
            name,
            JobConfig {
                notebook_path: job.notebook_path,
                params: job.params,
                after: job.after,
                connection: job.connection,
            },
        );
    }

    Ok(out)
}

fn non_negative_u32(field: &str, value: i64) -> Result<u32> {
    if value < 0 {
        return Err(LakedagError::ConfigError(format!(
            "{field} must be >= 0 (got {value})"
        )));
    }
    u32::try_from(value).map_err(|_| {
        LakedagError::ConfigError(format!("{field} is too large (got {value})"))
    })
}

/// Parse a simple duration string like `"2m"`, `"30s"`, `"250ms"`, `"1h"`.
///
/// This is intentionally minimal; it matches the values the shipped
/// definitions use.
fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
