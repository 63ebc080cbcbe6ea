// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod types;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::{default_pipelines_dir, load_dir};
use crate::config::model::PipelineFile;
use crate::dag::SubmissionPlan;
use crate::engine::{HttpScheduler, RunId, RunState, SchedulerBackend};
use crate::pipeline::PipelineSpec;

/// How often `trigger --watch` polls the scheduler.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// High-level entry point used by `main.rs`.
///
/// Loads the definitions under `--dir` and dispatches the subcommand:
/// - `validate` / `plan` work offline
/// - `register` / `trigger` talk to the scheduler
pub async fn run(args: CliArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(default_pipelines_dir);

    match args.command {
        Command::Validate => {
            let pipelines = load_pipelines(&dir)?;
            if pipelines.is_empty() {
                warn!(dir = %dir.display(), "no pipeline definitions found");
                return Ok(());
            }
            for pipeline in &pipelines {
                info!(
                    pipeline = %pipeline.name,
                    jobs = pipeline.jobs.len(),
                    "definition is valid"
                );
            }
            println!("{} definition(s) OK", pipelines.len());
            Ok(())
        }
        Command::Plan => {
            let pipelines = load_pipelines(&dir)?;
            if pipelines.is_empty() {
                warn!(dir = %dir.display(), "no pipeline definitions found");
                return Ok(());
            }
            for pipeline in &pipelines {
                print_plan(pipeline);
            }
            Ok(())
        }
        Command::Register { scheduler } => {
            let pipelines = load_pipelines(&dir)?;
            if pipelines.is_empty() {
                warn!(dir = %dir.display(), "no pipeline definitions found");
                return Ok(());
            }
            let mut backend = scheduler_from_env(&scheduler)?;
            register_all(&mut backend, &pipelines).await
        }
        Command::Trigger {
            name,
            scheduler,
            watch,
        } => {
            let mut backend = scheduler_from_env(&scheduler)?;

            let run = backend.trigger_run(name.clone()).await?;
            info!(pipeline = %name, run = %run, "run triggered");
            println!("triggered run {run}");

            if watch {
                watch_run(&mut backend, run).await?;
            }
            Ok(())
        }
    }
}

/// Load every definition under `dir`, tagging errors with the directory.
fn load_pipelines(dir: &Path) -> Result<Vec<PipelineFile>> {
    load_dir(dir).with_context(|| {
        format!("failed to load pipeline definitions from {}", dir.display())
    })
}

/// Build the HTTP backend, picking up a bearer token from `LAKEDAG_TOKEN`.
fn scheduler_from_env(base_url: &str) -> Result<HttpScheduler> {
    let mut backend = HttpScheduler::new(base_url)?;
    if let Ok(token) = std::env::var("LAKEDAG_TOKEN") {
        if !token.is_empty() {
            backend = backend.with_token(token);
        }
    }
    Ok(backend)
}

/// Upsert every definition, in file order.
async fn register_all(
    backend: &mut dyn SchedulerBackend,
    pipelines: &[PipelineFile],
) -> Result<()> {
    for pipeline in pipelines {
        let spec = PipelineSpec::from(pipeline);
        let registered = backend.register_pipeline(spec).await?;

        if registered.updated {
            info!(
                pipeline = %pipeline.name,
                handle = %registered.handle,
                "replaced existing definition"
            );
        } else {
            info!(
                pipeline = %pipeline.name,
                handle = %registered.handle,
                "registered new definition"
            );
        }
        println!("registered {} -> {}", pipeline.name, registered.handle);
    }
    Ok(())
}

/// Poll a run until it reaches a terminal state.
///
/// A failed run becomes a non-zero exit from `main`.
async fn watch_run(backend: &mut dyn SchedulerBackend, run: RunId) -> Result<()> {
    loop {
        let status = backend.run_state(run.clone()).await?;

        for (task, state) in &status.tasks {
            debug!(task = %task, state = %state, "task state");
        }

        if status.state.is_terminal() {
            info!(run = %run, state = %status.state, "run finished");
            println!("run {run} finished: {}", status.state);
            if status.state == RunState::Failed {
                anyhow::bail!("run {run} failed");
            }
            return Ok(());
        }

        info!(run = %run, state = %status.state, "run in progress");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Plan output: schedule summary plus submission waves, upstream first.
fn print_plan(pipeline: &PipelineFile) {
    let plan = SubmissionPlan::for_file(pipeline);

    println!("pipeline {}", pipeline.name);
    println!(
        "  cadence: {} (start {})",
        pipeline.cadence,
        pipeline.start.to_rfc3339()
    );
    println!("  catchup: {}", pipeline.catchup);
    println!(
        "  retries: {} (delay {}s)",
        pipeline.defaults.retries,
        pipeline.defaults.retry_delay.as_secs()
    );
    println!(
        "  cluster: {} x {} ({})",
        pipeline.cluster.num_workers,
        pipeline.cluster.node_type_id,
        pipeline.cluster.spark_version
    );

    println!("  waves:");
    for (i, wave) in plan.waves().iter().enumerate() {
        println!("    {}: {}", i + 1, wave.join(", "));
    }

    println!("  jobs ({}):", pipeline.jobs.len());
    for (name, job) in pipeline.jobs.iter() {
        println!("  - {name}");
        println!("      notebook: {}", job.notebook_path);
        if !job.after.is_empty() {
            println!("      after: {:?}", job.after);
        }
        if let Some(ref connection) = job.connection {
            println!("      connection: {connection}");
        }
        for (key, value) in job.params.iter() {
            println!("      param {key} = {value}");
        }
    }
    println!();
}
