// tests/pipeline_files.rs
//
// The definitions shipped under pipelines/ must load, validate and
// produce the registration payload the scheduler expects.

use std::path::PathBuf;
use std::time::Duration;

use lakedag::config::{PipelineFile, load_dir};
use lakedag::pipeline::PipelineSpec;
use lakedag::types::Cadence;
use lakedag_test_utils::init_tracing;

fn pipelines_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("pipelines")
}

fn shipped() -> Vec<PipelineFile> {
    load_dir(pipelines_dir()).expect("shipped definitions must validate")
}

#[test]
fn shipped_definitions_validate() {
    init_tracing();
    let files = shipped();

    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["databricks_dag", "bruno_datalake_databricks_dag"]);
}

#[test]
fn exploration_definition_carries_its_schedule() {
    init_tracing();
    let files = shipped();
    let exploration = &files[0];

    assert_eq!(exploration.cadence, Cadence::Daily);
    assert!(!exploration.catchup);
    assert!(!exploration.defaults.depends_on_past);
    assert_eq!(exploration.defaults.owner, "airflow");
    assert_eq!(exploration.defaults.retries, 1);
    assert_eq!(exploration.defaults.retry_delay, Duration::from_secs(120));
    assert_eq!(exploration.start.to_rfc3339(), "2022-10-05T00:00:00+00:00");

    assert_eq!(exploration.cluster.num_workers, 2);
    assert_eq!(exploration.cluster.spark_version, "10.4.x-scala2.12");
    assert!(exploration.cluster.instance_profile_arn.is_some());

    let bronze = &exploration.jobs["covid-bronze"];
    assert_eq!(bronze.after, vec!["show-dbs".to_string()]);
    assert!(exploration.jobs["show-dbs"].after.is_empty());
}

#[test]
fn ingestion_definition_carries_its_schedule() {
    init_tracing();
    let files = shipped();
    let ingestion = &files[1];

    assert!(ingestion.catchup);
    assert!(ingestion.defaults.depends_on_past);
    assert_eq!(ingestion.cluster.num_workers, 8);
    assert_eq!(ingestion.start.to_rfc3339(), "2022-10-06T00:00:00+00:00");

    let bronze = &ingestion.jobs["covid-bronze"];
    assert_eq!(bronze.after, vec!["covid-raw".to_string()]);

    // Raw and bronze point at their own notebooks.
    let raw = &ingestion.jobs["covid-raw"];
    assert_ne!(raw.notebook_path, bronze.notebook_path);
    assert!(raw.notebook_path.ends_with("covid-raw"));
}

#[test]
fn registration_payload_includes_cluster_and_edges() {
    init_tracing();
    let files = shipped();
    let spec = PipelineSpec::from(&files[0]);

    let json = serde_json::to_value(&spec).expect("payload serializes");

    assert_eq!(json["name"], "databricks_dag");
    assert_eq!(json["schedule"]["interval"], "@daily");
    assert_eq!(json["schedule"]["catchup"], false);
    assert_eq!(json["schedule"]["retries"], 1);
    assert_eq!(json["schedule"]["retry_delay_seconds"], 120);

    let tasks = json["tasks"].as_array().expect("tasks array");
    assert_eq!(tasks.len(), 2);
    for task in tasks {
        assert_eq!(task["connection_id"], "databricks_default");
        assert_eq!(task["new_cluster"]["spark_version"], "10.4.x-scala2.12");
        assert_eq!(task["new_cluster"]["num_workers"], 2);
        // No parameters were set, so the field is omitted entirely.
        assert!(task["notebook_task"].get("base_parameters").is_none());
    }

    let edges = json["edges"].as_array().expect("edges array");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["upstream"], "show-dbs");
    assert_eq!(edges[0]["downstream"], "covid-bronze");
}
