// tests/load_toml.rs

use std::error::Error;
use std::fs;
use std::time::Duration;

use tempfile::tempdir;

use lakedag::config::{ParamValue, load_and_validate, load_dir};
use lakedag::errors::LakedagError;
use lakedag::types::Cadence;
use lakedag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const FULL_DEFINITION: &str = r#"
[pipeline]
name = "covid_datalake"
start = "2022-10-06"
cadence = "daily"
catchup = true
connection = "databricks_default"

[defaults]
owner = "data-eng"
depends_on_past = true
retries = 1
retry_delay = "2m"

[cluster]
spark_version = "10.4.x-scala2.12"
num_workers = 8
node_type_id = "i3.xlarge"
instance_profile_arn = "arn:aws:iam::123456789012:instance-profile/datalake"

[job.covid-raw]
notebook_path = "/Users/someone/covid-raw"
params = { source = "s3://covid/raw", limit = 100, dry_run = false }

[job.covid-bronze]
notebook_path = "/Users/someone/covid-bronze"
after = ["covid-raw"]
connection = "databricks_eu"
"#;

#[test]
fn load_and_validate_reads_a_full_definition() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("covid.toml");
    fs::write(&path, FULL_DEFINITION)?;

    let file = load_and_validate(&path)?;

    assert_eq!(file.name, "covid_datalake");
    assert_eq!(file.cadence, Cadence::Daily);
    assert!(file.catchup);
    assert_eq!(file.defaults.owner, "data-eng");
    assert_eq!(file.defaults.retries, 1);
    assert_eq!(file.defaults.retry_delay, Duration::from_secs(120));
    assert_eq!(file.cluster.num_workers, 8);

    let raw = &file.jobs["covid-raw"];
    assert_eq!(raw.params["source"], ParamValue::Text("s3://covid/raw".into()));
    assert_eq!(raw.params["limit"], ParamValue::Int(100));
    assert_eq!(raw.params["dry_run"], ParamValue::Bool(false));
    assert_eq!(file.connection_for(raw), "databricks_default");

    let bronze = &file.jobs["covid-bronze"];
    assert_eq!(file.connection_for(bronze), "databricks_eu");

    Ok(())
}

#[test]
fn omitted_sections_fall_back_to_defaults() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("minimal.toml");
    fs::write(
        &path,
        r#"
[pipeline]
name = "minimal"
start = "2022-10-06"

[cluster]
spark_version = "10.4.x-scala2.12"
num_workers = 1
node_type_id = "i3.xlarge"

[job.only]
notebook_path = "/nb/only"
"#,
    )?;

    let file = load_and_validate(&path)?;

    assert_eq!(file.cadence, Cadence::Daily);
    assert!(!file.catchup);
    assert_eq!(file.connection, "notebook_default");
    assert_eq!(file.defaults.owner, "lakedag");
    assert_eq!(file.defaults.retries, 0);
    assert_eq!(file.defaults.retry_delay, Duration::from_secs(300));
    assert!(!file.defaults.depends_on_past);

    Ok(())
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[pipeline\nname = ")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, LakedagError::TomlError(_)));

    Ok(())
}

#[test]
fn missing_file_is_an_io_error() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, LakedagError::IoError(_)));

    Ok(())
}

#[test]
fn load_dir_ignores_files_without_the_toml_extension() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    fs::write(dir.path().join("covid.toml"), FULL_DEFINITION)?;
    fs::write(dir.path().join("README.md"), "# not a definition")?;

    let pipelines = load_dir(dir.path())?;
    assert_eq!(pipelines.len(), 1);

    Ok(())
}

#[test]
fn load_dir_names_the_offending_file() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    fs::write(dir.path().join("good.toml"), FULL_DEFINITION)?;
    fs::write(
        dir.path().join("bad.toml"),
        FULL_DEFINITION.replace("retries = 1", "retries = -1"),
    )?;

    let err = load_dir(dir.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bad.toml"), "unexpected error: {message}");
    assert!(message.contains("[defaults].retries"));

    Ok(())
}
