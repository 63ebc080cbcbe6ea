// tests/engine_contract.rs
//
// lakedag only declares pipelines; running them is the external
// scheduler's job. These tests pin down the contract a registered
// definition relies on, against the in-memory engine model.

use chrono::{DateTime, Utc};
use lakedag::engine::RunState;
use lakedag::pipeline::PipelineSpec;
use lakedag_test_utils::builders::{JobSectionBuilder, PipelineFileBuilder};
use lakedag_test_utils::fake_engine::FakeEngine;
use lakedag_test_utils::init_tracing;

fn ingestion_spec(retries: i64, depends_on_past: bool, catchup: bool) -> PipelineSpec {
    PipelineFileBuilder::new("ingestion")
        .start("2022-10-06")
        .retries(retries)
        .depends_on_past(depends_on_past)
        .catchup(catchup)
        .with_job(
            "covid-raw",
            JobSectionBuilder::new("/Users/someone/covid-raw").build(),
        )
        .with_job(
            "covid-bronze",
            JobSectionBuilder::new("/Users/someone/covid-bronze")
                .after("covid-raw")
                .build(),
        )
        .build()
        .into()
}

fn instant(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn exhausted_retries_block_downstream() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(1, false, false));

    // retries = 1 allows two attempts; fail both.
    engine.script_failures("covid-raw", 0, 2);
    engine.run_period(0);

    assert_eq!(engine.attempts_in_period(0, "covid-raw"), 2);
    assert_eq!(engine.outcome(0, "covid-raw"), Some(RunState::Failed));

    // The downstream job is never submitted, not even once.
    assert_eq!(engine.submissions_for("covid-bronze"), 0);
    assert_eq!(engine.outcome(0, "covid-bronze"), None);
}

#[test]
fn one_failure_recovers_within_the_retry_budget() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(1, false, false));

    engine.script_failures("covid-raw", 0, 1);
    engine.run_period(0);

    assert_eq!(engine.attempts_in_period(0, "covid-raw"), 2);
    assert_eq!(engine.outcome(0, "covid-raw"), Some(RunState::Succeeded));
    assert_eq!(engine.attempts_in_period(0, "covid-bronze"), 1);
    assert_eq!(engine.outcome(0, "covid-bronze"), Some(RunState::Succeeded));
}

#[test]
fn successful_upstream_submits_downstream_exactly_once_per_period() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, true));

    for index in 0..3 {
        engine.run_period(index);
        assert_eq!(engine.attempts_in_period(index, "covid-raw"), 1);
        assert_eq!(engine.attempts_in_period(index, "covid-bronze"), 1);
        assert_eq!(engine.outcome(index, "covid-bronze"), Some(RunState::Succeeded));
    }

    assert_eq!(engine.submissions_for("covid-raw"), 3);
    assert_eq!(engine.submissions_for("covid-bronze"), 3);

    // Within every period the upstream submission comes first.
    for index in 0..3 {
        let order: Vec<&str> = engine
            .submissions()
            .iter()
            .filter(|s| s.period_index == index)
            .map(|s| s.task_id.as_str())
            .collect();
        assert_eq!(order, vec!["covid-raw", "covid-bronze"]);
    }
}

#[test]
fn rerunning_a_materialized_period_is_a_no_op() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, false));

    engine.run_period(0);
    engine.run_period(0);

    assert_eq!(engine.attempts_in_period(0, "covid-raw"), 1);
    assert_eq!(engine.materialized_periods(), 1);
}

#[test]
fn depends_on_past_blocks_after_a_failed_period() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, true, true));

    engine.script_failures("covid-raw", 0, 1);
    engine.run_period(0);
    assert_eq!(engine.outcome(0, "covid-raw"), Some(RunState::Failed));

    engine.run_period(1);

    // covid-raw failed yesterday, so today it is not even submitted,
    // and covid-bronze stays blocked behind it.
    assert_eq!(engine.attempts_in_period(1, "covid-raw"), 0);
    assert_eq!(engine.outcome(1, "covid-raw"), None);
    assert_eq!(engine.attempts_in_period(1, "covid-bronze"), 0);
}

#[test]
fn depends_on_past_allows_the_next_period_after_success() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, true, true));

    engine.run_period(0);
    engine.run_period(1);

    for index in 0..2 {
        assert_eq!(engine.outcome(index, "covid-raw"), Some(RunState::Succeeded));
        assert_eq!(engine.outcome(index, "covid-bronze"), Some(RunState::Succeeded));
    }
}

#[test]
fn catchup_materializes_every_missed_period() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, true));

    let ran = engine.run_until(instant("2022-10-09T12:00:00Z"));

    assert_eq!(
        ran,
        vec![
            instant("2022-10-06T00:00:00Z"),
            instant("2022-10-07T00:00:00Z"),
            instant("2022-10-08T00:00:00Z"),
            instant("2022-10-09T00:00:00Z"),
        ]
    );
    assert_eq!(engine.submissions_for("covid-raw"), 4);
    assert_eq!(engine.materialized_periods(), 4);
}

#[test]
fn no_catchup_runs_only_the_latest_period() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, false));

    let ran = engine.run_until(instant("2022-10-09T12:00:00Z"));

    assert_eq!(ran, vec![instant("2022-10-09T00:00:00Z")]);
    assert_eq!(engine.submissions_for("covid-raw"), 1);
    assert_eq!(engine.materialized_periods(), 1);
}

#[test]
fn run_until_before_start_does_nothing() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, true));

    let ran = engine.run_until(instant("2022-10-05T00:00:00Z"));

    assert!(ran.is_empty());
    assert!(engine.submissions().is_empty());
}

#[test]
fn run_until_does_not_rerun_materialized_periods() {
    init_tracing();
    let mut engine = FakeEngine::new(ingestion_spec(0, false, true));

    let first = engine.run_until(instant("2022-10-07T12:00:00Z"));
    assert_eq!(first.len(), 2);

    let second = engine.run_until(instant("2022-10-08T12:00:00Z"));
    assert_eq!(second, vec![instant("2022-10-08T00:00:00Z")]);
    assert_eq!(engine.submissions_for("covid-raw"), 3);
}
