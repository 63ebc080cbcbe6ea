// tests/registration.rs
//
// Registration is an upsert keyed by pipeline name: submitting the same
// name again replaces the stored definition instead of creating a second
// pipeline.

use std::collections::BTreeMap;

use lakedag::engine::{HttpScheduler, RunState, RunStatus, SchedulerBackend};
use lakedag::errors::LakedagError;
use lakedag::pipeline::PipelineSpec;
use lakedag_test_utils::builders::{JobSectionBuilder, PipelineFileBuilder};
use lakedag_test_utils::fake_scheduler::FakeScheduler;
use lakedag_test_utils::{init_tracing, with_timeout};

fn sample_spec(name: &str) -> PipelineSpec {
    let file = PipelineFileBuilder::new(name)
        .with_job(
            "covid-raw",
            JobSectionBuilder::new("/Users/someone/covid-raw").build(),
        )
        .build();
    PipelineSpec::from(file)
}

#[tokio::test]
async fn registering_twice_replaces_instead_of_duplicating() {
    init_tracing();
    let mut sched = FakeScheduler::new();

    with_timeout(async {
        let first = sched
            .register_pipeline(sample_spec("covid_datalake"))
            .await
            .unwrap();
        assert!(!first.updated);

        let second = sched
            .register_pipeline(sample_spec("covid_datalake"))
            .await
            .unwrap();
        assert!(second.updated);
        assert_eq!(first.handle, second.handle);
    })
    .await;

    assert_eq!(sched.registered_names(), vec!["covid_datalake".to_string()]);
    assert_eq!(sched.register_call_count(), 2);
}

#[tokio::test]
async fn re_registration_stores_the_new_definition() {
    init_tracing();
    let mut sched = FakeScheduler::new();

    let one_job = sample_spec("covid_datalake");

    let two_jobs: PipelineSpec = PipelineFileBuilder::new("covid_datalake")
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
        .into();

    with_timeout(async {
        sched.register_pipeline(one_job).await.unwrap();
        sched.register_pipeline(two_jobs).await.unwrap();
    })
    .await;

    let stored = sched.registered_spec("covid_datalake").unwrap();
    assert_eq!(stored.tasks.len(), 2);
    assert_eq!(stored.edges.len(), 1);
}

#[tokio::test]
async fn triggering_an_unknown_pipeline_fails() {
    init_tracing();
    let mut sched = FakeScheduler::new();

    let err = with_timeout(sched.trigger_run("nope".to_string()))
        .await
        .unwrap_err();

    match err {
        LakedagError::Api { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("nope"));
        }
        other => panic!("expected an API error, got {other:?}"),
    }
}

#[tokio::test]
async fn scripted_run_states_replay_in_order() {
    init_tracing();
    let mut sched = FakeScheduler::new();

    let running = RunStatus {
        state: RunState::Running,
        tasks: BTreeMap::new(),
    };
    let succeeded = RunStatus {
        state: RunState::Succeeded,
        tasks: BTreeMap::new(),
    };
    sched.script_run_states(vec![running.clone(), running.clone(), succeeded.clone()]);

    with_timeout(async {
        sched.register_pipeline(sample_spec("covid_datalake")).await.unwrap();
        let run = sched
            .trigger_run("covid_datalake".to_string())
            .await
            .unwrap();

        assert_eq!(sched.run_state(run.clone()).await.unwrap(), running);
        assert_eq!(sched.run_state(run.clone()).await.unwrap(), running);
        assert_eq!(sched.run_state(run.clone()).await.unwrap(), succeeded);
        // Script exhausted: the final status keeps being reported.
        assert_eq!(sched.run_state(run).await.unwrap(), succeeded);
    })
    .await;

    assert_eq!(sched.triggered_names(), vec!["covid_datalake".to_string()]);
}

#[test]
fn scheduler_url_must_be_http() {
    init_tracing();

    let err = HttpScheduler::new("localhost:8080").unwrap_err();
    assert!(matches!(err, LakedagError::ConfigError(_)));

    assert!(HttpScheduler::new("http://localhost:8080").is_ok());
    assert!(HttpScheduler::new("https://scheduler.internal").is_ok());
}
