use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use lakedag::engine::{RegisteredPipeline, RunId, RunStatus, SchedulerBackend};
use lakedag::errors::{LakedagError, Result};
use lakedag::pipeline::PipelineSpec;

/// A fake scheduler that:
/// - stores registered specs keyed by name (upsert, like the real API)
/// - records every registration and trigger call
/// - hands out sequential run ids and replays scripted run states.
#[derive(Clone, Default)]
pub struct FakeScheduler {
    registered: Arc<Mutex<BTreeMap<String, PipelineSpec>>>,
    register_calls: Arc<Mutex<Vec<String>>>,
    triggered: Arc<Mutex<Vec<String>>>,
    scripted_states: Arc<Mutex<Vec<RunStatus>>>,
    next_run: Arc<Mutex<u64>>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the statuses `run_state` will report, in order. The last one
    /// keeps being reported once the script runs out.
    pub fn script_run_states(&self, states: Vec<RunStatus>) {
        let mut guard = self.scripted_states.lock().unwrap();
        *guard = states;
        guard.reverse(); // pop() takes from the back
    }

    /// Names with a stored definition.
    pub fn registered_names(&self) -> Vec<String> {
        self.registered.lock().unwrap().keys().cloned().collect()
    }

    /// The stored definition for `name`, if any.
    pub fn registered_spec(&self, name: &str) -> Option<PipelineSpec> {
        self.registered.lock().unwrap().get(name).cloned()
    }

    /// Total number of registration calls (including replacements).
    pub fn register_call_count(&self) -> usize {
        self.register_calls.lock().unwrap().len()
    }

    /// Pipeline names triggered, in call order.
    pub fn triggered_names(&self) -> Vec<String> {
        self.triggered.lock().unwrap().clone()
    }
}

impl SchedulerBackend for FakeScheduler {
    fn register_pipeline(
        &mut self,
        spec: PipelineSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RegisteredPipeline>> + Send + '_>> {
        let registered = Arc::clone(&self.registered);
        let register_calls = Arc::clone(&self.register_calls);

        Box::pin(async move {
            let name = spec.name.clone();
            register_calls.lock().unwrap().push(name.clone());

            let updated = {
                let mut guard = registered.lock().unwrap();
                guard.insert(name.clone(), spec).is_some()
            };

            Ok(RegisteredPipeline {
                handle: format!("pl-{name}"),
                updated,
            })
        })
    }

    fn trigger_run(
        &mut self,
        name: String,
    ) -> Pin<Box<dyn Future<Output = Result<RunId>> + Send + '_>> {
        let registered = Arc::clone(&self.registered);
        let triggered = Arc::clone(&self.triggered);
        let next_run = Arc::clone(&self.next_run);

        Box::pin(async move {
            if !registered.lock().unwrap().contains_key(&name) {
                return Err(LakedagError::Api {
                    status: 404,
                    message: format!("no pipeline named '{name}'"),
                });
            }

            triggered.lock().unwrap().push(name);

            let id = {
                let mut guard = next_run.lock().unwrap();
                *guard += 1;
                *guard
            };
            Ok(RunId(format!("run-{id}")))
        })
    }

    fn run_state(
        &mut self,
        _run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<RunStatus>> + Send + '_>> {
        let scripted = Arc::clone(&self.scripted_states);

        Box::pin(async move {
            let mut guard = scripted.lock().unwrap();
            match guard.len() {
                0 => Err(LakedagError::Api {
                    status: 404,
                    message: "no run state scripted".to_string(),
                }),
                1 => Ok(guard[0].clone()),
                _ => Ok(guard.pop().expect("length checked above")),
            }
        })
    }
}
