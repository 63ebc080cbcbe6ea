use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use lakedag::engine::RunState;
use lakedag::pipeline::PipelineSpec;

/// One submission the engine made: an attempt of a job within a period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub period_index: usize,
    pub period: DateTime<Utc>,
    pub task_id: String,
    pub attempt: u32,
}

/// In-memory model of the scheduler/engine side of the contract.
///
/// lakedag itself never runs jobs; this model exists so tests can pin down
/// what a registered definition *means*:
///
/// - within a period, jobs are submitted in dependency order, and a job
///   whose upstream did not succeed is never submitted;
/// - a failed attempt is re-queued until the retry budget (`retries + 1`
///   attempts) is exhausted, at which point the job is `failed`;
/// - with `depends_on_past`, a job also waits for its own success in the
///   previously materialized period;
/// - with `catchup`, every period from `start` to now is materialized,
///   otherwise only the most recent one.
pub struct FakeEngine {
    spec: PipelineSpec,
    /// `(task, period_index)` -> leading attempts that fail.
    scripted_failures: BTreeMap<(String, usize), u32>,
    materialized: BTreeSet<usize>,
    submissions: Vec<Submission>,
    outcomes: BTreeMap<(usize, String), RunState>,
}

impl FakeEngine {
    pub fn new(spec: PipelineSpec) -> Self {
        Self {
            spec,
            scripted_failures: BTreeMap::new(),
            materialized: BTreeSet::new(),
            submissions: Vec::new(),
            outcomes: BTreeMap::new(),
        }
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Make the first `failing_attempts` attempts of `task` fail in period
    /// `period_index`.
    pub fn script_failures(&mut self, task: &str, period_index: usize, failing_attempts: u32) {
        self.scripted_failures
            .insert((task.to_string(), period_index), failing_attempts);
    }

    /// The period start instants the engine considers due at `now`.
    ///
    /// With catchup on this is every instant from `start` stepping by the
    /// cadence; with catchup off only the most recent due instant.
    pub fn due_periods(&self, now: DateTime<Utc>) -> Vec<(usize, DateTime<Utc>)> {
        let mut due = Vec::new();
        let mut instant = self.spec.schedule.start;
        let mut index = 0usize;

        while instant <= now {
            due.push((index, instant));
            instant = self.spec.schedule.interval.advance(instant);
            index += 1;
        }

        if !self.spec.schedule.catchup {
            return due.into_iter().last().into_iter().collect();
        }
        due
    }

    /// Materialize every period due at `now` that has not run yet.
    /// Returns the instants that were materialized.
    pub fn run_until(&mut self, now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let mut ran = Vec::new();
        for (index, instant) in self.due_periods(now) {
            if self.materialized.contains(&index) {
                continue;
            }
            self.run_period_at(index, instant);
            ran.push(instant);
        }
        ran
    }

    /// Materialize a single period by its index in the schedule sequence
    /// (period 0 starts at `start`). Re-running an index is a no-op.
    pub fn run_period(&mut self, index: usize) -> DateTime<Utc> {
        let mut instant = self.spec.schedule.start;
        for _ in 0..index {
            instant = self.spec.schedule.interval.advance(instant);
        }
        if !self.materialized.contains(&index) {
            self.run_period_at(index, instant);
        }
        instant
    }

    fn run_period_at(&mut self, index: usize, instant: DateTime<Utc>) {
        let plan = self.spec.plan();
        let graph = self.spec.graph();
        let budget = self.spec.schedule.retries + 1;
        let previous = self.materialized.range(..index).next_back().copied();

        for wave in plan.waves() {
            for task in wave {
                let upstream_ok = graph.dependencies_of(task).iter().all(|up| {
                    self.outcomes.get(&(index, up.clone())) == Some(&RunState::Succeeded)
                });

                let past_ok = !self.spec.schedule.depends_on_past
                    || match previous {
                        None => true,
                        Some(prev) => {
                            self.outcomes.get(&(prev, task.clone()))
                                == Some(&RunState::Succeeded)
                        }
                    };

                // Blocked jobs are never submitted and leave no outcome,
                // which in turn blocks their own dependents.
                if !upstream_ok || !past_ok {
                    continue;
                }

                let failing = self
                    .scripted_failures
                    .get(&(task.clone(), index))
                    .copied()
                    .unwrap_or(0);

                let mut state = RunState::Failed;
                for attempt in 1..=budget {
                    self.submissions.push(Submission {
                        period_index: index,
                        period: instant,
                        task_id: task.clone(),
                        attempt,
                    });
                    if attempt > failing {
                        state = RunState::Succeeded;
                        break;
                    }
                }

                self.outcomes.insert((index, task.clone()), state);
            }
        }

        self.materialized.insert(index);
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Total submissions of `task` across all periods and attempts.
    pub fn submissions_for(&self, task: &str) -> usize {
        self.submissions
            .iter()
            .filter(|s| s.task_id == task)
            .count()
    }

    /// Attempts of `task` within one period.
    pub fn attempts_in_period(&self, index: usize, task: &str) -> u32 {
        self.submissions
            .iter()
            .filter(|s| s.period_index == index && s.task_id == task)
            .count() as u32
    }

    /// Terminal state of `task` in a period, if it was submitted at all.
    pub fn outcome(&self, index: usize, task: &str) -> Option<RunState> {
        self.outcomes.get(&(index, task.to_string())).copied()
    }

    pub fn materialized_periods(&self) -> usize {
        self.materialized.len()
    }
}
