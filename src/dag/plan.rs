// src/dag/plan.rs

use std::collections::BTreeMap;

use crate::config::model::PipelineFile;
use crate::dag::graph::JobGraph;

/// The order in which the engine submits a pipeline's jobs within one
/// schedule period.
///
/// Jobs are grouped into waves: every job in wave `i` has all of its
/// dependencies in waves `0..i`, so a job is never submitted before each of
/// its upstream jobs has succeeded. Jobs inside a wave share no edges and
/// may be submitted in any order; they are kept name-sorted so plans are
/// stable across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPlan {
    waves: Vec<Vec<String>>,
}

impl SubmissionPlan {
    pub fn for_file(file: &PipelineFile) -> Self {
        Self::from_graph(&JobGraph::from_file(file))
    }

    /// Layer the graph into dependency waves (Kahn's algorithm, one
    /// generation per step).
    pub fn from_graph(graph: &JobGraph) -> Self {
        let mut indegree: BTreeMap<&str, usize> = graph
            .jobs()
            .map(|job| (job, graph.dependencies_of(job).len()))
            .collect();

        let mut waves: Vec<Vec<String>> = Vec::new();

        while !indegree.is_empty() {
            let ready: Vec<&str> = indegree
                .iter()
                .filter(|(_, degree)| **degree == 0)
                .map(|(job, _)| *job)
                .collect();

            // Unreachable for validated definitions; guards against a
            // caller handing us a cyclic graph.
            if ready.is_empty() {
                break;
            }

            for job in &ready {
                indegree.remove(*job);
                for dependent in graph.dependents_of(job) {
                    if let Some(degree) = indegree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                    }
                }
            }

            waves.push(ready.into_iter().map(str::to_string).collect());
        }

        Self { waves }
    }

    pub fn waves(&self) -> &[Vec<String>] {
        &self.waves
    }

    pub fn job_count(&self) -> usize {
        self.waves.iter().map(Vec::len).sum()
    }

    /// Jobs in submission order, upstream waves first.
    pub fn submission_order(&self) -> impl Iterator<Item = &str> {
        self.waves
            .iter()
            .flat_map(|wave| wave.iter().map(String::as_str))
    }

    /// Index of the wave a job is submitted in.
    pub fn wave_of(&self, job: &str) -> Option<usize> {
        self.waves
            .iter()
            .position(|wave| wave.iter().any(|j| j == job))
    }
}
