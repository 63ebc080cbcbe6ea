// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::PipelineFile;

/// Topologically sort named nodes, returning the order or the name of a
/// node involved in a cycle.
///
/// Edge direction is upstream -> downstream.
pub fn toposort_names<'a>(
    nodes: impl IntoIterator<Item = &'a str>,
    edges: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Vec<&'a str>, String> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for node in nodes {
        graph.add_node(node);
    }
    for (upstream, downstream) in edges {
        graph.add_edge(upstream, downstream, ());
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order),
        Err(cycle) => Err(cycle.node_id().to_string()),
    }
}

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone)]
struct JobNode {
    /// Direct dependencies: jobs that must succeed before this one is
    /// submitted.
    deps: Vec<String>,
    /// Direct dependents: jobs that depend on this one.
    dependents: Vec<String>,
}

/// Simple in-memory DAG representation keyed by job name.
///
/// This is intentionally lightweight; acyclicity is already validated when
/// the definition is loaded or built, so here we just keep adjacency
/// information for planning and diagnostics.
#[derive(Debug, Clone)]
pub struct JobGraph {
    nodes: HashMap<String, JobNode>,
}

impl JobGraph {
    /// Build a graph from a validated [`PipelineFile`].
    ///
    /// Assumes that:
    /// - all `after` references are valid
    /// - there are no cycles
    pub fn from_file(file: &PipelineFile) -> Self {
        Self::from_edges(
            file.jobs.keys().map(|s| s.as_str()),
            file.jobs.iter().flat_map(|(name, job)| {
                job.after.iter().map(move |dep| (dep.as_str(), name.as_str()))
            }),
        )
    }

    /// Build a graph from explicit nodes and upstream -> downstream edges.
    ///
    /// Edges referencing unknown nodes are ignored; callers validate
    /// references before building.
    pub fn from_edges<'a>(
        jobs: impl IntoIterator<Item = &'a str>,
        edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut nodes: HashMap<String, JobNode> = HashMap::new();

        for job in jobs {
            nodes.insert(
                job.to_string(),
                JobNode {
                    deps: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        for (upstream, downstream) in edges {
            if !nodes.contains_key(upstream) || !nodes.contains_key(downstream) {
                continue;
            }
            if let Some(node) = nodes.get_mut(downstream) {
                node.deps.push(upstream.to_string());
            }
            if let Some(node) = nodes.get_mut(upstream) {
                node.dependents.push(downstream.to_string());
            }
        }

        Self { nodes }
    }

    /// Return all job names.
    pub fn jobs(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a job (the jobs listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a job (jobs that list this one in their
    /// `after`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Jobs with no dependencies; the first submission wave of every period.
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.deps.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        roots.sort_unstable();
        roots
    }
}
