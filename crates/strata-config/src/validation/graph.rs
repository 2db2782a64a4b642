//! Reference graph and circular dependency detection

use crate::diagnostics::{ConfigurationError, ErrorKind, CYCLE_SEPARATOR};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Directed "file A references file B" graph for one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    edges: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: impl Into<String>) {
        self.edges.entry(node.into()).or_default();
    }

    /// Add `from -> to`, registering both nodes
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let to = to.into();
        self.add_node(to.clone());
        self.edges.entry(from.into()).or_default().insert(to);
    }

    pub fn references(&self, node: &str) -> impl Iterator<Item = &str> {
        self.edges
            .get(node)
            .into_iter()
            .flat_map(|targets| targets.iter().map(String::as_str))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first cycle finder over a [`ReferenceGraph`]
pub struct CycleDetector<'a> {
    graph: &'a ReferenceGraph,
    marks: BTreeMap<&'a str, Mark>,
    stack: Vec<&'a str>,
    cycles: Vec<Vec<String>>,
    seen: HashSet<Vec<String>>,
}

impl<'a> CycleDetector<'a> {
    pub fn new(graph: &'a ReferenceGraph) -> Self {
        Self {
            graph,
            marks: graph.nodes().map(|n| (n, Mark::Unvisited)).collect(),
            stack: Vec::new(),
            cycles: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Every distinct cycle, each closed by repeating its first node
    /// (`[a, b, a]`)
    pub fn find_cycles(mut self) -> Vec<Vec<String>> {
        let graph = self.graph;
        for node in graph.nodes() {
            if self.mark(node) == Mark::Unvisited {
                self.visit(node);
            }
        }
        self.cycles
    }

    fn mark(&self, node: &str) -> Mark {
        self.marks.get(node).copied().unwrap_or(Mark::Unvisited)
    }

    fn visit(&mut self, node: &'a str) {
        self.marks.insert(node, Mark::OnStack);
        self.stack.push(node);

        let graph = self.graph;
        for next in graph.references(node) {
            match self.mark(next) {
                Mark::Unvisited => self.visit(next),
                Mark::OnStack => self.record(next),
                Mark::Done => {}
            }
        }

        self.stack.pop();
        self.marks.insert(node, Mark::Done);
    }

    fn record(&mut self, start: &str) {
        let Some(first) = self.stack.iter().position(|n| *n == start) else {
            return;
        };
        let mut cycle: Vec<String> = self.stack[first..].iter().map(|n| n.to_string()).collect();
        cycle.push(start.to_string());

        if self.seen.insert(canonical(&cycle)) {
            self.cycles.push(cycle);
        }
    }
}

/// Rotation-independent key for a closed cycle
fn canonical(cycle: &[String]) -> Vec<String> {
    let open = &cycle[..cycle.len().saturating_sub(1)];
    let Some(min) = open.iter().enumerate().min_by_key(|(_, n)| *n).map(|(i, _)| i) else {
        return Vec::new();
    };
    open[min..].iter().chain(open[..min].iter()).cloned().collect()
}

/// Find all cycles in `graph`
pub fn find_cycles(graph: &ReferenceGraph) -> Vec<Vec<String>> {
    CycleDetector::new(graph).find_cycles()
}

/// One `CircularDependency` error per cycle, keyed by the arrow-joined path
pub fn cycle_diagnostics(cycles: &[Vec<String>]) -> Vec<ConfigurationError> {
    cycles
        .iter()
        .map(|cycle| {
            let path = cycle.join(CYCLE_SEPARATOR);
            ConfigurationError::error(
                ErrorKind::CircularDependency,
                path.clone(),
                format!("Circular dependency detected: {}", path),
            )
        })
        .collect()
}
