//! Emission ordering of top-level units using `petgraph`.
//!
//! A unit is either a single top-level declaration or a whole step group.
//! Units keep their declaration order unless an `after` clause names a
//! group declared later, in which case that group is hoisted to just
//! before its first dependent.

use petgraph::graph::{DiGraph, NodeIndex};
use quokka_common::error::{QuokkaError, Result, SemanticRule};
use quokka_common::types::SourcePosition;

#[derive(Debug)]
struct Unit {
    label: String,
    position: SourcePosition,
}

/// Ordering constraints between top-level units.
#[derive(Debug, Default)]
pub struct StepGraph {
    graph: DiGraph<Unit, ()>,
    /// Prerequisites of each unit in the order they were listed.
    prerequisites: Vec<Vec<NodeIndex>>,
}

impl StepGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit; units must be added in declaration order.
    pub fn add_unit(&mut self, label: impl Into<String>, position: SourcePosition) -> NodeIndex {
        self.prerequisites.push(Vec::new());
        self.graph.add_node(Unit {
            label: label.into(),
            position,
        })
    }

    /// Records that `dependent` must be emitted after `prerequisite`.
    ///
    /// The edge points from `prerequisite` to `dependent` so that a
    /// topological sort yields prerequisites first.
    pub fn add_prerequisite(&mut self, dependent: NodeIndex, prerequisite: NodeIndex) {
        let _ = self.graph.add_edge(prerequisite, dependent, ());
        self.prerequisites[dependent.index()].push(prerequisite);
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns unit indices in emission order.
    ///
    /// # Errors
    ///
    /// Returns a `dependency-cycle` semantic error positioned at a unit on
    /// the cycle if the prerequisites are cyclic.
    pub fn resolve_order(&self) -> Result<Vec<usize>> {
        if let Err(cycle) = petgraph::algo::toposort(&self.graph, None) {
            let unit = &self.graph[cycle.node_id()];
            return Err(QuokkaError::Semantic {
                position: unit.position,
                rule: SemanticRule::DependencyCycle,
                message: format!("step `{}` is part of a dependency cycle", unit.label),
            });
        }

        let mut visited = vec![false; self.len()];
        let mut order = Vec::with_capacity(self.len());
        for node in self.graph.node_indices() {
            self.visit(node, &mut visited, &mut order);
        }
        Ok(order)
    }

    /// Depth-first post-order walk from `root`, visiting prerequisites in
    /// the order they were listed. Uses an explicit stack so long `after`
    /// chains cannot exhaust the thread stack.
    fn visit(&self, root: NodeIndex, visited: &mut [bool], order: &mut Vec<usize>) {
        if visited[root.index()] {
            return;
        }
        visited[root.index()] = true;
        let mut stack = vec![(root, 0_usize)];
        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            match self.prerequisites[node.index()].get(next) {
                Some(&prerequisite) => {
                    frame.1 += 1;
                    if !visited[prerequisite.index()] {
                        visited[prerequisite.index()] = true;
                        stack.push((prerequisite, 0));
                    }
                }
                None => {
                    order.push(node.index());
                    let _ = stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> SourcePosition {
        SourcePosition::new(line, 1)
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = StepGraph::new();
        assert!(graph.is_empty());
        assert!(graph.resolve_order().expect("should resolve").is_empty());
    }

    #[test]
    fn declaration_order_without_prerequisites() {
        let mut graph = StepGraph::new();
        for line in 1..=4 {
            let _ = graph.add_unit(format!("u{line}"), at(line));
        }
        assert_eq!(graph.resolve_order().unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn earlier_prerequisite_keeps_order() {
        let mut graph = StepGraph::new();
        let fetch = graph.add_unit("fetch", at(1));
        let build = graph.add_unit("build", at(2));
        graph.add_prerequisite(build, fetch);
        assert_eq!(graph.resolve_order().unwrap(), vec![0, 1]);
    }

    #[test]
    fn forward_prerequisite_is_hoisted() {
        let mut graph = StepGraph::new();
        let _base = graph.add_unit("base", at(1));
        let build = graph.add_unit("build", at(2));
        let _run = graph.add_unit("run", at(3));
        let fetch = graph.add_unit("fetch", at(4));
        graph.add_prerequisite(build, fetch);
        assert_eq!(graph.resolve_order().unwrap(), vec![0, 3, 1, 2]);
    }

    #[test]
    fn prerequisites_visited_in_listed_order() {
        let mut graph = StepGraph::new();
        let app = graph.add_unit("app", at(1));
        let b = graph.add_unit("b", at(2));
        let a = graph.add_unit("a", at(3));
        graph.add_prerequisite(app, a);
        graph.add_prerequisite(app, b);
        assert_eq!(graph.resolve_order().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn transitive_forward_chain() {
        let mut graph = StepGraph::new();
        let a = graph.add_unit("a", at(1));
        let b = graph.add_unit("b", at(2));
        let c = graph.add_unit("c", at(3));
        graph.add_prerequisite(a, b);
        graph.add_prerequisite(b, c);
        assert_eq!(graph.resolve_order().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn cycle_detection() {
        let mut graph = StepGraph::new();
        let a = graph.add_unit("a", at(1));
        let b = graph.add_unit("b", at(2));
        graph.add_prerequisite(a, b);
        graph.add_prerequisite(b, a);

        let err = graph.resolve_order().unwrap_err();
        assert!(
            matches!(
                err,
                QuokkaError::Semantic {
                    rule: SemanticRule::DependencyCycle,
                    ..
                }
            ),
            "got: {err}"
        );
        assert!(err.to_string().contains("dependency cycle"), "got: {err}");
    }

    #[test]
    fn self_prerequisite_is_a_cycle() {
        let mut graph = StepGraph::new();
        let a = graph.add_unit("a", at(7));
        graph.add_prerequisite(a, a);
        let err = graph.resolve_order().unwrap_err();
        assert_eq!(err.position(), Some(at(7)));
    }

    #[test]
    fn long_forward_chain_resolves() {
        const UNITS: usize = 20_001;
        let mut graph = StepGraph::new();
        let nodes: Vec<_> = (0..UNITS)
            .map(|i| graph.add_unit(format!("s{i}"), at(i + 1)))
            .collect();
        for pair in nodes.windows(2) {
            graph.add_prerequisite(pair[0], pair[1]);
        }
        let order = graph.resolve_order().expect("chain is acyclic");
        assert_eq!(order.len(), UNITS);
        assert!(order.iter().rev().copied().eq(0..UNITS));
    }
}
