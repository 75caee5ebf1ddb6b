//! The unified resource dependency graph.

use cfm_model::{NodeId, ResourceNode};
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::GraphError;

/// How confident the builder is in an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    /// From an explicit ordering hint or a reference in a property tree.
    Strong,
    /// From a best-effort identifier match. Advisory: weak edges never
    /// force module placement and never produce bindings.
    Weak,
}

/// Directed dependency graph over all discovered resources.
///
/// An edge `A -> B` means B depends on A, so topological order yields
/// dependencies first. Node payloads iterate in ingestion order.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    nodes: IndexMap<NodeId, ResourceNode>,
    edges: DiGraphMap<NodeId, EdgeKind>,
}

impl ResourceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node. Nodes are created exactly once; a second insert with
    /// the same id is an error.
    pub fn add_node(&mut self, node: ResourceNode) -> Result<NodeId, GraphError> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode {
                name: node.display_name(),
            });
        }
        self.edges.add_node(id);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Adds a dependency edge `from -> to` (to depends on from).
    ///
    /// Self-loops are dropped. A strong edge wins over an existing weak one
    /// for the same pair; a weak edge never downgrades a strong one.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return Err(GraphError::NodeNotFound);
        }
        if from == to {
            tracing::debug!("ignoring self dependency on {}", self.display_name(from));
            return Ok(());
        }
        match self.edges.edge_weight(from, to) {
            Some(EdgeKind::Strong) => {}
            Some(EdgeKind::Weak) | None => {
                self.edges.add_edge(from, to, kind);
            }
        }
        Ok(())
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges of any kind.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// True when the node is present.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Immutable access to one node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(&id)
    }

    /// Mutable access to one node, for later phases filling fields in.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut ResourceNode> {
        self.nodes.get_mut(&id)
    }

    /// Node ids in ingestion order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    /// Nodes in ingestion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// All edges as `(from, to, kind)` triples.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, EdgeKind)> + '_ {
        self.edges.all_edges().map(|(a, b, kind)| (a, b, *kind))
    }

    /// Direct dependencies of a node (incoming edge sources), any kind.
    pub fn dependencies_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.neighbors_directed(id, Direction::Incoming)
    }

    /// Direct dependents of a node (outgoing edge targets), any kind.
    pub fn dependents_of(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges.neighbors_directed(id, Direction::Outgoing)
    }

    /// The edge kind between two nodes, when an edge exists.
    #[must_use]
    pub fn edge_kind(&self, from: NodeId, to: NodeId) -> Option<EdgeKind> {
        self.edges.edge_weight(from, to).copied()
    }

    /// Verifies the strong-edge subgraph is acyclic.
    ///
    /// # Errors
    /// Returns [`GraphError::CyclicDependency`] naming the nodes of the
    /// first cycle found.
    pub fn ensure_strong_acyclic(&self) -> Result<(), GraphError> {
        let mut strong: DiGraphMap<NodeId, ()> = DiGraphMap::new();
        for id in self.nodes.keys() {
            strong.add_node(*id);
        }
        for (from, to, kind) in self.edges() {
            if kind == EdgeKind::Strong {
                strong.add_edge(from, to, ());
            }
        }
        for component in tarjan_scc(&strong) {
            if component.len() > 1 {
                let path = component
                    .iter()
                    .map(|id| self.display_name(*id))
                    .collect();
                return Err(GraphError::CyclicDependency { path });
            }
        }
        Ok(())
    }

    fn display_name(&self, id: NodeId) -> String {
        self.nodes
            .get(&id)
            .map_or_else(|| id.short(), ResourceNode::display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(physical_id: &str, ordinal: usize) -> ResourceNode {
        ResourceNode::from_independent(physical_id, "AWS::EC2::VPC", ordinal)
    }

    #[test]
    fn duplicate_nodes_are_rejected() {
        let mut graph = ResourceGraph::new();
        graph.add_node(node("vpc-1", 0)).unwrap();
        let result = graph.add_node(node("vpc-1", 1));
        assert!(matches!(result, Err(GraphError::DuplicateNode { .. })));
    }

    #[test]
    fn strong_edges_win_over_weak() {
        let mut graph = ResourceGraph::new();
        let a = graph.add_node(node("vpc-1", 0)).unwrap();
        let b = graph.add_node(node("subnet-1", 1)).unwrap();

        graph.add_edge(a, b, EdgeKind::Weak).unwrap();
        assert_eq!(graph.edge_kind(a, b), Some(EdgeKind::Weak));

        graph.add_edge(a, b, EdgeKind::Strong).unwrap();
        assert_eq!(graph.edge_kind(a, b), Some(EdgeKind::Strong));

        // A later weak sighting must not downgrade.
        graph.add_edge(a, b, EdgeKind::Weak).unwrap();
        assert_eq!(graph.edge_kind(a, b), Some(EdgeKind::Strong));
    }

    #[test]
    fn self_loops_are_dropped() {
        let mut graph = ResourceGraph::new();
        let a = graph.add_node(node("vpc-1", 0)).unwrap();
        graph.add_edge(a, a, EdgeKind::Strong).unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn strong_cycle_is_reported_with_names() {
        let mut graph = ResourceGraph::new();
        let a = graph.add_node(node("vpc-1", 0)).unwrap();
        let b = graph.add_node(node("subnet-1", 1)).unwrap();
        graph.add_edge(a, b, EdgeKind::Strong).unwrap();
        graph.add_edge(b, a, EdgeKind::Strong).unwrap();

        let err = graph.ensure_strong_acyclic().unwrap_err();
        match err {
            GraphError::CyclicDependency { path } => {
                assert_eq!(path.len(), 2);
                assert!(path.contains(&"vpc-1".to_string()));
                assert!(path.contains(&"subnet-1".to_string()));
            }
            other => panic!("wrong error: {other:?}"),
        }
    }

    #[test]
    fn weak_cycles_do_not_fail_validation() {
        let mut graph = ResourceGraph::new();
        let a = graph.add_node(node("vpc-1", 0)).unwrap();
        let b = graph.add_node(node("subnet-1", 1)).unwrap();
        graph.add_edge(a, b, EdgeKind::Strong).unwrap();
        graph.add_edge(b, a, EdgeKind::Weak).unwrap();
        assert!(graph.ensure_strong_acyclic().is_ok());
    }

    #[test]
    fn edges_to_missing_nodes_are_rejected() {
        let mut graph = ResourceGraph::new();
        let a = graph.add_node(node("vpc-1", 0)).unwrap();
        let ghost = NodeId::for_independent("ghost");
        assert!(matches!(
            graph.add_edge(a, ghost, EdgeKind::Strong),
            Err(GraphError::NodeNotFound)
        ));
    }
}
