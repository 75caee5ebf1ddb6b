//! Plan derivation: ordering, batching, and skip analysis.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use cfm_graph::{EdgeKind, ResourceGraph};
use cfm_model::{Finding, NodeId, ResourceNode};
use indexmap::IndexMap;
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::status::ImportStatus;

/// Where a node's resource definition landed after partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTarget {
    /// Module name.
    pub module: String,
    /// Resource address inside the module, `<type>.<name>`.
    pub address: String,
}

/// One planned binding of a running resource to its configuration address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEntry {
    /// Node the entry binds.
    pub node: NodeId,
    /// Owning module.
    pub module: String,
    /// Fully qualified configuration address,
    /// `module.<module>.<type>.<name>`.
    pub address: String,
    /// Identifying value of the running resource.
    pub identity: String,
    /// Position in the dependency order.
    pub rank: usize,
    /// Batch index. Entries sharing a batch have no dependency between
    /// them, so an executor may run a whole batch concurrently.
    pub batch: usize,
    /// Retries consumed so far.
    pub retries: u32,
    /// Execution status, written only by the tracker.
    pub status: ImportStatus,
}

/// The derived plan: entries in dependency order plus skip findings for
/// every resource left out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportPlan {
    entries: Vec<ImportEntry>,
    skipped: Vec<Finding>,
    batch_count: usize,
}

impl ImportPlan {
    /// Entries in rank order.
    #[must_use]
    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    /// Entry by fully qualified address.
    #[must_use]
    pub fn entry(&self, address: &str) -> Option<&ImportEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    pub(crate) fn entry_mut(&mut self, address: &str) -> Option<&mut ImportEntry> {
        self.entries.iter_mut().find(|e| e.address == address)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [ImportEntry] {
        &mut self.entries
    }

    /// Skip findings, one per resource left out of the plan.
    #[must_use]
    pub fn skipped(&self) -> &[Finding] {
        &self.skipped
    }

    /// Number of dependency-safe batches.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Entries of one batch, in rank order.
    pub fn batch(&self, index: usize) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter().filter(move |e| e.batch == index)
    }

    /// Number of planned entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives the import plan for a converted graph.
///
/// Only nodes with a mapped resource definition and a concrete identifying
/// value become entries; everything else is recorded as skipped with a
/// reason. Entry order is a topological order of the graph with ties
/// broken by (module name, ingestion order), so repeated runs over the
/// same input produce the same plan.
///
/// The graph must already have passed strong-cycle validation; nodes on
/// a strong cycle would not be ordered and would fall out of the plan.
#[must_use]
pub fn plan_imports(
    graph: &ResourceGraph,
    targets: &IndexMap<NodeId, ImportTarget>,
) -> ImportPlan {
    let ordering = ordering_graph(graph);
    let order = deterministic_order(graph, &ordering, targets);
    let depths = node_depths(&ordering, &order);

    let mut staged = Vec::new();
    let mut skipped = Vec::new();
    for id in &order {
        let Some(node) = graph.node(*id) else { continue };
        if node.unsupported {
            skipped.push(Finding::SkippedImport {
                reason: format!(
                    "`{}` has unsupported source type `{}`",
                    node.display_name(),
                    node.source_type
                ),
            });
            continue;
        }
        let Some(target) = targets.get(id) else {
            skipped.push(Finding::SkippedImport {
                reason: format!(
                    "`{}` has no resource definition in any module",
                    node.display_name()
                ),
            });
            continue;
        };
        let Some(identity) = node.import_identity.clone() else {
            skipped.push(Finding::SkippedImport {
                reason: format!(
                    "`{}` has no derivable identifying value",
                    node.display_name()
                ),
            });
            continue;
        };
        let depth = depths.get(id).copied().unwrap_or(0);
        staged.push((
            depth,
            ImportEntry {
                node: *id,
                module: target.module.clone(),
                address: format!("module.{}.{}", target.module, target.address),
                identity,
                rank: 0,
                batch: 0,
                retries: 0,
                status: ImportStatus::Pending,
            },
        ));
    }

    // Depth levels holding no entries disappear, so batch indices are
    // consecutive.
    let mut levels: Vec<usize> = staged.iter().map(|(depth, _)| *depth).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut entries = Vec::with_capacity(staged.len());
    for (rank, (depth, mut entry)) in staged.into_iter().enumerate() {
        entry.rank = rank;
        entry.batch = levels.binary_search(&depth).unwrap_or(0);
        entries.push(entry);
    }

    tracing::info!(
        entries = entries.len(),
        batches = levels.len(),
        skipped = skipped.len(),
        "import plan derived"
    );

    ImportPlan {
        entries,
        skipped,
        batch_count: levels.len(),
    }
}

/// The ordering relation. Strong edges always order imports; weak edges
/// join one at a time and any that would close a cycle is dropped and
/// logged.
fn ordering_graph(graph: &ResourceGraph) -> DiGraphMap<NodeId, ()> {
    let mut ordering: DiGraphMap<NodeId, ()> = DiGraphMap::new();
    for id in graph.node_ids() {
        ordering.add_node(id);
    }
    for (from, to, kind) in graph.edges() {
        if kind == EdgeKind::Strong {
            ordering.add_edge(from, to, ());
        }
    }
    for (from, to, kind) in graph.edges() {
        if kind != EdgeKind::Weak {
            continue;
        }
        ordering.add_edge(from, to, ());
        if is_cyclic_directed(&ordering) {
            ordering.remove_edge(from, to);
            tracing::debug!(
                "dropping weak edge {} -> {} to keep the import order acyclic",
                self::display(graph, from),
                self::display(graph, to)
            );
        }
    }
    ordering
}

/// Kahn's algorithm with a deterministic tie-break: among ready nodes,
/// (module name, ingestion order) decides.
fn deterministic_order(
    graph: &ResourceGraph,
    ordering: &DiGraphMap<NodeId, ()>,
    targets: &IndexMap<NodeId, ImportTarget>,
) -> Vec<NodeId> {
    let key = |id: NodeId| -> (String, usize, NodeId) {
        let module = targets
            .get(&id)
            .map_or_else(String::new, |t| t.module.clone());
        let ordinal = graph.node(id).map_or(usize::MAX, |n| n.ordinal);
        (module, ordinal, id)
    };

    let mut indegree: IndexMap<NodeId, usize> = IndexMap::new();
    let mut ready: BinaryHeap<Reverse<(String, usize, NodeId)>> = BinaryHeap::new();
    for id in graph.node_ids() {
        let degree = ordering.neighbors_directed(id, Direction::Incoming).count();
        indegree.insert(id, degree);
        if degree == 0 {
            ready.push(Reverse(key(id)));
        }
    }

    let mut order = Vec::with_capacity(indegree.len());
    while let Some(Reverse((_, _, id))) = ready.pop() {
        order.push(id);
        for next in ordering.neighbors_directed(id, Direction::Outgoing) {
            if let Some(degree) = indegree.get_mut(&next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(key(next)));
                }
            }
        }
    }
    order
}

/// Longest-path depth per node, walked in topological order. Equal depth
/// means no ordering path between two nodes, which is what makes a batch
/// safe.
fn node_depths(
    ordering: &DiGraphMap<NodeId, ()>,
    order: &[NodeId],
) -> IndexMap<NodeId, usize> {
    let mut depths: IndexMap<NodeId, usize> = IndexMap::new();
    for id in order {
        let depth = ordering
            .neighbors_directed(*id, Direction::Incoming)
            .filter_map(|dep| depths.get(&dep).copied())
            .max()
            .map_or(0, |d| d + 1);
        depths.insert(*id, depth);
    }
    depths
}

fn display(graph: &ResourceGraph, id: NodeId) -> String {
    graph
        .node(id)
        .map_or_else(|| id.short(), ResourceNode::display_name)
}
