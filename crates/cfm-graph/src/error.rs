//! Graph construction errors.

/// Errors raised while building or validating the resource graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Cyclic dependency detected among strong edges. Fatal: a conversion
    /// with a hard dependency cycle has no valid ordering.
    #[error("cyclic dependency: {path:?}")]
    CyclicDependency {
        /// Display names of the nodes on the cycle.
        path: Vec<String>,
    },

    /// The same node was inserted twice.
    #[error("node `{name}` is already in the graph")]
    DuplicateNode {
        /// Display name of the offending node.
        name: String,
    },

    /// An edge referenced a node that is not in the graph.
    #[error("node not found in graph")]
    NodeNotFound,
}
