use super::node::NodeId;

/// Change notification queued by [`PathTree`](super::PathTree) for the view
/// that presents it.
///
/// `parent: None` means the synthetic root. Events describe the tree after
/// the change was applied; a `Reset` supersedes everything queued before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEvent {
    /// A node was attached to `parent` at `row`
    RowsInserted { parent: Option<NodeId>, row: usize },
    /// The node at `row` under `parent` was detached
    RowsRemoved { parent: Option<NodeId>, row: usize },
    /// Attributes of a node changed (flags, name, shading)
    DataChanged(NodeId),
    /// The whole tree was rebuilt
    Reset,
}
