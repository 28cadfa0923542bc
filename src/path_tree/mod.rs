// Path tree of open documents
//
// Documents are grouped under directory nodes built from their shared path
// prefixes, or listed flat. The tree is updated incrementally from document
// lifecycle events and queues change notifications for the view.

pub mod events;
pub mod history;
pub mod model;
pub mod node;
pub mod tree;

pub use events::ModelEvent;
pub use history::{Recency, RecentRing, ShadePalette};
pub use model::{HierarchicalModel, ItemData, ItemFlags, ItemRole};
pub use node::{Node, NodeFlags, NodeId, NodeKind};
pub use tree::PathTree;
