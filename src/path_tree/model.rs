//! Read-only hierarchical data source over a [`PathTree`]
//!
//! This is the contract a list/tree widget needs: row counts, navigation
//! between parents and children, and per-node attributes. A `None` parent
//! stands for the synthetic root, which a view never shows.

use super::node::NodeId;
use super::tree::PathTree;
use crate::config::{DisplayMode, Rgb};
use crate::document::DocumentId;

/// Attribute a view can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRole {
    /// Visible label
    Display,
    /// Hover text
    ToolTip,
    /// Sort key: the document URL when there is one, the node path otherwise
    Path,
    /// Document behind a leaf
    Document,
    /// Row among siblings, which is the order documents were filed in
    OpeningOrder,
    /// Every document in the subtree
    DocumentTree,
    /// Recency shade
    Background,
    /// Leaf whose document is missing or failed to load
    Inactive,
}

/// Value of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemData {
    None,
    Text(String),
    Document(DocumentId),
    Documents(Vec<DocumentId>),
    Row(usize),
    Color(Rgb),
    Flag(bool),
}

bitflags::bitflags! {
    /// Interaction flags of an item
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ItemFlags: u8 {
        const ENABLED = 1 << 0;
        const SELECTABLE = 1 << 1;
    }
}

/// Hierarchical data source independent of any UI toolkit
pub trait HierarchicalModel {
    fn row_count(&self, parent: Option<NodeId>) -> usize;

    fn column_count(&self) -> usize {
        1
    }

    /// Child at `row` of `parent`
    fn index(&self, row: usize, parent: Option<NodeId>) -> Option<NodeId>;

    /// Parent of `node`, `None` for top-level nodes
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn has_children(&self, parent: Option<NodeId>) -> bool {
        self.row_count(parent) > 0
    }

    fn item_flags(&self, node: NodeId) -> ItemFlags;

    fn data(&self, node: NodeId, role: ItemRole) -> ItemData;
}

impl PathTree {
    fn resolve(&self, parent: Option<NodeId>) -> NodeId {
        parent.unwrap_or_else(|| self.root_id())
    }
}

impl HierarchicalModel for PathTree {
    fn row_count(&self, parent: Option<NodeId>) -> usize {
        self.children(self.resolve(parent)).len()
    }

    fn index(&self, row: usize, parent: Option<NodeId>) -> Option<NodeId> {
        self.children(self.resolve(parent)).get(row).copied()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node)?.parent?;
        (parent != self.root_id()).then_some(parent)
    }

    fn item_flags(&self, node: NodeId) -> ItemFlags {
        match self.node(node) {
            Some(n) if n.has_children() => ItemFlags::ENABLED,
            Some(_) => ItemFlags::ENABLED | ItemFlags::SELECTABLE,
            None => ItemFlags::empty(),
        }
    }

    fn data(&self, id: NodeId, role: ItemRole) -> ItemData {
        let Some(node) = self.node(id) else {
            return ItemData::None;
        };

        match role {
            ItemRole::Display => match self.mode() {
                DisplayMode::Flat => ItemData::Text(node.document_name.clone()),
                DisplayMode::Grouped => ItemData::Text(self.display(id)),
            },
            ItemRole::ToolTip => {
                if node.is_changed_externally() {
                    ItemData::Text(format!(
                        "{}\nThe document has been modified by another application.",
                        node.path
                    ))
                } else {
                    ItemData::Text(node.path.clone())
                }
            }
            ItemRole::Path => match &node.url {
                Some(url) => ItemData::Text(url.to_string()),
                None => ItemData::Text(node.path.clone()),
            },
            ItemRole::Document => node.document.map_or(ItemData::None, ItemData::Document),
            ItemRole::OpeningOrder => ItemData::Row(node.row),
            ItemRole::DocumentTree => ItemData::Documents(self.all_documents_under(id)),
            ItemRole::Background => self.shade(id).map_or(ItemData::None, ItemData::Color),
            ItemRole::Inactive => {
                ItemData::Flag(node.is_leaf() && (node.document.is_none() || node.opening_error))
            }
        }
    }
}
