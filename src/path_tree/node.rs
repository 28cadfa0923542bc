use crate::document::{DocumentId, DocumentUrl};
use std::fmt;

/// Unique identifier for a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

bitflags::bitflags! {
    /// Status flags carried by a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct NodeFlags: u8 {
        /// Buffer has unsaved changes
        const MODIFIED = 1 << 0;
        /// File changed on disk behind the editor's back
        const MODIFIED_EXTERNALLY = 1 << 1;
        /// File was deleted on disk
        const DELETED_EXTERNALLY = 1 << 2;
        /// Document has no location; the path is its display name
        const EMPTY = 1 << 3;
        /// Document (or group) lives on a remote host
        const HOST = 1 << 4;
    }
}

/// Whether a node stands for a document or groups other nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    Leaf,
}

/// A node in the path tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    pub kind: NodeKind,
    /// Slash separated path, `[host]/path` for remote documents
    pub path: String,
    /// Remote host, empty for local nodes
    pub host: String,
    /// Document name as the host shows it, host-prefixed for remote documents
    pub document_name: String,
    pub flags: NodeFlags,
    /// Document this leaf stands for (None for directories)
    pub document: Option<DocumentId>,
    /// Location of the document, None for directories and untitled documents
    pub url: Option<DocumentUrl>,
    pub opening_error: bool,
    /// Parent node ID (None for the root and detached nodes)
    pub parent: Option<NodeId>,
    /// Child node IDs, in row order
    pub children: Vec<NodeId>,
    /// Index among the parent's children
    pub row: usize,
}

impl Node {
    /// Create a detached directory node
    pub fn directory(id: NodeId, path: String) -> Self {
        Self {
            id,
            kind: NodeKind::Directory,
            path,
            host: String::new(),
            document_name: String::new(),
            flags: NodeFlags::empty(),
            document: None,
            url: None,
            opening_error: false,
            parent: None,
            children: Vec::new(),
            row: 0,
        }
    }

    /// Create a detached leaf for a document
    pub fn leaf(id: NodeId, path: String, document: DocumentId) -> Self {
        Self {
            kind: NodeKind::Leaf,
            document: Some(document),
            ..Self::directory(id, path)
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Last segment of the path
    pub fn name(&self) -> &str {
        last_segment(&self.path)
    }

    /// Set the host and refresh the host flag and document name to match
    pub fn set_host(&mut self, host: &str, base_name: &str) {
        if host.is_empty() {
            self.flags.remove(NodeFlags::HOST);
            self.document_name = base_name.to_string();
        } else {
            self.flags.insert(NodeFlags::HOST);
            self.document_name = format!("[{host}]{base_name}");
        }
        self.host = host.to_string();
    }

    /// Whether the buffer or the file on disk differs from what was loaded
    pub fn is_changed_externally(&self) -> bool {
        self.flags
            .intersects(NodeFlags::MODIFIED_EXTERNALLY | NodeFlags::DELETED_EXTERNALLY)
    }
}

/// Everything after the last `/`
pub(crate) fn last_segment(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Everything before the last `/`, or `/` itself for entries at the top of
/// the filesystem
pub(crate) fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// `path` with a trailing separator, so prefix checks only match whole
/// directory names (`/foo/x/` never matches `/foo/xy/...`)
pub(crate) fn dir_prefix(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

pub(crate) fn join_path(base: &str, segment: &str) -> String {
    if base.ends_with('/') {
        format!("{base}{segment}")
    } else {
        format!("{base}/{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_creation() {
        let node = Node::leaf(NodeId(3), "/test/file.txt".to_string(), DocumentId(7));

        assert_eq!(node.id, NodeId(3));
        assert_eq!(node.parent, None);
        assert!(node.is_leaf());
        assert!(!node.is_dir());
        assert_eq!(node.document, Some(DocumentId(7)));
        assert_eq!(node.name(), "file.txt");
        assert!(!node.has_children());
    }

    #[test]
    fn test_directory_node() {
        let node = Node::directory(NodeId(1), "/test/dir".to_string());

        assert!(node.is_dir());
        assert_eq!(node.document, None);
        assert_eq!(node.name(), "dir");
    }

    #[test]
    fn test_set_host() {
        let mut node = Node::leaf(NodeId(1), "[srv]/etc/hosts".to_string(), DocumentId(1));

        node.set_host("srv", "hosts");
        assert!(node.flags.contains(NodeFlags::HOST));
        assert_eq!(node.document_name, "[srv]hosts");

        node.set_host("", "hosts");
        assert!(!node.flags.contains(NodeFlags::HOST));
        assert_eq!(node.document_name, "hosts");
        assert_eq!(node.host, "");
    }

    #[test]
    fn test_changed_externally() {
        let mut node = Node::leaf(NodeId(1), "/a".to_string(), DocumentId(1));
        node.flags.insert(NodeFlags::MODIFIED);
        assert!(!node.is_changed_externally());

        node.flags.insert(NodeFlags::DELETED_EXTERNALLY);
        assert!(node.is_changed_externally());
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(last_segment("/a/b/c.txt"), "c.txt");
        assert_eq!(last_segment("Untitled"), "Untitled");
        assert_eq!(last_segment("[srv]"), "[srv]");

        assert_eq!(parent_path("/a/b/c.txt"), "/a/b");
        assert_eq!(parent_path("/c.txt"), "/");
        assert_eq!(parent_path("[srv]/c.txt"), "[srv]");

        assert_eq!(dir_prefix("/foo/x"), "/foo/x/");
        assert_eq!(dir_prefix("/"), "/");

        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "b"), "/a/b");
        assert_eq!(join_path("[srv]", "etc"), "[srv]/etc");
    }
}
