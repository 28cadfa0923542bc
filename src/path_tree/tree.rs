use super::events::ModelEvent;
use super::history::{Recency, ShadePalette};
use super::node::{dir_prefix, join_path, parent_path, Node, NodeFlags, NodeId};
use crate::config::{DisplayMode, Rgb, TreeConfig};
use crate::document::{Document, DocumentId, DocumentRegistry, OnDiskReason};
use std::collections::{HashMap, HashSet};

/// Tree of open documents grouped by shared path prefixes
///
/// The tree has a synthetic root. In grouped mode its children are
/// directory groups (plus untitled documents); in flat mode every document
/// is a direct child of the root. The tree is maintained incrementally from
/// document events and can always be rebuilt from a [`DocumentRegistry`].
#[derive(Debug)]
pub struct PathTree {
    /// All nodes indexed by ID
    nodes: HashMap<NodeId, Node>,
    /// Leaf node of every tracked document
    documents: HashMap<DocumentId, NodeId>,
    root_id: NodeId,
    /// Next node ID to assign
    next_id: usize,
    mode: DisplayMode,
    show_full_path_on_roots: bool,
    shading_enabled: bool,
    /// Home directory abbreviated to `~` in full-path mode
    home_dir: Option<String>,
    recency: Recency,
    /// Notifications not yet collected by the view
    events: Vec<ModelEvent>,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new(&TreeConfig::default())
    }
}

impl PathTree {
    /// Create an empty tree
    pub fn new(config: &TreeConfig) -> Self {
        let root_id = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root_id, Node::directory(root_id, String::new()));

        let home_dir = dirs::home_dir().map(|p| p.to_string_lossy().into_owned());

        Self {
            nodes,
            documents: HashMap::new(),
            root_id,
            next_id: 1,
            mode: config.mode,
            show_full_path_on_roots: config.show_full_path_on_roots,
            shading_enabled: config.shading_enabled,
            home_dir,
            recency: Recency::new(config.history_limit, config.palette()),
            events: Vec::new(),
        }
    }

    /// Create a tree populated with every document of `registry`
    pub fn from_registry(config: &TreeConfig, registry: &dyn DocumentRegistry) -> Self {
        let mut tree = Self::new(config);
        tree.rebuild(registry);
        tree
    }

    /// Get the root node ID
    pub fn root_id(&self) -> NodeId {
        self.root_id
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Number of tracked documents
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Number of nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Override the directory shown as `~` in full-path mode
    pub fn set_home_dir(&mut self, home_dir: Option<String>) {
        self.home_dir = home_dir;
    }

    /// Drain queued change notifications
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    // ----------------------------------------------------------------------
    // Document events
    // ----------------------------------------------------------------------

    /// Track a newly opened document
    pub fn open(&mut self, document: &Document) {
        if self.documents.contains_key(&document.id) {
            tracing::trace!("{} already tracked, ignoring open", document.id);
            return;
        }

        let (path, empty) = document.path_key();
        let id = self.alloc_id();
        let mut node = Node::leaf(id, path, document.id);
        if empty {
            node.flags.insert(NodeFlags::EMPTY);
        }
        if document.modified {
            node.flags.insert(NodeFlags::MODIFIED);
        }
        node.opening_error = document.opening_error;
        node.url = document.url.clone();
        node.set_host(document.host(), &document.name);

        tracing::debug!("Opening {} at {:?}", document.id, node.path);
        self.nodes.insert(id, node);
        self.documents.insert(document.id, id);
        self.handle_insert(id);
    }

    /// Open or refresh a batch of documents, announced to the view as a
    /// single reset
    pub fn open_all(&mut self, documents: &[Document]) {
        for document in documents {
            if self.documents.contains_key(&document.id) {
                self.rename(document);
            } else {
                self.open(document);
            }
        }

        self.events.clear();
        self.events.push(ModelEvent::Reset);
    }

    /// Stop tracking a closed document
    pub fn close(&mut self, document: DocumentId) {
        let Some(id) = self.documents.remove(&document) else {
            tracing::trace!("{} not tracked, ignoring close", document);
            return;
        };

        tracing::debug!("Closing {}", document);
        let had_shade = self.recency.shade(id).is_some();
        self.recency.forget(id);
        self.detach(id);
        self.nodes.remove(&id);

        if had_shade && self.shading_enabled {
            self.refresh_shading();
        }
    }

    /// Follow a change of a document's name, location or host
    pub fn rename(&mut self, document: &Document) {
        let Some(&id) = self.documents.get(&document.id) else {
            tracing::trace!("{} not tracked, ignoring rename", document.id);
            return;
        };

        let (path, empty) = document.path_key();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.flags.set(NodeFlags::EMPTY, empty);
            node.opening_error = document.opening_error;
            node.url = document.url.clone();
        }

        self.handle_name_change(id, path, document.host(), &document.name);
    }

    /// The buffer's modified state changed
    pub fn modified_changed(&mut self, document: DocumentId, modified: bool) {
        let Some(node) = self.leaf_mut(document) else {
            return;
        };

        if modified {
            node.flags.insert(NodeFlags::MODIFIED);
        } else {
            node.flags.remove(
                NodeFlags::MODIFIED | NodeFlags::MODIFIED_EXTERNALLY | NodeFlags::DELETED_EXTERNALLY,
            );
        }

        let id = node.id;
        self.events.push(ModelEvent::DataChanged(id));
    }

    /// The file backing a document changed on disk
    ///
    /// `modified == false` means the host considers the disk copy in sync
    /// again (for example after a reload or an ignored warning).
    pub fn modified_on_disk(&mut self, document: DocumentId, modified: bool, reason: OnDiskReason) {
        let Some(node) = self.leaf_mut(document) else {
            return;
        };

        let external = NodeFlags::MODIFIED_EXTERNALLY | NodeFlags::DELETED_EXTERNALLY;
        if !modified {
            node.flags.remove(external);
        } else {
            match reason {
                OnDiskReason::Deleted => node.flags.insert(NodeFlags::DELETED_EXTERNALLY),
                OnDiskReason::Modified => node.flags.insert(NodeFlags::MODIFIED_EXTERNALLY),
                OnDiskReason::Created => node.flags.remove(external),
            }
        }

        let id = node.id;
        self.events.push(ModelEvent::DataChanged(id));
    }

    /// A view switched to `document`
    pub fn document_activated(&mut self, document: DocumentId) {
        let Some(&id) = self.documents.get(&document) else {
            return;
        };
        self.recency.activated(id);
        if self.shading_enabled {
            self.refresh_shading();
        }
    }

    /// `document` received an edit
    pub fn document_edited(&mut self, document: DocumentId) {
        let Some(&id) = self.documents.get(&document) else {
            return;
        };
        self.recency.edited(id);
        if self.shading_enabled {
            self.refresh_shading();
        }
    }

    // ----------------------------------------------------------------------
    // Modes and settings
    // ----------------------------------------------------------------------

    /// Switch between grouped and flat mode, rebuilding from `registry`
    pub fn set_mode(&mut self, mode: DisplayMode, registry: &dyn DocumentRegistry) {
        if mode == self.mode {
            return;
        }

        tracing::debug!("Switching display mode to {:?}", mode);
        self.mode = mode;
        self.rebuild(registry);
    }

    /// Throw away the tree and rebuild it from `registry`
    pub fn resync(&mut self, registry: &dyn DocumentRegistry) {
        self.rebuild(registry);
    }

    pub fn show_full_path_on_roots(&self) -> bool {
        self.show_full_path_on_roots
    }

    pub fn set_show_full_path_on_roots(&mut self, show: bool) {
        if show == self.show_full_path_on_roots {
            return;
        }

        self.show_full_path_on_roots = show;
        let top_level = self.children(self.root_id).to_vec();
        self.events
            .extend(top_level.into_iter().map(ModelEvent::DataChanged));
    }

    /// Replace the shade colors and recompute every shade
    pub fn set_palette(&mut self, palette: ShadePalette) {
        if palette == self.recency.palette() {
            return;
        }

        self.recency.set_palette(palette);
        if self.shading_enabled {
            self.refresh_shading();
        }
    }

    pub fn shading_enabled(&self) -> bool {
        self.shading_enabled
    }

    pub fn set_shading_enabled(&mut self, enabled: bool) {
        if enabled == self.shading_enabled {
            return;
        }

        self.shading_enabled = enabled;
        if enabled {
            self.refresh_shading();
        } else {
            let touched = self.recency.clear_shades();
            self.events
                .extend(touched.into_iter().map(ModelEvent::DataChanged));
        }
    }

    // ----------------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------------

    /// Whether `id` is a grouping node (the root counts as one)
    pub fn is_directory(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(Node::is_dir)
    }

    /// Children of a node in row order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Leaf node of a document
    pub fn index_of(&self, document: DocumentId) -> Option<NodeId> {
        self.documents.get(&document).copied()
    }

    /// Documents in the subtree of `id`, in pre-order
    pub fn all_documents_under(&self, id: NodeId) -> Vec<DocumentId> {
        let mut documents = Vec::new();
        self.collect_documents(id, &mut documents);
        documents
    }

    fn collect_documents(&self, id: NodeId, documents: &mut Vec<DocumentId>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };

        if let Some(document) = node.document {
            documents.push(document);
        }
        for &child in &node.children {
            self.collect_documents(child, documents);
        }
    }

    /// Background shade of a node, if shading is enabled and it has one
    pub fn shade(&self, id: NodeId) -> Option<Rgb> {
        if !self.shading_enabled {
            return None;
        }
        self.recency.shade(id)
    }

    pub fn recency(&self) -> &Recency {
        &self.recency
    }

    /// Text shown for a node in grouped mode
    pub fn display(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(&id) else {
            return String::new();
        };

        let top_level = node.parent.is_none() || node.parent == Some(self.root_id);

        if node.is_dir() && node.parent == Some(self.root_id) && self.show_full_path_on_roots {
            return self.abbreviate_home(&node.path);
        }

        // The group for files at the top of the filesystem is named "/"
        let name = match node.name() {
            "" => node.path.as_str(),
            name => name,
        };
        if node.flags.contains(NodeFlags::HOST) && top_level {
            let prefix = format!("[{}]", node.host);
            if prefix != name {
                return format!("{prefix}{name}");
            }
        }

        name.to_string()
    }

    fn abbreviate_home(&self, path: &str) -> String {
        if let Some(home) = self.home_dir.as_deref().filter(|h| !h.is_empty()) {
            if path == home {
                return "~".to_string();
            }
            if let Some(rest) = path.strip_prefix(home) {
                if rest.starts_with('/') {
                    return format!("~{rest}");
                }
            }
        }
        path.to_string()
    }

    /// Indented outline of the tree, one node per line, directories marked
    /// with a trailing `/`
    pub fn outline(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root_id) {
            self.write_outline(child, 0, &mut out);
        }
        out
    }

    fn write_outline(&self, id: NodeId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };

        out.push_str(&"  ".repeat(depth));
        let label = match self.mode {
            DisplayMode::Flat => node.document_name.clone(),
            DisplayMode::Grouped => self.display(id),
        };
        out.push_str(&label);
        if node.is_dir() && !label.ends_with('/') {
            out.push('/');
        }
        out.push('\n');

        for &child in &node.children {
            self.write_outline(child, depth + 1, out);
        }
    }

    /// Verify the structural invariants of the tree
    pub fn check_invariants(&self) -> Result<(), String> {
        let root = self
            .nodes
            .get(&self.root_id)
            .ok_or_else(|| "root node missing".to_string())?;
        if root.parent.is_some() {
            return Err("root has a parent".to_string());
        }

        let mut seen = HashSet::new();
        let mut stack = vec![self.root_id];
        let mut leaves = 0;

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                return Err(format!("{id} reachable twice"));
            }
            let node = self
                .nodes
                .get(&id)
                .ok_or_else(|| format!("{id} referenced but missing"))?;

            if node.is_leaf() {
                leaves += 1;
                if node.has_children() {
                    return Err(format!("leaf {id} has children"));
                }
                let document = node
                    .document
                    .ok_or_else(|| format!("leaf {id} has no document"))?;
                if self.documents.get(&document) != Some(&id) {
                    return Err(format!("{document} not indexed to {id}"));
                }
            } else if id != self.root_id && !node.has_children() {
                return Err(format!("directory {id} ({}) is empty", node.path));
            }

            let mut dir_paths = HashSet::new();
            for (row, &child_id) in node.children.iter().enumerate() {
                let child = self
                    .nodes
                    .get(&child_id)
                    .ok_or_else(|| format!("child {child_id} of {id} missing"))?;
                if child.parent != Some(id) {
                    return Err(format!("{child_id} has parent {:?}, expected {id}", child.parent));
                }
                if child.row != row {
                    return Err(format!("{child_id} has row {}, expected {row}", child.row));
                }
                if child.is_dir() && !dir_paths.insert(child.path.as_str()) {
                    return Err(format!("duplicate directory {:?} under {id}", child.path));
                }
                stack.push(child_id);
            }
        }

        if seen.len() != self.nodes.len() {
            return Err(format!(
                "{} nodes stored but {} reachable",
                self.nodes.len(),
                seen.len()
            ));
        }
        if leaves != self.documents.len() {
            return Err(format!(
                "{leaves} leaves for {} documents",
                self.documents.len()
            ));
        }

        for &top in self.children(self.root_id) {
            let Some(node) = self.nodes.get(&top) else {
                continue;
            };
            let holds_documents = node
                .children
                .iter()
                .any(|child| self.nodes.get(child).is_some_and(Node::is_leaf));
            if node.is_dir() && !holds_documents {
                return Err(format!(
                    "top-level group {:?} holds no document directly",
                    node.path
                ));
            }
        }

        Ok(())
    }

    // ----------------------------------------------------------------------
    // Structure maintenance
    // ----------------------------------------------------------------------

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn leaf_mut(&mut self, document: DocumentId) -> Option<&mut Node> {
        let id = *self.documents.get(&document)?;
        self.nodes.get_mut(&id)
    }

    /// Parent as seen by the view: `None` for the root
    fn view_parent(&self, parent: NodeId) -> Option<NodeId> {
        (parent != self.root_id).then_some(parent)
    }

    fn new_directory(&mut self, path: String, host: &str) -> NodeId {
        let id = self.alloc_id();
        let mut node = Node::directory(id, path);
        if !host.is_empty() {
            node.host = host.to_string();
            node.flags.insert(NodeFlags::HOST);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Append `child` to `parent`
    fn add_child(&mut self, parent: NodeId, child: NodeId) {
        let row = self.children(parent).len();
        self.insert_child_at(parent, child, row);
    }

    fn insert_child_at(&mut self, parent: NodeId, child: NodeId, row: usize) {
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let row = row.min(parent_node.children.len());
        parent_node.children.insert(row, child);
        self.renumber(parent, row);

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }

        let view_parent = self.view_parent(parent);
        self.events.push(ModelEvent::RowsInserted {
            parent: view_parent,
            row,
        });
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let Some(parent_node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let Some(row) = parent_node.children.iter().position(|&c| c == child) else {
            return;
        };
        parent_node.children.remove(row);
        self.renumber(parent, row);

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = None;
        }

        let view_parent = self.view_parent(parent);
        self.events.push(ModelEvent::RowsRemoved {
            parent: view_parent,
            row,
        });
    }

    /// Fix up the rows of `parent`'s children from `from` onwards
    fn renumber(&mut self, parent: NodeId, from: usize) {
        let children = self.children(parent).get(from..).unwrap_or(&[]).to_vec();
        for (offset, child) in children.into_iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.row = from + offset;
            }
        }
    }

    /// Top-level node whose subtree contains `id`
    fn top_level_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            let parent = self.nodes.get(&current)?.parent?;
            if parent == self.root_id {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Unlink a node from its parent, pruning what the removal leaves behind
    fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) else {
            return;
        };
        let group = self.top_level_ancestor(id).filter(|&top| top != id);

        self.remove_child(parent, id);
        self.handle_empty_parents(parent);

        if let Some(group) = group {
            self.dissolve_leafless_group(group);
        }
    }

    /// Remove `dir` and its ancestors for as long as they are empty
    fn handle_empty_parents(&mut self, dir: NodeId) {
        let mut current = dir;
        while current != self.root_id {
            let Some(node) = self.nodes.get(&current) else {
                return;
            };
            if node.has_children() {
                return;
            }
            let Some(parent) = node.parent else {
                return;
            };

            tracing::trace!("Removing empty directory {:?}", node.path);
            self.remove_child(parent, current);
            self.nodes.remove(&current);
            current = parent;
        }
    }

    /// Replace a top-level group that no longer holds any document directly
    /// by its subdirectories, the way they would have been filed had the
    /// group never been created.
    fn dissolve_leafless_group(&mut self, group: NodeId) {
        let Some(node) = self.nodes.get(&group) else {
            return;
        };
        if !node.is_dir() || node.parent != Some(self.root_id) || !node.has_children() {
            return;
        }
        let holds_documents = node
            .children
            .iter()
            .any(|child| self.nodes.get(child).is_some_and(Node::is_leaf));
        if holds_documents {
            return;
        }

        tracing::trace!("Dissolving group {:?}", node.path);
        let row = node.row;
        let children = node.children.clone();

        self.remove_child(self.root_id, group);
        self.nodes.remove(&group);
        for (offset, &child) in children.iter().enumerate() {
            self.insert_child_at(self.root_id, child, row + offset);
        }
        for child in children {
            self.dissolve_leafless_group(child);
        }
    }

    /// First top-level directory whose path is a directory prefix of `path`
    fn find_group(&self, path: &str) -> Option<NodeId> {
        self.children(self.root_id).iter().copied().find(|id| {
            let Some(node) = self.nodes.get(id) else {
                return false;
            };
            if !node.is_dir() {
                return false;
            }
            if !node.flags.contains(NodeFlags::HOST) && !node.path.starts_with('/') {
                return false;
            }
            path.starts_with(&dir_prefix(&node.path))
        })
    }

    fn find_child_dir(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent).iter().copied().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|node| node.is_dir() && node.name() == name)
        })
    }

    /// File `item` below `group`, creating intermediate directories
    fn insert_item_into(&mut self, group: NodeId, item: NodeId) {
        let (Some(group_node), Some(item_node)) = (self.nodes.get(&group), self.nodes.get(&item))
        else {
            return;
        };

        let group_path = group_node.path.clone();
        let host = group_node.host.clone();
        let tail = item_node.path.get(group_path.len()..).unwrap_or("");
        let mut parts: Vec<String> = tail
            .split('/')
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        parts.pop();

        let mut current = group;
        let mut current_path = group_path;
        for part in parts {
            current_path = join_path(&current_path, &part);
            current = match self.find_child_dir(current, &part) {
                Some(dir) => dir,
                None => {
                    let dir = self.new_directory(current_path.clone(), &host);
                    self.add_child(current, dir);
                    dir
                }
            };
        }

        self.add_child(current, item);
    }

    fn handle_insert(&mut self, item: NodeId) {
        let Some(node) = self.nodes.get(&item) else {
            return;
        };

        if self.mode == DisplayMode::Flat || node.flags.contains(NodeFlags::EMPTY) {
            self.add_child(self.root_id, item);
            return;
        }

        // Only absolute and remote paths are grouped
        if !node.flags.contains(NodeFlags::HOST) && !node.path.starts_with('/') {
            self.add_child(self.root_id, item);
            return;
        }

        let path = node.path.clone();
        let host = node.host.clone();

        if let Some(group) = self.find_group(&path) {
            self.insert_item_into(group, item);
            return;
        }

        let base = parent_path(&path).to_string();
        if base.is_empty() {
            self.add_child(self.root_id, item);
            return;
        }

        let group = self.new_directory(base.clone(), &host);
        self.add_child(self.root_id, group);

        // Existing groups that belong below the new one move under it
        let prefix = dir_prefix(&base);
        let nested: Vec<NodeId> = self
            .children(self.root_id)
            .iter()
            .copied()
            .filter(|&id| id != group)
            .filter(|id| {
                self.nodes
                    .get(id)
                    .is_some_and(|n| n.is_dir() && n.path.starts_with(&prefix))
            })
            .collect();

        for other in nested {
            tracing::trace!("Merging group {other} into {base:?}");
            self.remove_child(self.root_id, other);
            self.insert_item_into(group, other);
        }

        self.add_child(group, item);
    }

    fn handle_name_change(&mut self, id: NodeId, new_path: String, new_host: &str, base_name: &str) {
        let flat = self.mode == DisplayMode::Flat;
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };

        if flat {
            node.path = new_path;
            node.set_host(new_host, base_name);
            self.events.push(ModelEvent::DataChanged(id));
            return;
        }

        if node.path == new_path {
            return;
        }

        tracing::debug!("Moving {:?} to {:?}", node.path, new_path);
        node.path = new_path;
        node.set_host(new_host, base_name);
        if node.parent.is_none() {
            return;
        }

        self.detach(id);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.flags &= NodeFlags::EMPTY | NodeFlags::HOST;
        }
        self.handle_insert(id);
    }

    fn rebuild(&mut self, registry: &dyn DocumentRegistry) {
        let root = Node::directory(self.root_id, String::new());
        self.nodes.clear();
        self.nodes.insert(self.root_id, root);
        self.documents.clear();
        self.recency.clear();

        for document in registry.list() {
            self.open(&document);
        }

        tracing::debug!("Rebuilt tree with {} documents", self.documents.len());
        self.events.clear();
        self.events.push(ModelEvent::Reset);
    }

    fn refresh_shading(&mut self) {
        let touched = self.recency.recompute();
        self.events
            .extend(touched.into_iter().map(ModelEvent::DataChanged));
    }
}
