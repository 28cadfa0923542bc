use doctree::document::{Document, DocumentUrl};
use doctree::path_tree::{NodeId, PathTree};

/// Locations documents are opened at. Chosen so that groups nest, merge and
/// share name prefixes (`/src/a` vs `/src/ab`) or last segments
/// (`/src/a` vs `/lib/src/a`).
pub const LOCATIONS: &[&str] = &[
    "/src/a/x.rs",
    "/src/a/y.rs",
    "/src/ab/x.rs",
    "/src/a/b/c/z.rs",
    "/src/a/b/w.rs",
    "/src/main.rs",
    "/lib/mod.rs",
    "/top.txt",
    "sftp://build/src/a/x.rs",
    "sftp://build/home/log.txt",
    "/lib/src/a/x.rs",
    "rel/a/x.rs",
    "rel/a/y.rs",
    "Untitled",
    "Untitled 2",
];

/// Document `id` opened at `LOCATIONS[slot]`
pub fn document(id: u64, slot: usize) -> Document {
    let location = LOCATIONS[slot % LOCATIONS.len()];
    if location.contains("://") {
        Document::at(id, DocumentUrl::parse(location))
    } else if location.contains('/') {
        Document::at(id, DocumentUrl::local(location))
    } else {
        Document::untitled(id, location)
    }
}

/// Order-independent rendering of the tree structure
///
/// Every node is rendered as its path (directories with a trailing `/`,
/// leaves with their document) followed by its sorted children.
pub fn canonical(tree: &PathTree) -> String {
    let mut parts: Vec<String> = tree
        .children(tree.root_id())
        .iter()
        .map(|&child| canonical_node(tree, child))
        .collect();
    parts.sort();
    parts.join("\n")
}

fn canonical_node(tree: &PathTree, id: NodeId) -> String {
    let Some(node) = tree.node(id) else {
        return String::new();
    };

    let label = match node.document {
        Some(document) => format!("{}={}", node.path, document),
        None => format!("{}/", node.path),
    };

    let mut children: Vec<String> = node
        .children
        .iter()
        .map(|&child| canonical_node(tree, child))
        .collect();
    if children.is_empty() {
        return label;
    }
    children.sort();
    format!("{label}({})", children.join(","))
}
