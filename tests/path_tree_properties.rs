mod common;

use common::fixtures::{canonical, document, LOCATIONS};
use common::tracing::init_tracing_from_env;
use doctree::config::{DisplayMode, TreeConfig};
use doctree::document::{DocumentId, DocumentSet};
use doctree::path_tree::{HierarchicalModel, PathTree};
use proptest::prelude::*;

/// Documents a test can juggle at once
const MAX_DOCUMENTS: u64 = 6;

#[derive(Debug, Clone)]
enum Step {
    Open { id: u64, slot: usize },
    Close { id: u64 },
    Rename { id: u64, slot: usize },
}

fn step() -> impl Strategy<Value = Step> {
    let id = 1..=MAX_DOCUMENTS;
    let slot = 0..LOCATIONS.len();
    prop_oneof![
        (id.clone(), slot.clone()).prop_map(|(id, slot)| Step::Open { id, slot }),
        id.clone().prop_map(|id| Step::Close { id }),
        (id, slot).prop_map(|(id, slot)| Step::Rename { id, slot }),
    ]
}

/// Apply a step to both the tree and the registry that mirrors it
fn apply(tree: &mut PathTree, registry: &mut DocumentSet, step: &Step) {
    match *step {
        Step::Open { id, slot } => {
            if registry.get(DocumentId(id)).is_none() {
                let doc = document(id, slot);
                tree.open(&doc);
                registry.insert(doc);
            }
        }
        Step::Close { id } => {
            tree.close(DocumentId(id));
            registry.remove(DocumentId(id));
        }
        Step::Rename { id, slot } => {
            if registry.get(DocumentId(id)).is_some() {
                let doc = document(id, slot);
                tree.rename(&doc);
                registry.insert(doc);
            }
        }
    }
}

fn replay(mode: DisplayMode, steps: &[Step]) -> (PathTree, DocumentSet) {
    let config = TreeConfig {
        mode,
        ..TreeConfig::default()
    };
    let mut tree = PathTree::new(&config);
    let mut registry = DocumentSet::new();
    for step in steps {
        apply(&mut tree, &mut registry, step);
    }
    (tree, registry)
}

fn sorted_documents(tree: &PathTree) -> Vec<DocumentId> {
    let mut documents = tree.all_documents_under(tree.root_id());
    documents.sort();
    documents
}

fn registry_documents(registry: &DocumentSet) -> Vec<DocumentId> {
    let mut documents: Vec<DocumentId> = registry.iter().map(|doc| doc.id).collect();
    documents.sort();
    documents
}

proptest! {
    /// Every step keeps the tree consistent and in sync with the registry
    #[test]
    fn tree_tracks_registry(
        grouped in any::<bool>(),
        steps in prop::collection::vec(step(), 0..40)
    ) {
        init_tracing_from_env();
        let mode = if grouped { DisplayMode::Grouped } else { DisplayMode::Flat };
        let mut tree = PathTree::new(&TreeConfig { mode, ..TreeConfig::default() });
        let mut registry = DocumentSet::new();

        for step in &steps {
            apply(&mut tree, &mut registry, step);

            prop_assert_eq!(tree.check_invariants(), Ok(()), "after {:?}", step);
            prop_assert_eq!(sorted_documents(&tree), registry_documents(&registry));
            prop_assert_eq!(tree.document_count(), registry.len());
        }
    }

    /// Opening a document and closing it again leaves the structure as it was
    #[test]
    fn open_then_close_restores_structure(
        steps in prop::collection::vec(step(), 0..30),
        slot in 0..LOCATIONS.len()
    ) {
        let (mut tree, _) = replay(DisplayMode::Grouped, &steps);
        let before = canonical(&tree);

        let extra = document(MAX_DOCUMENTS + 1, slot);
        tree.open(&extra);
        prop_assert_eq!(tree.check_invariants(), Ok(()));
        tree.close(extra.id);

        prop_assert_eq!(tree.check_invariants(), Ok(()));
        prop_assert_eq!(canonical(&tree), before);
    }

    /// The grouped structure depends only on the open documents, so a trip
    /// through flat mode reproduces it
    #[test]
    fn flat_round_trip_reproduces_grouping(steps in prop::collection::vec(step(), 0..30)) {
        let (mut tree, registry) = replay(DisplayMode::Grouped, &steps);
        let grouped = canonical(&tree);

        tree.set_mode(DisplayMode::Flat, &registry);
        prop_assert_eq!(tree.row_count(None), registry.len());
        prop_assert!(tree.children(tree.root_id()).iter().all(|&id| !tree.is_directory(id)));

        tree.set_mode(DisplayMode::Grouped, &registry);
        prop_assert_eq!(tree.check_invariants(), Ok(()));
        prop_assert_eq!(canonical(&tree), grouped);
    }

    /// After any close no directory is left without children
    #[test]
    fn close_leaves_no_empty_directories(
        steps in prop::collection::vec(step(), 0..30),
        id in 1..=MAX_DOCUMENTS
    ) {
        let (mut tree, _) = replay(DisplayMode::Grouped, &steps);
        tree.close(DocumentId(id));

        let mut pending = tree.children(tree.root_id()).to_vec();
        while let Some(node) = pending.pop() {
            if tree.is_directory(node) {
                prop_assert!(!tree.children(node).is_empty());
            }
            pending.extend_from_slice(tree.children(node));
        }
    }
}

#[test]
fn resync_matches_incremental_structure() {
    init_tracing_from_env();
    let steps = [
        Step::Open { id: 1, slot: 0 },
        Step::Open { id: 2, slot: 3 },
        Step::Open { id: 3, slot: 2 },
        Step::Rename { id: 1, slot: 6 },
        Step::Open { id: 4, slot: 8 },
        Step::Close { id: 3 },
        Step::Open { id: 5, slot: 10 },
    ];
    let (mut tree, registry) = replay(DisplayMode::Grouped, &steps);
    let incremental = canonical(&tree);

    tree.resync(&registry);

    assert_eq!(tree.check_invariants(), Ok(()));
    assert_eq!(canonical(&tree), incremental);
}

#[test]
fn model_walk_visits_every_document() {
    let steps: Vec<Step> = (0..LOCATIONS.len())
        .map(|slot| Step::Open { id: slot as u64 + 1, slot })
        .collect();
    let (tree, registry) = replay(DisplayMode::Grouped, &steps);

    let mut seen = Vec::new();
    let mut pending = vec![None];
    while let Some(parent) = pending.pop() {
        for row in 0..tree.row_count(parent) {
            let node = tree.index(row, parent).unwrap();
            assert_eq!(tree.parent(node), parent);
            match tree.node(node).and_then(|n| n.document) {
                Some(document) => seen.push(document),
                None => pending.push(Some(node)),
            }
        }
    }

    seen.sort();
    assert_eq!(seen, registry_documents(&registry));
}
