use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use doctree::config::{DisplayMode, TreeConfig};
use doctree::document::{Document, DocumentId, DocumentSet, DocumentUrl};
use doctree::path_tree::PathTree;
use doctree::services::{log_dirs, tracing_setup};
use std::path::PathBuf;

/// Show how a set of open documents is grouped into a tree
#[derive(Parser, Debug)]
#[command(name = "doctree")]
#[command(about = "Group open documents by their shared directories", long_about = None)]
#[command(version)]
struct Args {
    /// Documents to open, as paths or `scheme://host/path` URLs
    #[arg(value_name = "DOCUMENTS")]
    documents: Vec<String>,

    /// Documents to close again after opening everything
    #[arg(long, value_name = "DOCUMENT")]
    close: Vec<String>,

    /// List documents without grouping
    #[arg(long)]
    flat: bool,

    /// Show full paths on top-level groups
    #[arg(long)]
    full_path: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to log file (default: XDG state directory)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

fn load_config(args: &Args) -> AnyhowResult<TreeConfig> {
    let mut config = match &args.config {
        Some(path) => TreeConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => TreeConfig::default(),
    };

    if args.flat {
        config.mode = DisplayMode::Flat;
    }
    if args.full_path {
        config.show_full_path_on_roots = true;
    }
    Ok(config)
}

/// Absolute paths and URLs are saved documents, anything else is untitled
fn document_from_arg(id: u64, arg: &str) -> Document {
    if arg.starts_with('/') || arg.contains("://") {
        Document::at(id, DocumentUrl::parse(arg))
    } else {
        Document::untitled(id, arg)
    }
}

/// Registry with one document per argument, ids in argument order
fn registry_from(documents: &[String]) -> DocumentSet {
    let mut registry = DocumentSet::new();
    for (i, arg) in documents.iter().enumerate() {
        registry.insert(document_from_arg(i as u64 + 1, arg));
    }
    registry
}

/// Open document named by a command-line argument
fn find_document(registry: &DocumentSet, target: &str) -> Option<DocumentId> {
    let wanted = document_from_arg(0, target).path_key();
    registry
        .iter()
        .find(|doc| doc.path_key() == wanted)
        .map(|doc| doc.id)
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    let log_file = args.log_file.clone().unwrap_or_else(log_dirs::main_log_path);
    if !tracing_setup::init_global(&log_file) {
        eprintln!("Logging disabled: could not open {}", log_file.display());
    }
    log_dirs::cleanup_stale_logs();

    let config = load_config(&args)?;

    if args.dump_config {
        let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{json}");
        return Ok(());
    }

    let mut registry = registry_from(&args.documents);
    let mut tree = PathTree::from_registry(&config, &registry);
    tracing::info!("Opened {} documents", tree.document_count());

    for target in &args.close {
        match find_document(&registry, target) {
            Some(id) => {
                registry.remove(id);
                tree.close(id);
            }
            None => tracing::warn!("{target} is not open, nothing to close"),
        }
    }

    if let Err(e) = tree.check_invariants() {
        anyhow::bail!("Tree is inconsistent: {e}");
    }

    print!("{}", tree.outline());
    Ok(())
}
