// Document tree library - exposes all core modules for testing

pub mod config;
pub mod document;
pub mod path_tree;
pub mod services;

pub use config::{ConfigError, DisplayMode, TreeConfig};
pub use document::{Document, DocumentId, DocumentRegistry, DocumentSet, DocumentUrl, OnDiskReason};
pub use path_tree::PathTree;
