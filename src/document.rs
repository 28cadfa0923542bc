//! Host-side document snapshots
//!
//! The tree never owns documents. The host hands it a [`Document`] snapshot
//! whenever something about a document changes, and exposes the full set of
//! open documents through [`DocumentRegistry`] so the tree can be rebuilt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an open document, assigned by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Doc({})", self.0)
    }
}

/// Location of a document
///
/// Local files have an empty host. Remote documents (sftp, fish, ...) carry
/// the host name, which becomes part of the tree path as `[host]/path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
}

impl DocumentUrl {
    /// A `file://` location
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            scheme: "file".to_string(),
            host: String::new(),
            path: path.into(),
        }
    }

    /// A location on a remote host
    pub fn remote(scheme: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            path: path.into(),
        }
    }

    /// Parse `scheme://host/path`, falling back to a local path when there is
    /// no scheme separator.
    pub fn parse(s: &str) -> Self {
        let Some((scheme, rest)) = s.split_once("://") else {
            return Self::local(s);
        };

        let (host, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, "/"),
        };

        Self::remote(scheme, host, path)
    }

    pub fn is_remote(&self) -> bool {
        !self.host.is_empty()
    }
}

impl fmt::Display for DocumentUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}

/// Why the on-disk copy of a document no longer matches the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDiskReason {
    Modified,
    Created,
    Deleted,
}

/// Snapshot of the host's view of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    /// `None` for documents that were never saved
    pub url: Option<DocumentUrl>,
    /// Name the host shows for the document ("foo.rs", "Untitled (2)")
    pub name: String,
    /// Unsaved changes in the buffer
    pub modified: bool,
    /// The host failed to load the document contents
    pub opening_error: bool,
}

impl Document {
    /// A saved local document named after the last path segment
    pub fn local(id: u64, path: &str) -> Self {
        Self::at(id, DocumentUrl::local(path))
    }

    pub fn at(id: u64, url: DocumentUrl) -> Self {
        let name = url
            .path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(url.path.as_str())
            .to_string();

        Self {
            id: DocumentId(id),
            url: Some(url),
            name,
            modified: false,
            opening_error: false,
        }
    }

    /// A document without a location yet
    pub fn untitled(id: u64, name: &str) -> Self {
        Self {
            id: DocumentId(id),
            url: None,
            name: name.to_string(),
            modified: false,
            opening_error: false,
        }
    }

    /// Host of the document URL, empty for local and untitled documents
    pub fn host(&self) -> &str {
        self.url.as_ref().map(|u| u.host.as_str()).unwrap_or("")
    }

    /// Key under which the document is filed in the tree
    ///
    /// Returns the key and whether the document has no location (in which
    /// case the key is its display name).
    pub fn path_key(&self) -> (String, bool) {
        match &self.url {
            None => (self.name.clone(), true),
            Some(url) if url.is_remote() => (format!("[{}]{}", url.host, url.path), false),
            Some(url) => (url.path.clone(), false),
        }
    }
}

/// The host's authoritative set of open documents
pub trait DocumentRegistry {
    /// All open documents, in opening order
    fn list(&self) -> Vec<Document>;
}

/// In-memory registry used by the command-line front end and tests
#[derive(Debug, Default, Clone)]
pub struct DocumentSet {
    documents: Vec<Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document, replacing any previous snapshot with the same id
    pub fn insert(&mut self, document: Document) {
        match self.documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    pub fn remove(&mut self, id: DocumentId) -> Option<Document> {
        let pos = self.documents.iter().position(|d| d.id == id)?;
        Some(self.documents.remove(pos))
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}

impl DocumentRegistry for DocumentSet {
    fn list(&self) -> Vec<Document> {
        self.documents.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_path() {
        let url = DocumentUrl::parse("/home/user/notes.txt");
        assert_eq!(url, DocumentUrl::local("/home/user/notes.txt"));
        assert!(!url.is_remote());
    }

    #[test]
    fn test_parse_remote_url() {
        let url = DocumentUrl::parse("sftp://build-box/srv/app/main.rs");
        assert_eq!(url.scheme, "sftp");
        assert_eq!(url.host, "build-box");
        assert_eq!(url.path, "/srv/app/main.rs");
        assert_eq!(url.to_string(), "sftp://build-box/srv/app/main.rs");
    }

    #[test]
    fn test_parse_url_without_path() {
        let url = DocumentUrl::parse("fish://server");
        assert_eq!(url.host, "server");
        assert_eq!(url.path, "/");
    }

    #[test]
    fn test_path_key() {
        assert_eq!(
            Document::local(1, "/a/b/x.txt").path_key(),
            ("/a/b/x.txt".to_string(), false)
        );
        assert_eq!(
            Document::at(2, DocumentUrl::remote("sftp", "srv", "/etc/hosts")).path_key(),
            ("[srv]/etc/hosts".to_string(), false)
        );
        assert_eq!(
            Document::untitled(3, "Untitled").path_key(),
            ("Untitled".to_string(), true)
        );
    }

    #[test]
    fn test_document_name_from_path() {
        assert_eq!(Document::local(1, "/a/b/x.txt").name, "x.txt");
        assert_eq!(Document::local(2, "/a/dir/").name, "dir");
    }

    #[test]
    fn test_document_set_replaces_by_id() {
        let mut set = DocumentSet::new();
        set.insert(Document::local(1, "/a/x.txt"));
        set.insert(Document::local(2, "/a/y.txt"));
        set.insert(Document::local(1, "/b/x.txt"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.list()[0].url, Some(DocumentUrl::local("/b/x.txt")));

        assert!(set.remove(DocumentId(2)).is_some());
        assert!(set.remove(DocumentId(2)).is_none());
        assert_eq!(set.len(), 1);
    }
}
