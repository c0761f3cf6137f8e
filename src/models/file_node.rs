//! File tree node model.

use serde::{Deserialize, Serialize};

/// Kind of a file tree entry.
///
/// The wire representation matches the frontend's expectations
/// (`"file"` / `"dir"`). Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// One entry in a repository directory listing.
///
/// `path` is slash-delimited, relative to the repository root, and unique
/// within one repository snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// Entry name (last path segment).
    pub name: String,

    /// Full path relative to the repository root.
    pub path: String,

    /// Whether this entry is a file or a directory.
    #[serde(rename = "type")]
    pub kind: NodeKind,

    /// Eagerly loaded content, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Child nodes, populated only if a directory's listing was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileNode>>,
}

impl FileNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
