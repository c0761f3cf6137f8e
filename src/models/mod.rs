//! Data models for the application.
//!
//! These models represent the core entities exchanged with the GitHub and
//! Gemini APIs and returned to the frontend in session snapshots.
//!
//! Field names follow the upstream wire formats so responses can be
//! deserialized and re-serialized without translation layers.

pub mod analysis;
pub mod file_node;
pub mod repository;

// Re-exports for convenient access
pub use analysis::AnalysisResult;
pub use file_node::{FileNode, NodeKind};
pub use repository::{RepoOwner, Repository};
