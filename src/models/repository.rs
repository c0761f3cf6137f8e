//! GitHub repository metadata model.

use serde::{Deserialize, Serialize};

/// Repository owner as returned by the GitHub API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOwner {
    /// Owner login name (e.g. "facebook").
    pub login: String,

    /// URL of the owner's avatar image.
    pub avatar_url: String,
}

/// Metadata for one imported repository.
///
/// Deserialized straight from `GET /repos/{owner}/{repo}`; field names are
/// GitHub's own so the frontend sees the same shape the API produced.
/// Replaced wholesale on a new import, never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Short repository name (e.g. "react").
    pub name: String,

    /// Fully qualified name (e.g. "facebook/react").
    pub full_name: String,

    /// Repository owner.
    pub owner: RepoOwner,

    /// Optional description text.
    pub description: Option<String>,

    /// Star count.
    pub stargazers_count: i64,

    /// Fork count.
    pub forks_count: i64,

    /// Primary language, if GitHub detected one.
    pub language: Option<String>,

    /// Default branch name (e.g. "main").
    pub default_branch: String,

    /// Web URL of the repository.
    pub html_url: String,
}
