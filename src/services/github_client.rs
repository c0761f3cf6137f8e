//! GitHub API client.
//!
//! Read-only client for the GitHub REST API: repository metadata, directory
//! listings, file contents, and raw READMEs. Also hosts the repository URL
//! parser, since its output feeds directly into these endpoints.

use crate::error::AppError;
use crate::models::{FileNode, NodeKind, Repository};
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client};
use serde::Deserialize;

/// Sentinel returned when a repository has no README.
///
/// Absence of a README is a normal condition, not a fetch failure; the
/// sentinel flows into the analysis prompt like any other README text.
pub const NO_README_FALLBACK: &str = "No README found.";

/// GitHub API client configuration.
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Base URL of the GitHub API (e.g. `https://api.github.com`).
    pub base_url: String,

    /// User-Agent header value. GitHub rejects requests without one.
    pub user_agent: String,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: concat!("gitmind/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubClientConfig,
}

/// Owner/repository pair extracted from a user-supplied URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRepo {
    pub owner: String,
    pub repo: String,
}

/// Extract an owner/repository pair from an arbitrary URL string.
///
/// Strips exactly one trailing slash, splits on `/`, and takes the last two
/// non-empty segments. No scheme or host validation: any string with at
/// least two non-empty trailing segments is accepted. Malformed input is a
/// normal outcome (`None`), never an error.
pub fn parse_repo_url(url: &str) -> Option<ParsedRepo> {
    let clean = url.strip_suffix('/').unwrap_or(url);
    let mut parts = clean.rsplit('/');

    let repo = parts.next()?;
    let owner = parts.next()?;

    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(ParsedRepo {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}

/// One entry of a `GET /repos/{owner}/{repo}/contents/{path}` response.
#[derive(Debug, Clone, Deserialize)]
struct ContentsEntry {
    name: String,
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
}

/// The contents endpoint returns an array for a directory and a single
/// object for a file. Normalized into a `Vec` at the client boundary so
/// downstream code never branches on response shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Many(Vec<ContentsEntry>),
    One(ContentsEntry),
}

impl ContentsResponse {
    fn into_entries(self) -> Vec<ContentsEntry> {
        match self {
            Self::Many(entries) => entries,
            Self::One(entry) => vec![entry],
        }
    }
}

/// File payload of the contents endpoint when the path names a file.
#[derive(Debug, Deserialize)]
struct FileContentPayload {
    content: Option<String>,
    encoding: Option<String>,
}

/// Normalize a remote entry type into a node kind.
///
/// Exactly `"dir"` maps to a directory; every other value (including
/// symlinks and submodules) is treated as a file.
fn normalize_kind(entry_type: &str) -> NodeKind {
    if entry_type == "dir" {
        NodeKind::Directory
    } else {
        NodeKind::File
    }
}

/// Decode a file payload into plain text.
///
/// GitHub marks base64-encoded content with `encoding == "base64"` and
/// wraps the data in newlines; those are stripped before decoding. Without
/// an encoding marker the payload field is returned verbatim (empty when
/// absent).
fn decode_file_content(payload: &FileContentPayload) -> Result<String, AppError> {
    if payload.encoding.as_deref() == Some("base64") {
        let raw = payload.content.as_deref().unwrap_or_default().replace('\n', "");
        let bytes = STANDARD
            .decode(raw)
            .map_err(|e| AppError::internal(format!("Failed to decode file content: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| AppError::internal("File content is not valid UTF-8"))
    } else {
        Ok(payload.content.clone().unwrap_or_default())
    }
}

/// Percent-encode each segment of a repository path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

impl GitHubClient {
    /// Create a new GitHub client.
    pub fn new(config: GitHubClientConfig) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();

        let ua = header::HeaderValue::from_str(&config.user_agent)
            .map_err(|_| AppError::configuration("Invalid User-Agent value"))?;
        headers.insert(header::USER_AGENT, ua);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the full URL for an API path.
    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fetch repository metadata.
    ///
    /// A non-success status covers both "repository does not exist" and
    /// "rate limit exceeded"; the two are deliberately not distinguished.
    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, AppError> {
        let endpoint = format!("/repos/{}/{}", owner, repo);
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::not_found(
                "Repository not found or API rate limit reached",
            ));
        }

        response
            .json::<Repository>()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))
    }

    /// Fetch a one-level directory listing.
    ///
    /// Pass an empty `path` for the repository root. Entries are returned
    /// in the order the API produced them.
    pub async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<FileNode>, AppError> {
        let endpoint = format!("/repos/{}/{}/contents/{}", owner, repo, encode_path(path));
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::github_api_full(
                "Failed to fetch file tree",
                status.as_u16(),
                endpoint,
            ));
        }

        let entries = response
            .json::<ContentsResponse>()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))?
            .into_entries();

        Ok(entries
            .into_iter()
            .map(|entry| FileNode {
                name: entry.name,
                path: entry.path,
                kind: normalize_kind(&entry.entry_type),
                content: None,
                children: None,
            })
            .collect())
    }

    /// Fetch a file's content as plain text.
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, AppError> {
        let endpoint = format!("/repos/{}/{}/contents/{}", owner, repo, encode_path(path));
        let url = self.api_url(&endpoint);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::github_api_full(
                "Failed to fetch file content",
                status.as_u16(),
                endpoint,
            ));
        }

        let payload = response
            .json::<FileContentPayload>()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse response: {}", e)))?;

        decode_file_content(&payload)
    }

    /// Fetch the repository README as raw text.
    ///
    /// Any non-success status yields [`NO_README_FALLBACK`] rather than an
    /// error; only a transport failure (no response at all) propagates.
    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<String, AppError> {
        let endpoint = format!("/repos/{}/{}/readme", owner, repo);
        let url = self.api_url(&endpoint);
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/vnd.github.v3.raw")
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(NO_README_FALLBACK.to_string());
        }

        response
            .text()
            .await
            .map_err(|e| AppError::internal(format!("Failed to read README: {}", e)))
    }
}
