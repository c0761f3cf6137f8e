//! Session state controller.
//!
//! Owns the single browsing session: the imported repository, its file
//! tree, the selected file, and the AI results, each guarded by an
//! independent flow state. Orchestrates the two upstream clients and
//! guarantees that a late response from an abandoned context is discarded
//! instead of applied.
//!
//! Concurrency model: one mutex around the session, never held across a
//! network await. Each flow writes only its own state slots, so concurrent
//! flows cannot race on a field. Stale responses are detected by tagging
//! every call with the generation (and selected path, where relevant)
//! captured at call time and re-checking it at resolution time.

use crate::error::AppError;
use crate::models::{AnalysisResult, FileNode, Repository};
use crate::services::github_client::parse_repo_url;
use crate::services::{GeminiClient, GitHubClient};
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::Mutex;

/// State of one asynchronous flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum FlowState {
    /// Nothing requested yet (or cleared by reset).
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request completed and its result is in the session.
    Ready,
    /// The last request failed; carries the user-facing message.
    Failed(String),
}

impl FlowState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure message, if this flow failed.
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// The per-flow states of a session, one slot per flow.
#[derive(Debug, Clone, Serialize)]
pub struct FlowStates {
    pub import: FlowState,
    pub tree: FlowState,
    pub analysis: FlowState,
    pub content: FlowState,
    pub explanation: FlowState,
}

/// Serializable view of the whole session for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub repository: Option<Repository>,
    pub tree: Vec<FileNode>,
    pub expanded_dirs: Vec<String>,
    pub selected_path: Option<String>,
    pub file_content: Option<String>,
    pub analysis: Option<AnalysisResult>,
    pub explanation: Option<String>,
    pub flows: FlowStates,
}

/// Mutable session state. One writer path per field.
#[derive(Debug, Default)]
struct Session {
    /// Bumped on every import and reset. Responses carrying an older
    /// generation are discarded at resolution time.
    generation: u64,
    repository: Option<Repository>,
    tree: Vec<FileNode>,
    expanded_dirs: BTreeSet<String>,
    selected_path: Option<String>,
    file_content: Option<String>,
    analysis: Option<AnalysisResult>,
    explanation: Option<String>,
    import: FlowState,
    tree_load: FlowState,
    analysis_flow: FlowState,
    content_load: FlowState,
    explanation_flow: FlowState,
}

fn snapshot_of(s: &Session) -> SessionSnapshot {
    SessionSnapshot {
        repository: s.repository.clone(),
        tree: s.tree.clone(),
        expanded_dirs: s.expanded_dirs.iter().cloned().collect(),
        selected_path: s.selected_path.clone(),
        file_content: s.file_content.clone(),
        analysis: s.analysis.clone(),
        explanation: s.explanation.clone(),
        flows: FlowStates {
            import: s.import.clone(),
            tree: s.tree_load.clone(),
            analysis: s.analysis_flow.clone(),
            content: s.content_load.clone(),
            explanation: s.explanation_flow.clone(),
        },
    }
}

/// Controller owning the session and the upstream clients.
pub struct SessionController {
    github: GitHubClient,
    ai: GeminiClient,
    session: Mutex<Session>,
}

impl SessionController {
    /// Create a controller with an empty session.
    pub fn new(github: GitHubClient, ai: GeminiClient) -> Self {
        Self {
            github,
            ai,
            session: Mutex::new(Session::default()),
        }
    }

    /// Current state of the session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        snapshot_of(&*self.session.lock().await)
    }

    /// Import a repository from a user-supplied URL.
    ///
    /// Starting an import clears every trace of the previous repository:
    /// stale per-repository state must not leak across imports. An
    /// unparseable URL fails the import flow without any network call.
    pub async fn import(&self, url: &str) -> Result<SessionSnapshot, AppError> {
        let generation = {
            let mut s = self.session.lock().await;
            s.generation += 1;
            s.repository = None;
            s.tree.clear();
            s.expanded_dirs.clear();
            s.selected_path = None;
            s.file_content = None;
            s.analysis = None;
            s.explanation = None;
            s.tree_load = FlowState::Idle;
            s.analysis_flow = FlowState::Idle;
            s.content_load = FlowState::Idle;
            s.explanation_flow = FlowState::Idle;
            s.import = FlowState::Loading;
            s.generation
        };

        let Some(parsed) = parse_repo_url(url) else {
            let mut s = self.session.lock().await;
            if s.generation == generation {
                s.import = FlowState::Failed("Invalid GitHub URL format".to_string());
            }
            return Ok(snapshot_of(&s));
        };

        tracing::info!(owner = %parsed.owner, repo = %parsed.repo, "Importing repository");
        let result = self.github.get_repository(&parsed.owner, &parsed.repo).await;

        let mut s = self.session.lock().await;
        if s.generation == generation {
            match result {
                Ok(repository) => {
                    s.repository = Some(repository);
                    s.import = FlowState::Ready;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Repository import failed");
                    s.import = FlowState::Failed(e.user_message());
                }
            }
        }
        Ok(snapshot_of(&s))
    }

    /// Load the root directory listing of the imported repository.
    ///
    /// A failure is recorded in the tree flow but blocks nothing else:
    /// a repository with an unreadable tree still shows its metadata.
    pub async fn load_tree(&self) -> Result<SessionSnapshot, AppError> {
        let (generation, owner, repo) = {
            let mut s = self.session.lock().await;
            let repository = s
                .repository
                .as_ref()
                .ok_or_else(|| AppError::not_found("No repository imported"))?;
            let owner = repository.owner.login.clone();
            let repo = repository.name.clone();
            s.tree_load = FlowState::Loading;
            (s.generation, owner, repo)
        };

        let result = self.github.get_contents(&owner, &repo, "").await;

        let mut s = self.session.lock().await;
        if s.generation == generation {
            match result {
                Ok(nodes) => {
                    s.tree = nodes;
                    s.tree_load = FlowState::Ready;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load file tree");
                    s.tree_load = FlowState::Failed(e.user_message());
                }
            }
        }
        Ok(snapshot_of(&s))
    }

    /// Toggle the expansion of a directory in the tree.
    ///
    /// Purely a visibility toggle: children are not fetched, and a second
    /// toggle collapses the directory again.
    pub async fn toggle_dir(&self, path: &str) -> Result<SessionSnapshot, AppError> {
        let mut s = self.session.lock().await;

        let known_dir = s.tree.iter().any(|n| n.path == path && n.is_dir());
        if !known_dir {
            return Err(AppError::not_found_with_id("Directory", path));
        }

        if !s.expanded_dirs.remove(path) {
            s.expanded_dirs.insert(path.to_string());
        }
        Ok(snapshot_of(&s))
    }

    /// Run the whole-repository AI analysis.
    ///
    /// At most one analysis is in flight per repository context; a second
    /// trigger while one is pending returns the current snapshot unchanged.
    pub async fn analyze(&self) -> Result<SessionSnapshot, AppError> {
        let (generation, owner, repo, full_name) = {
            let mut s = self.session.lock().await;
            let repository = s
                .repository
                .as_ref()
                .ok_or_else(|| AppError::not_found("No repository imported"))?;
            if s.analysis_flow.is_loading() {
                return Ok(snapshot_of(&s));
            }
            let owner = repository.owner.login.clone();
            let repo = repository.name.clone();
            let full_name = repository.full_name.clone();
            s.analysis_flow = FlowState::Loading;
            (s.generation, owner, repo, full_name)
        };

        let result = self.run_analysis(&owner, &repo, &full_name).await;

        let mut s = self.session.lock().await;
        if s.generation == generation {
            match result {
                Ok(analysis) => {
                    s.analysis = Some(analysis);
                    s.analysis_flow = FlowState::Ready;
                }
                Err(e) => {
                    tracing::error!(error = %e, "AI analysis failed");
                    s.analysis_flow = FlowState::Failed(e.user_message());
                }
            }
        }
        Ok(snapshot_of(&s))
    }

    /// The analysis sequence: tree fetch, then README, then the AI call.
    ///
    /// Strictly ordered because the prompt depends on both prior results.
    async fn run_analysis(
        &self,
        owner: &str,
        repo: &str,
        full_name: &str,
    ) -> Result<AnalysisResult, AppError> {
        let tree = self.github.get_contents(owner, repo, "").await?;
        let structure = tree
            .iter()
            .map(|n| n.path.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let readme = self.github.get_readme(owner, repo).await?;
        self.ai.analyze_repository(full_name, &readme, &structure).await
    }

    /// Select a file and load its content.
    ///
    /// The prior explanation is cleared synchronously, before any await:
    /// an explanation must never be shown against a different file, even
    /// if its request resolves after the selection changed.
    pub async fn select_file(&self, path: &str) -> Result<SessionSnapshot, AppError> {
        if path.is_empty() {
            return Err(AppError::invalid_input_field(
                "File path must not be empty",
                "path",
            ));
        }

        let (generation, owner, repo) = {
            let mut s = self.session.lock().await;
            let repository = s
                .repository
                .as_ref()
                .ok_or_else(|| AppError::not_found("No repository imported"))?;
            let owner = repository.owner.login.clone();
            let repo = repository.name.clone();
            s.selected_path = Some(path.to_string());
            s.explanation = None;
            s.explanation_flow = FlowState::Idle;
            s.file_content = None;
            s.content_load = FlowState::Loading;
            (s.generation, owner, repo)
        };

        let result = self.github.get_file_content(&owner, &repo, path).await;

        let mut s = self.session.lock().await;
        if s.generation == generation && s.selected_path.as_deref() == Some(path) {
            match result {
                Ok(content) => {
                    s.file_content = Some(content);
                    s.content_load = FlowState::Ready;
                }
                Err(e) => {
                    tracing::warn!(error = %e, path, "Failed to load file content");
                    s.content_load = FlowState::Failed(e.user_message());
                }
            }
        }
        Ok(snapshot_of(&s))
    }

    /// Request an AI explanation of the selected file.
    ///
    /// Gated on the content having loaded. The result is applied only if
    /// the selection is unchanged when the response arrives.
    pub async fn explain(&self) -> Result<SessionSnapshot, AppError> {
        let (generation, path, content) = {
            let mut s = self.session.lock().await;
            let path = s
                .selected_path
                .clone()
                .ok_or_else(|| AppError::invalid_input("No file selected"))?;
            let content = s
                .file_content
                .clone()
                .ok_or_else(|| AppError::invalid_input("File content has not loaded"))?;
            if s.explanation_flow.is_loading() {
                return Ok(snapshot_of(&s));
            }
            s.explanation_flow = FlowState::Loading;
            (s.generation, path, content)
        };

        let result = self.ai.explain_file(&path, &content).await;

        let mut s = self.session.lock().await;
        if s.generation == generation && s.selected_path.as_deref() == Some(path.as_str()) {
            match result {
                Ok(text) => {
                    s.explanation = Some(text);
                    s.explanation_flow = FlowState::Ready;
                }
                Err(e) => {
                    tracing::error!(error = %e, path, "AI explanation failed");
                    s.explanation_flow = FlowState::Failed(e.user_message());
                }
            }
        }
        Ok(snapshot_of(&s))
    }

    /// Return the session to its initial state.
    ///
    /// The generation bump makes every call issued before the reset
    /// resolve into a discard.
    pub async fn reset(&self) -> SessionSnapshot {
        let mut s = self.session.lock().await;
        *s = Session {
            generation: s.generation + 1,
            ..Session::default()
        };
        snapshot_of(&s)
    }
}
