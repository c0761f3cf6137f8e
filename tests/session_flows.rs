//! End-to-end session flow tests against stub GitHub and Gemini servers.
//!
//! Each stub binds an ephemeral port; the clients are pointed at it via
//! their configurable base URLs. No test touches the real network.

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gitmind::services::gemini_client::{GeminiClient, GeminiClientConfig};
use gitmind::services::github_client::{GitHubClient, GitHubClientConfig};
use gitmind::session::{FlowState, SessionController};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bind a stub server on an ephemeral port and return its base URL.
async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn controller(github_base: &str, gemini_base: &str, api_key: Option<&str>) -> Arc<SessionController> {
    let github = GitHubClient::new(GitHubClientConfig {
        base_url: github_base.to_string(),
        ..GitHubClientConfig::default()
    })
    .unwrap();
    let ai = GeminiClient::new(GeminiClientConfig {
        base_url: gemini_base.to_string(),
        api_key: api_key.map(String::from),
    })
    .unwrap();
    Arc::new(SessionController::new(github, ai))
}

fn repository_json() -> Value {
    json!({
        "name": "react",
        "full_name": "facebook/react",
        "owner": { "login": "facebook", "avatar_url": "https://example.com/a.png" },
        "description": "A JavaScript library for building user interfaces",
        "stargazers_count": 230000,
        "forks_count": 47000,
        "language": "JavaScript",
        "default_branch": "main",
        "html_url": "https://github.com/facebook/react"
    })
}

fn root_contents_json() -> Value {
    json!([
        { "name": "src", "path": "src", "type": "dir" },
        { "name": "README.md", "path": "README.md", "type": "file" },
        { "name": "link", "path": "link", "type": "symlink" }
    ])
}

/// A stub GitHub server serving one repository with a small tree.
fn github_stub() -> Router {
    Router::new()
        .route(
            "/repos/{owner}/{repo}",
            get(|| async { Json(repository_json()) }),
        )
        .route(
            "/repos/{owner}/{repo}/contents/",
            get(|| async { Json(root_contents_json()) }),
        )
        .route(
            "/repos/{owner}/{repo}/contents/{*path}",
            get(|Path((_, _, path)): Path<(String, String, String)>| async move {
                let body = format!("// contents of {}\nfn main() {{}}\n", path);
                Json(json!({
                    "name": path.rsplit('/').next().unwrap(),
                    "path": path,
                    "type": "file",
                    "encoding": "base64",
                    "content": format!("{}\n", STANDARD.encode(body))
                }))
            }),
        )
        .route(
            "/repos/{owner}/{repo}/readme",
            get(|| async { "# React\nA library." }),
        )
}

/// A stub Gemini server answering every generateContent call with `text`.
fn gemini_stub(text: String) -> Router {
    Router::new().route(
        "/v1beta/models/{model}",
        post(move || {
            let text = text.clone();
            async move {
                Json(json!({
                    "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                }))
            }
        }),
    )
}

fn analysis_text() -> String {
    json!({
        "summary": "A UI library.",
        "techStack": ["JavaScript", "Flow"],
        "keyFeatures": ["Components", "Hooks"],
        "architectureSuggestion": "Consider splitting the reconciler."
    })
    .to_string()
}

// ── Import ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn import_success_populates_repository() {
    let github = spawn_stub(github_stub()).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    let snapshot = c.import("https://github.com/facebook/react").await.unwrap();

    assert_eq!(snapshot.flows.import, FlowState::Ready);
    let repo = snapshot.repository.unwrap();
    assert_eq!(repo.full_name, "facebook/react");
    assert_eq!(repo.owner.login, "facebook");
    assert_eq!(repo.default_branch, "main");
}

#[tokio::test]
async fn import_unknown_repository_fails_with_generic_message() {
    let app = Router::new().route(
        "/repos/{owner}/{repo}",
        get(|| async { StatusCode::NOT_FOUND }),
    );
    let github = spawn_stub(app).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    let snapshot = c.import("https://github.com/no/such").await.unwrap();

    assert_eq!(
        snapshot.flows.import,
        FlowState::Failed("Repository not found or API rate limit reached".to_string())
    );
    assert!(snapshot.repository.is_none());
}

#[tokio::test]
async fn import_invalid_url_never_contacts_github() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    let app = Router::new().fallback(move || {
        hits_clone.fetch_add(1, Ordering::SeqCst);
        async { StatusCode::OK }
    });
    let github = spawn_stub(app).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    let snapshot = c.import("just-one-segment").await.unwrap();

    assert_eq!(
        snapshot.flows.import,
        FlowState::Failed("Invalid GitHub URL format".to_string())
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ── Tree ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_tree_normalizes_entry_kinds() {
    let github = spawn_stub(github_stub()).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    c.import("facebook/react").await.unwrap();
    let snapshot = c.load_tree().await.unwrap();

    assert_eq!(snapshot.flows.tree, FlowState::Ready);
    assert_eq!(snapshot.tree.len(), 3);
    assert!(snapshot.tree[0].is_dir());
    assert!(!snapshot.tree[1].is_dir());
    // Symlinks coerce to files
    assert!(!snapshot.tree[2].is_dir());
}

#[tokio::test]
async fn tree_failure_does_not_block_the_session() {
    let app = Router::new()
        .route(
            "/repos/{owner}/{repo}",
            get(|| async { Json(repository_json()) }),
        )
        .route(
            "/repos/{owner}/{repo}/contents/",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let github = spawn_stub(app).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    c.import("facebook/react").await.unwrap();
    let snapshot = c.load_tree().await.unwrap();

    assert_eq!(
        snapshot.flows.tree,
        FlowState::Failed("Failed to fetch file tree".to_string())
    );
    // Repository metadata survives the tree failure
    assert!(snapshot.repository.is_some());
}

#[tokio::test]
async fn toggle_expands_and_collapses_without_fetching() {
    let github = spawn_stub(github_stub()).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    c.import("facebook/react").await.unwrap();
    c.load_tree().await.unwrap();

    let snapshot = c.toggle_dir("src").await.unwrap();
    assert_eq!(snapshot.expanded_dirs, vec!["src".to_string()]);
    assert!(snapshot.tree.iter().all(|n| n.children.is_none()));

    let snapshot = c.toggle_dir("src").await.unwrap();
    assert!(snapshot.expanded_dirs.is_empty());
}

// ── File content ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn select_file_decodes_base64_content() {
    let github = spawn_stub(github_stub()).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    c.import("facebook/react").await.unwrap();
    let snapshot = c.select_file("src/index.js").await.unwrap();

    assert_eq!(snapshot.flows.content, FlowState::Ready);
    assert_eq!(snapshot.selected_path.as_deref(), Some("src/index.js"));
    let content = snapshot.file_content.unwrap();
    assert!(content.contains("contents of src/index.js"));
    assert!(content.contains("fn main()"));
}

#[tokio::test]
async fn selecting_a_file_clears_the_previous_explanation() {
    let github = spawn_stub(github_stub()).await;
    let gemini = spawn_stub(gemini_stub("This file does X.".to_string())).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    c.select_file("a.rs").await.unwrap();
    let snapshot = c.explain().await.unwrap();
    assert_eq!(snapshot.explanation.as_deref(), Some("This file does X."));

    let snapshot = c.select_file("b.rs").await.unwrap();
    assert!(snapshot.explanation.is_none());
    assert_eq!(snapshot.flows.explanation, FlowState::Idle);
}

// ── Analysis ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn analyze_produces_structured_result() {
    let github = spawn_stub(github_stub()).await;
    let gemini = spawn_stub(gemini_stub(analysis_text())).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    let snapshot = c.analyze().await.unwrap();

    assert_eq!(snapshot.flows.analysis, FlowState::Ready);
    let analysis = snapshot.analysis.unwrap();
    assert_eq!(analysis.summary, "A UI library.");
    assert_eq!(analysis.tech_stack, vec!["JavaScript", "Flow"]);
    assert_eq!(analysis.key_features.len(), 2);
}

#[tokio::test]
async fn analyze_survives_a_missing_readme() {
    // README endpoint 404s; the analysis must still run with the sentinel.
    let app = Router::new()
        .route(
            "/repos/{owner}/{repo}",
            get(|| async { Json(repository_json()) }),
        )
        .route(
            "/repos/{owner}/{repo}/contents/",
            get(|| async { Json(root_contents_json()) }),
        )
        .route(
            "/repos/{owner}/{repo}/readme",
            get(|| async { StatusCode::NOT_FOUND }),
        );
    let github = spawn_stub(app).await;
    let gemini = spawn_stub(gemini_stub(analysis_text())).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    let snapshot = c.analyze().await.unwrap();

    assert_eq!(snapshot.flows.analysis, FlowState::Ready);
    assert!(snapshot.analysis.is_some());
}

#[tokio::test]
async fn malformed_ai_payload_fails_the_analysis_flow() {
    let github = spawn_stub(github_stub()).await;
    // Valid JSON transport, but the model text is not the expected shape
    let gemini = spawn_stub(gemini_stub("I'd rather not.".to_string())).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    let snapshot = c.analyze().await.unwrap();

    assert_eq!(
        snapshot.flows.analysis,
        FlowState::Failed("Invalid response from AI model".to_string())
    );
    assert!(snapshot.analysis.is_none());
}

#[tokio::test]
async fn missing_api_key_fails_before_any_ai_request() {
    let github = spawn_stub(github_stub()).await;

    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = hits.clone();
    let gemini_app = Router::new().fallback(move || {
        hits_clone.fetch_add(1, Ordering::SeqCst);
        async { StatusCode::OK }
    });
    let gemini = spawn_stub(gemini_app).await;
    let c = controller(&github, &gemini, None);

    c.import("facebook/react").await.unwrap();
    let snapshot = c.analyze().await.unwrap();

    assert_eq!(
        snapshot.flows.analysis,
        FlowState::Failed("GEMINI_API_KEY is not set".to_string())
    );
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ── Explanation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn explain_returns_model_text() {
    let github = spawn_stub(github_stub()).await;
    let gemini = spawn_stub(gemini_stub("It renders components.".to_string())).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    c.select_file("src/index.js").await.unwrap();
    let snapshot = c.explain().await.unwrap();

    assert_eq!(snapshot.flows.explanation, FlowState::Ready);
    assert_eq!(
        snapshot.explanation.as_deref(),
        Some("It renders components.")
    );
}

#[tokio::test]
async fn empty_model_output_yields_the_fallback_text() {
    let github = spawn_stub(github_stub()).await;
    let gemini_app = Router::new().route(
        "/v1beta/models/{model}",
        post(|| async { Json(json!({ "candidates": [] })) }),
    );
    let gemini = spawn_stub(gemini_app).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    c.select_file("src/index.js").await.unwrap();
    let snapshot = c.explain().await.unwrap();

    assert_eq!(snapshot.flows.explanation, FlowState::Ready);
    assert_eq!(
        snapshot.explanation.as_deref(),
        Some("No explanation generated.")
    );
}

#[tokio::test]
async fn late_explanation_for_an_abandoned_file_is_discarded() {
    let github = spawn_stub(github_stub()).await;
    // Gemini answers slowly, so the selection can change mid-flight.
    let gemini_app = Router::new().route(
        "/v1beta/models/{model}",
        post(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Explains a.rs" }] } }]
            }))
        }),
    );
    let gemini = spawn_stub(gemini_app).await;
    let c = controller(&github, &gemini, Some("test-key"));

    c.import("facebook/react").await.unwrap();
    c.select_file("a.rs").await.unwrap();

    let pending = {
        let c = c.clone();
        tokio::spawn(async move { c.explain().await })
    };
    // Let the explanation request leave before changing the selection
    tokio::time::sleep(Duration::from_millis(50)).await;
    c.select_file("b.rs").await.unwrap();

    pending.await.unwrap().unwrap();

    let snapshot = c.snapshot().await;
    assert_eq!(snapshot.selected_path.as_deref(), Some("b.rs"));
    assert!(snapshot.explanation.is_none());
    assert_eq!(snapshot.flows.explanation, FlowState::Idle);
}

// ── Reset ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_discards_a_pending_import() {
    // GitHub answers slowly so the reset lands mid-import.
    let app = Router::new().route(
        "/repos/{owner}/{repo}",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Json(repository_json())
        }),
    );
    let github = spawn_stub(app).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    let pending = {
        let c = c.clone();
        tokio::spawn(async move { c.import("facebook/react").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    c.reset().await;

    pending.await.unwrap().unwrap();

    let snapshot = c.snapshot().await;
    assert!(snapshot.repository.is_none());
    assert_eq!(snapshot.flows.import, FlowState::Idle);
}

#[tokio::test]
async fn reset_returns_an_empty_session() {
    let github = spawn_stub(github_stub()).await;
    let c = controller(&github, "http://127.0.0.1:9", None);

    c.import("facebook/react").await.unwrap();
    c.load_tree().await.unwrap();
    c.toggle_dir("src").await.unwrap();

    let snapshot = c.reset().await;
    assert!(snapshot.repository.is_none());
    assert!(snapshot.tree.is_empty());
    assert!(snapshot.expanded_dirs.is_empty());
}
