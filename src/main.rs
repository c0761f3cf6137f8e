use gitmind::services::gemini_client::{GeminiClient, GeminiClientConfig};
use gitmind::services::github_client::{GitHubClient, GitHubClientConfig};
use gitmind::session::SessionController;
use gitmind::{server, AppError, Config};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_tracing();

    let config = Config::from_env();

    let github = GitHubClient::new(GitHubClientConfig {
        base_url: config.github_api_url.clone(),
        ..GitHubClientConfig::default()
    })?;
    let ai = GeminiClient::new(GeminiClientConfig {
        base_url: config.gemini_api_url.clone(),
        api_key: config.gemini_api_key.clone(),
    })?;

    let controller = Arc::new(SessionController::new(github, ai));
    server::run(config, controller).await
}
