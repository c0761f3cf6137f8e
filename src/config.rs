//! Environment-based configuration.

use std::env;
use std::path::PathBuf;

/// Default GitHub REST API endpoint.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default Gemini API endpoint.
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port.
    pub port: u16,

    /// Directory holding the built frontend (served with an SPA fallback).
    pub static_dir: PathBuf,

    /// Gemini API key. Absence is not an error at startup; the first AI
    /// call reports it instead.
    pub gemini_api_key: Option<String>,

    /// Base URL of the GitHub API (overridable for tests).
    pub github_api_url: String,

    /// Base URL of the Gemini API (overridable for tests).
    pub gemini_api_url: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let static_dir = env::var("GITMIND_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dist"));

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());

        let github_api_url = env::var("GITHUB_API_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string());

        let gemini_api_url = env::var("GEMINI_API_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_string());

        Self {
            port,
            static_dir,
            gemini_api_key,
            github_api_url,
            gemini_api_url,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            static_dir: PathBuf::from("dist"),
            gemini_api_key: None,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            gemini_api_url: DEFAULT_GEMINI_API_URL.to_string(),
        }
    }
}
