//! Upstream API clients.
//!
//! This module contains the clients for the two external services the
//! session orchestrates: the GitHub REST API (repository metadata, file
//! trees, file contents, READMEs) and the Gemini API (repository analysis
//! and file explanations).
//!
//! Clients are independent of the HTTP server and testable against stub
//! endpoints via their configurable base URLs.

pub mod gemini_client;
pub mod github_client;

pub use gemini_client::GeminiClient;
pub use github_client::GitHubClient;
