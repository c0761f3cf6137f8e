//! GitMind: a backend that imports a public GitHub repository, exposes its
//! file tree and file contents for browsing, and produces AI analyses and
//! explanations of the code via the Gemini API.
//!
//! The crate is organized around one [`session::SessionController`] that
//! orchestrates two upstream clients ([`services::GitHubClient`] and
//! [`services::GeminiClient`]) and is exposed over HTTP by [`server`].

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod session;

pub use config::Config;
pub use error::AppError;
pub use session::{SessionController, SessionSnapshot};
