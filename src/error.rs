//! Application error types.
//!
//! These errors are serializable and can be embedded in API responses
//! to provide meaningful error messages to the frontend.

use serde::Serialize;
use thiserror::Error;

/// Application-level errors surfaced by the session API.
///
/// All variants serialize to a structured JSON object for frontend consumption.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum AppError {
    /// Invalid input provided (e.g. an unparseable repository URL).
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        field: Option<String>,
    },

    /// Requested resource not found.
    #[error("Not found: {resource}")]
    NotFound {
        resource: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// GitHub API request returned a non-success status.
    #[error("GitHub API error: {message}")]
    GitHubApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },

    /// AI API request failed at the transport or status level.
    #[error("AI API error: {message}")]
    AiApi {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The AI provider's structured response could not be parsed.
    #[error("Invalid AI response: {message}")]
    InvalidAiResponse { message: String },

    /// Required configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network request failed before a response was received.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Internal application error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid input error with field name.
    pub fn invalid_input_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: None,
        }
    }

    /// Create a not found error with ID.
    pub fn not_found_with_id(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: Some(id.into()),
        }
    }

    /// Create a GitHub API error.
    pub fn github_api(message: impl Into<String>) -> Self {
        Self::GitHubApi {
            message: message.into(),
            status_code: None,
            endpoint: None,
        }
    }

    /// Create a GitHub API error with status code and endpoint.
    pub fn github_api_full(
        message: impl Into<String>,
        status_code: u16,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::GitHubApi {
            message: message.into(),
            status_code: Some(status_code),
            endpoint: Some(endpoint.into()),
        }
    }

    /// Create an AI API error.
    pub fn ai_api(message: impl Into<String>) -> Self {
        Self::AiApi {
            message: message.into(),
            status_code: None,
        }
    }

    /// Create an AI API error with status code.
    pub fn ai_api_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::AiApi {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create an invalid AI response error.
    pub fn invalid_ai_response(message: impl Into<String>) -> Self {
        Self::InvalidAiResponse {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// User-facing message for display in a flow's error slot.
    ///
    /// Strips the variant prefix that `Display` adds; the frontend shows
    /// this text directly next to the panel that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { message, .. } => message.clone(),
            Self::NotFound { resource, .. } => resource.clone(),
            Self::GitHubApi { message, .. } => message.clone(),
            Self::AiApi { message, .. } => message.clone(),
            Self::InvalidAiResponse { .. } => "Invalid response from AI model".to_string(),
            Self::Configuration { message } => message.clone(),
            Self::Network { message } => message.clone(),
            Self::Internal { message } => message.clone(),
        }
    }
}

// Conversions from common error types

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("Request timed out")
        } else if err.is_connect() {
            Self::network("Failed to connect to server")
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {}", err))
    }
}
