//! Gemini API client.
//!
//! Two operations against the `generateContent` endpoint: a structured
//! whole-repository analysis with a server-enforced output schema, and a
//! free-text single-file explanation. Both are single-shot: no retry, no
//! streaming, no cancellation.

use crate::error::AppError;
use crate::models::AnalysisResult;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Model used for structured repository analysis.
const ANALYSIS_MODEL: &str = "gemini-3-pro-preview";

/// Model used for free-text file explanations.
const EXPLANATION_MODEL: &str = "gemini-3-flash-preview";

/// README text is truncated to this many characters before inclusion in the
/// analysis prompt, bounding payload size and cost.
const README_MAX_CHARS: usize = 5000;

/// File content is truncated to this many characters before inclusion in
/// the explanation prompt.
const FILE_CONTENT_MAX_CHARS: usize = 10_000;

/// Sentinel returned when the model produced no explanation text.
pub const NO_EXPLANATION_FALLBACK: &str = "No explanation generated.";

/// Gemini API client configuration.
#[derive(Debug, Clone)]
pub struct GeminiClientConfig {
    /// Base URL of the Gemini API.
    pub base_url: String,

    /// API key. `None` is tolerated at construction; the first call
    /// reports the missing key as a configuration error.
    pub api_key: Option<String>,
}

impl Default for GeminiClientConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_GEMINI_API_URL.to_string(),
            api_key: None,
        }
    }
}

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiClientConfig,
}

// Response shape of generateContent. Only the text path is read.

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if any was produced.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Truncate a string to at most `max` characters, on a char boundary.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// JSON schema the analysis call asks the provider to enforce server-side.
///
/// Mirrors [`AnalysisResult`]: four required fields, no extras.
fn analysis_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "techStack": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "keyFeatures": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "architectureSuggestion": { "type": "STRING" }
        },
        "required": ["summary", "techStack", "keyFeatures", "architectureSuggestion"]
    })
}

/// Parse the model's JSON text into an [`AnalysisResult`].
///
/// A payload missing any required field is an invalid response, never
/// coerced with defaults.
fn parse_analysis(text: &str) -> Result<AnalysisResult, AppError> {
    serde_json::from_str::<AnalysisResult>(text).map_err(|e| {
        tracing::error!(raw = text, error = %e, "Failed to parse AI analysis response");
        AppError::invalid_ai_response(e.to_string())
    })
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The configured API key, or a configuration error.
    ///
    /// Checked per call rather than at startup so the process can serve
    /// repository browsing without a key.
    fn api_key(&self) -> Result<&str, AppError> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::configuration("GEMINI_API_KEY is not set"))
    }

    /// Issue one generateContent call and return the response body.
    async fn generate(&self, model: &str, body: Value) -> Result<GenerateContentResponse, AppError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.get("error")?
                        .get("message")?
                        .as_str()
                        .map(String::from)
                })
                .unwrap_or_else(|| format!("AI request failed ({})", status.as_u16()));

            return Err(AppError::ai_api_with_status(message, status.as_u16()));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| AppError::invalid_ai_response(format!("Failed to parse response: {}", e)))
    }

    /// Analyze a whole repository from its README and file structure.
    ///
    /// `file_structure` is the newline-joined path listing, passed in full;
    /// the README is truncated to its first 5000 characters.
    pub async fn analyze_repository(
        &self,
        repo_name: &str,
        readme: &str,
        file_structure: &str,
    ) -> Result<AnalysisResult, AppError> {
        let prompt = format!(
            "Analyze this GitHub repository: {}\n\n\
             README Content:\n{}\n\n\
             File Structure:\n{}\n\n\
             Please provide a detailed technical analysis including:\n\
             1. A concise summary of what this project does.\n\
             2. The primary tech stack (languages, frameworks, libraries).\n\
             3. Key features discovered from the readme and structure.\n\
             4. An architectural suggestion or observation.",
            repo_name,
            truncate_chars(readme, README_MAX_CHARS),
            file_structure
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": analysis_response_schema()
            }
        });

        let response = self.generate(ANALYSIS_MODEL, body).await?;
        let text = response
            .text()
            .ok_or_else(|| AppError::invalid_ai_response("Empty analysis response"))?;

        parse_analysis(&text)
    }

    /// Explain one file's contents in free text.
    ///
    /// Content is truncated to its first 10,000 characters. Returns the
    /// provider's text verbatim, or [`NO_EXPLANATION_FALLBACK`] if the
    /// model produced none.
    pub async fn explain_file(&self, path: &str, content: &str) -> Result<String, AppError> {
        let prompt = format!(
            "Explain the following code file ({}) in simple terms, \
             highlighting its purpose and logic:\n\n```\n{}\n```",
            path,
            truncate_chars(content, FILE_CONTENT_MAX_CHARS)
        );

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self.generate(EXPLANATION_MODEL, body).await?;
        Ok(response
            .text()
            .unwrap_or_else(|| NO_EXPLANATION_FALLBACK.to_string()))
    }
}
