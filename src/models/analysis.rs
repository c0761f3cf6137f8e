//! Structured AI analysis result model.

use serde::{Deserialize, Serialize};

/// Structured output of a whole-repository AI analysis.
///
/// All four fields are required: the analysis call either produces a fully
/// populated result or fails as a whole. Deserialization intentionally has
/// no defaults, so a payload missing any field is rejected rather than
/// silently coerced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Free-text project summary.
    pub summary: String,

    /// Primary languages, frameworks and libraries, in model order.
    pub tech_stack: Vec<String>,

    /// Key features discovered from the README and file structure.
    pub key_features: Vec<String>,

    /// Architectural suggestion or observation.
    pub architecture_suggestion: String,
}
