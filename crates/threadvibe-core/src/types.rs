//! Shared types for the analysis pipeline and its response payloads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AnalyzeError;

/// Normalized frequency distribution over observed classifier labels.
///
/// Values are proportions in `[0, 1]` and sum to 1.0 for a non-empty
/// distribution. An empty map means no comments were classified.
pub type LabelDistribution = HashMap<String, f64>;

/// A single classifier prediction, index-aligned with its input batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Model confidence for `label`, in `[0, 1]`.
    pub score: f32,
}

/// Successful analysis of one submission.
///
/// Computed fresh per request and never cached. Chart fields carry
/// base64-encoded PNG data, ready for embedding in a transport payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub sentiment: LabelDistribution,
    pub emotion: LabelDistribution,
    pub sentiment_chart: String,
    pub emotion_chart: String,
}

/// Error payload surfaced to the caller in place of an [`AnalysisResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable machine-readable kind, see [`AnalyzeError::kind`].
    pub kind: String,
    pub error: String,
}

impl From<&AnalyzeError> for ErrorResponse {
    fn from(err: &AnalyzeError) -> Self {
        Self {
            kind: err.kind().to_string(),
            error: err.to_string(),
        }
    }
}
