use thiserror::Error;

/// Request-level failure, attributed to the stage that produced it.
///
/// Every collaborator call in the pipeline is wrapped individually so a
/// failure maps to exactly one kind; nothing here is fatal to the
/// process.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The submitted URL does not match an accepted Reddit URL prefix.
    /// Raised before any external call is made.
    #[error("invalid submission URL: {0}")]
    InvalidInput(String),

    /// The submission could not be resolved or its comments fetched.
    #[error("submission could not be fetched: {0}")]
    SourceUnavailable(String),

    /// Zero comments fetched, or zero comments survived normalization.
    #[error("{0}")]
    NoContent(String),

    /// Classification or chart rendering failed.
    #[error("analysis failed: {0}")]
    AnalysisFailed(String),
}

impl AnalyzeError {
    /// Stable machine-readable kind for the error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::NoContent(_) => "no_content",
            Self::AnalysisFailed(_) => "analysis_failed",
        }
    }
}
