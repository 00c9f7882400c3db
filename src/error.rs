use thiserror::Error;

/// Failures surfaced by the analysis pipeline.
///
/// Extraction errors are recovered per document; embedding and configuration
/// errors abort only the collection they occur in.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("failed to extract '{document}': {reason}")]
    Extraction { document: String, reason: String },

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("invalid configuration for collection '{collection}': {reason}")]
    Configuration { collection: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AnalyzerError {
    pub fn extraction(document: impl Into<String>, reason: impl ToString) -> Self {
        Self::Extraction {
            document: document.into(),
            reason: reason.to_string(),
        }
    }

    pub fn configuration(collection: impl Into<String>, reason: impl ToString) -> Self {
        Self::Configuration {
            collection: collection.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = AnalyzerError> = std::result::Result<T, E>;
