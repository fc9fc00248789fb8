//! Classifier loading and extraction errors.

/// Errors raised while loading or unrolling a classifier.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The classifier kind has no extractor.
    #[error("unsupported classifier kind '{0}'")]
    UnsupportedKind(String),

    /// An MLP uses an activation other than relu, logistic or identity.
    #[error("unsupported activation '{0}'")]
    UnsupportedActivation(String),

    /// Array lengths disagree with each other or with the feature list.
    #[error("shape mismatch for {what}: expected {expected}, got {got}")]
    ShapeMismatch { what: String, expected: usize, got: usize },

    /// A pipeline without stages.
    #[error("pipeline has no steps")]
    EmptyPipeline,

    /// A tree node references an invalid child, feature or class vector.
    #[error("invalid tree node {node}: {reason}")]
    InvalidNode { node: usize, reason: String },

    /// Malformed classifier document.
    #[error("invalid classifier json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    pub(crate) fn shape(what: impl Into<String>, expected: usize, got: usize) -> Self {
        ExtractError::ShapeMismatch {
            what: what.into(),
            expected,
            got,
        }
    }
}
