use thiserror::Error;

/// Errors returned by prosody operations.
#[derive(Debug, Error)]
pub enum ProsodyError {
    #[error("shape mismatch: feature {feature:?} at word {index} has no usable shape")]
    ShapeMismatch { feature: String, index: usize },

    #[error("quantization failed: {0}")]
    Quantization(String),

    #[error("length mismatch: expected {expected} symbols, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("model error: {0}")]
    Model(String),
}
