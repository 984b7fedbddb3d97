use thiserror::Error;

/// Errors surfaced while building an embedder or producing a vector.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmbedError {
    /// The text model returned a vector whose length disagrees with the
    /// dimension it advertised.
    #[error("text model returned {actual} values, expected {expected}")]
    ModelDimension { expected: usize, actual: usize },
    /// Configuration is inconsistent (unknown mode, zero dimension, ...).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
}
