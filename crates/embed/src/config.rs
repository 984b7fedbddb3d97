use serde::{Deserialize, Serialize};

/// Runtime configuration for the embedding stage.
///
/// # Example
/// ```
/// use embed::{Embedder, EmbedConfig};
///
/// let cfg = EmbedConfig {
///     text_dimension: 96,
///     ..Default::default()
/// };
/// let embedder = Embedder::new(&cfg).unwrap();
/// assert_eq!(embedder.dimension(), 99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbedConfig {
    /// Model selector: `"hash"` builds the deterministic built-in model.
    /// Anything else is rejected at construction; external models are
    /// supplied through [`Embedder::with_model`](crate::Embedder::with_model).
    pub mode: String,
    /// Output dimension `E` of the text model. The full vector dimension
    /// is `3 + E`.
    pub text_dimension: usize,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: "hash".into(),
            // 96 text values + 3 fixed slots keeps the default vector
            // width byte-compatible with preference blobs written by the
            // legacy system.
            text_dimension: 96,
        }
    }
}
