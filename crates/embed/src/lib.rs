//! Donorec organization embedding.
//!
//! Turns an organization's raw attributes into a fixed-length `f32`
//! vector: three normalized slots for latitude, longitude, and creation
//! time, followed by a unit-length semantic embedding of the free-text
//! description. Organization vectors and user preference vectors share
//! this coordinate system, so a plain L2 nearest-neighbor query over the
//! store ranks organizations for a user.
//!
//! The text portion comes from a [`TextModel`]. The built-in
//! deterministic model needs no downloaded assets; a real pretrained
//! model plugs in through the same trait and is loaded once per process.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use embed::{EmbedConfig, Embedder};
//!
//! let embedder = Embedder::new(&EmbedConfig::default()).unwrap();
//! let created = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
//! let v = embedder.vectorize(12.9, 77.6, created, "feeds children").unwrap();
//! assert_eq!(v.len(), embedder.dimension());
//! ```

mod config;
mod error;
pub mod geo;
mod model;

pub use crate::config::EmbedConfig;
pub use crate::error::EmbedError;
pub use crate::model::{HashModel, TextModel};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;

/// Placeholder fed to the text model when an organization has no
/// description, so every organization gets a well-defined embedding.
pub const EMPTY_DESCRIPTION_PLACEHOLDER: &str = "NA";

/// Embeds organization attributes into vectors of fixed dimension `3 + E`.
///
/// Pure with respect to its inputs: the same attributes and model always
/// produce the same vector. Cheap to clone; the model is shared.
#[derive(Clone)]
pub struct Embedder {
    model: Arc<dyn TextModel>,
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder").finish_non_exhaustive()
    }
}

impl Embedder {
    /// Build an embedder from config. Only the `"hash"` mode is buildable
    /// here; external models go through [`with_model`](Self::with_model).
    pub fn new(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        if cfg.text_dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "text_dimension must be non-zero".into(),
            ));
        }
        match cfg.mode.as_str() {
            "hash" => Ok(Self::with_model(Arc::new(HashModel::new(
                cfg.text_dimension,
            )))),
            other => Err(EmbedError::InvalidConfig(format!(
                "unknown embed mode: {other}"
            ))),
        }
    }

    /// Wrap an externally constructed model.
    pub fn with_model(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Full vector dimension `D = 3 + E`. The single source of truth for
    /// the dimension shared by the store and preference vectors.
    pub fn dimension(&self) -> usize {
        3 + self.model.dimension()
    }

    /// Label of the underlying text model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Embed one organization.
    ///
    /// An empty `description` is replaced by
    /// [`EMPTY_DESCRIPTION_PLACEHOLDER`] before embedding. The semantic
    /// component is L2-normalized so its magnitude stays comparable to
    /// the three fixed slots regardless of description length.
    pub fn vectorize(
        &self,
        latitude: f64,
        longitude: f64,
        created_at: DateTime<Utc>,
        description: &str,
    ) -> Result<Vec<f32>, EmbedError> {
        let text = if description.is_empty() {
            EMPTY_DESCRIPTION_PLACEHOLDER
        } else {
            description
        };

        let mut semantic = self.model.embed(text);
        if semantic.len() != self.model.dimension() {
            return Err(EmbedError::ModelDimension {
                expected: self.model.dimension(),
                actual: semantic.len(),
            });
        }
        l2_normalize_in_place(&mut semantic);

        let mut vector = Vec::with_capacity(self.dimension());
        vector.push(geo::normalized_latitude(latitude));
        vector.push(geo::normalized_longitude(longitude));
        vector.push(geo::normalized_posix(created_at.timestamp()));
        vector.extend(semantic);
        Ok(vector)
    }
}

/// Process-wide embedder handle, built on first use and reused after.
///
/// Later calls return the existing handle and ignore `cfg`; the model is
/// a load-once resource.
pub fn shared(cfg: &EmbedConfig) -> Result<Arc<Embedder>, EmbedError> {
    static SHARED: OnceCell<Arc<Embedder>> = OnceCell::new();
    SHARED
        .get_or_try_init(|| Embedder::new(cfg).map(Arc::new))
        .map(Arc::clone)
}

/// Scale `v` to unit L2 length in place. A zero vector is left untouched.
fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}
