//! The engine facade stitching embedding, storage, and preference
//! updates together.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use embed::{EmbedError, Embedder};
use store::{StoreError, VectorStore};

use crate::config::{ConfigLoadError, DonorecConfig};
use crate::preference::{update_preference, MeanMode, PreferenceError};
use crate::types::{OrganizationRecord, UserPreference, VisitEvent};

/// Errors surfaced by engine operations, aggregating the stage errors.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("embedding failure: {0}")]
    Embed(#[from] EmbedError),
    #[error("vector store failure: {0}")]
    Store(#[from] StoreError),
    #[error("preference update failure: {0}")]
    Preference(#[from] PreferenceError),
    #[error("configuration failure: {0}")]
    Config(#[from] ConfigLoadError),
}

/// Organization recommendation engine.
///
/// Built once per process: the embedding model is loaded at construction
/// and the store is opened at the embedder's dimension, which makes the
/// dimension agreement between the two a constructor-time guarantee.
///
/// Reads may run concurrently. Callers must serialize
/// [`record_visit`](Self::record_visit) per user; two concurrent visits
/// by the same user would race on the running average.
#[derive(Debug)]
pub struct RecommendationEngine {
    embedder: Arc<Embedder>,
    store: VectorStore,
    mean_mode: MeanMode,
    default_limit: usize,
}

impl RecommendationEngine {
    /// Build the engine from a validated configuration.
    pub fn new(config: &DonorecConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let embedder = Arc::new(Embedder::new(&config.embed)?);
        let store = VectorStore::open(&config.store.path, embedder.dimension())?;
        info!(
            model = embedder.model_name(),
            dimension = embedder.dimension(),
            index = %store.path().display(),
            "recommendation engine ready"
        );
        Ok(Self {
            embedder,
            store,
            mean_mode: config.preference.mean_mode,
            default_limit: config.recommend.default_limit,
        })
    }

    /// Vector dimension `D` shared by organization and preference
    /// vectors.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// The engine's embedder handle.
    pub fn embedder(&self) -> &Arc<Embedder> {
        &self.embedder
    }

    /// The underlying vector store.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Fresh zero preference for a new user, sized to this engine's
    /// dimension.
    pub fn new_preference(&self, user_id: i64) -> UserPreference {
        UserPreference::new(user_id, self.dimension())
    }

    /// Embed an organization and commit its vector to the index.
    ///
    /// Called at registration time and again whenever an organization is
    /// re-indexed; the previous vector is replaced wholesale.
    pub fn index_organization(&self, org: &OrganizationRecord) -> Result<(), EngineError> {
        let vector = self.embedder.vectorize(
            org.latitude,
            org.longitude,
            org.created_at,
            org.description.as_deref().unwrap_or(""),
        )?;
        self.store.insert(org.id, vector)?;
        self.store.write()?;
        debug!(organization = org.id, "indexed organization vector");
        Ok(())
    }

    /// Compute the user's preference after a visit.
    ///
    /// `visit_count_after` is the user's visit-record count *including*
    /// the visit being processed; the relational layer inserts the
    /// record first, then counts. The updated preference is returned for
    /// the caller to persist; nothing is written here.
    pub fn record_visit(
        &self,
        preference: &UserPreference,
        event: &VisitEvent,
        visit_count_after: u64,
    ) -> Result<UserPreference, EngineError> {
        let visited = self.store.search_vector(event.organization_id)?;
        let vector = update_preference(
            preference,
            &visited,
            event.location.as_ref(),
            visit_count_after,
            self.mean_mode,
        )?;
        debug!(
            user = event.user_id,
            organization = event.organization_id,
            visit_count = visit_count_after,
            "updated preference vector"
        );
        Ok(UserPreference {
            user_id: preference.user_id,
            vector,
            visit_count: visit_count_after,
        })
    }

    /// Ids of the `top_n` organizations nearest to the user's preference
    /// vector, best first.
    pub fn recommend(
        &self,
        preference: &UserPreference,
        top_n: usize,
    ) -> Result<Vec<i64>, EngineError> {
        Ok(self.store.nearest(&preference.vector, top_n)?)
    }

    /// [`recommend`](Self::recommend) with the configured default limit.
    pub fn recommend_default(&self, preference: &UserPreference) -> Result<Vec<i64>, EngineError> {
        self.recommend(preference, self.default_limit)
    }
}
