//! # Donorec
//!
//! Recommendation core for a donation platform. Organizations are
//! embedded into fixed-length vectors (normalized latitude, longitude,
//! and creation time, plus a unit-length semantic embedding of the
//! description), persisted in an on-disk index, and ranked for each user
//! against a preference vector that drifts toward the organizations the
//! user visits.
//!
//! The surrounding platform (relational storage, HTTP, auth, email) is
//! out of scope; it calls in through three operations on
//! [`RecommendationEngine`]:
//!
//! - [`index_organization`](RecommendationEngine::index_organization) —
//!   embed an organization and commit its vector to the index.
//! - [`record_visit`](RecommendationEngine::record_visit) — fold a visit
//!   into the user's preference vector (optionally moving their location
//!   estimate), returning the updated preference for the caller to
//!   persist.
//! - [`recommend`](RecommendationEngine::recommend) — rank organization
//!   ids by L2 distance to the user's preference vector.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use donorec::{
//!     DonorecConfig, OrganizationRecord, RecommendationEngine, StoreConfig, VisitEvent,
//! };
//!
//! let dir = tempfile::tempdir().unwrap();
//! let config = DonorecConfig {
//!     store: StoreConfig { path: dir.path().join("orgvec.idx") },
//!     ..Default::default()
//! };
//! let engine = RecommendationEngine::new(&config).unwrap();
//!
//! engine.index_organization(&OrganizationRecord {
//!     id: 1,
//!     latitude: 12.9,
//!     longitude: 77.6,
//!     created_at: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
//!     description: Some("feeds children".into()),
//! }).unwrap();
//!
//! let pref = engine.new_preference(7);
//! let event = VisitEvent { user_id: 7, organization_id: 1, location: None };
//! let pref = engine.record_visit(&pref, &event, 1).unwrap();
//!
//! assert_eq!(engine.recommend(&pref, 5).unwrap(), vec![1]);
//! ```

pub mod config;
mod engine;
pub mod preference;
mod types;

pub use crate::config::{
    ConfigLoadError, DonorecConfig, PreferenceConfig, RecommendConfig, StoreConfig,
};
pub use crate::engine::{EngineError, RecommendationEngine};
pub use crate::preference::{update_preference, MeanMode, PreferenceError};
pub use crate::types::{GeoFix, OrganizationRecord, UserPreference, VisitEvent};

pub use embed::{EmbedConfig, EmbedError, Embedder, HashModel, TextModel};
pub use store::{StoreError, VectorStore};
