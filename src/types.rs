//! Typed request and state records exchanged with the surrounding
//! platform.
//!
//! The HTTP and relational layers are external collaborators; these
//! types pin down the exact shape of what crosses the boundary instead
//! of ad hoc key lookups on loose payloads. Location data arrives as raw
//! strings because the transport does not guarantee numbers; parsing and
//! validation happen in the preference update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preference::PreferenceError;

/// Attributes of an organization at registration time, as handed over by
/// the relational store. The id is an opaque foreign key; nothing here
/// validates it against the owning table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationRecord {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    /// Free-text mission description. Absent or empty descriptions embed
    /// as a fixed placeholder.
    pub description: Option<String>,
}

/// A GPS fix attached to a visit, still in wire form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeoFix {
    pub latitude: String,
    pub longitude: String,
}

/// One user-visits-organization event from the HTTP layer.
///
/// `location` is explicitly optional; a missing fix means "no new
/// location estimate", not an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisitEvent {
    pub user_id: i64,
    pub organization_id: i64,
    #[serde(default)]
    pub location: Option<GeoFix>,
}

/// A user's running preference vector plus the visit count it was last
/// updated at. Stored by the relational layer as raw `f32` bytes next to
/// an externally tracked count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreference {
    pub user_id: i64,
    pub vector: Vec<f32>,
    pub visit_count: u64,
}

impl UserPreference {
    /// Fresh all-zero preference at the engine's vector dimension.
    pub fn new(user_id: i64, dimension: usize) -> Self {
        Self {
            user_id,
            vector: vec![0.0; dimension],
            visit_count: 0,
        }
    }

    /// Raw bytes of the vector in native `f32` layout, the format of the
    /// relational store's binary preference field.
    pub fn to_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.vector).to_vec()
    }

    /// Rebuild a preference from the relational store's binary field.
    pub fn from_bytes(user_id: i64, bytes: &[u8], visit_count: u64) -> Result<Self, PreferenceError> {
        if bytes.len() % 4 != 0 {
            return Err(PreferenceError::CorruptBytes(bytes.len()));
        }
        let vector = bytes
            .chunks_exact(4)
            .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self {
            user_id,
            vector,
            visit_count,
        })
    }
}
