//! The per-user preference update rule.
//!
//! A preference vector lives in the same coordinate system as
//! organization vectors. Slots 0–1 hold the user's last known location;
//! slots 2.. accumulate temporal/semantic taste from visited
//! organizations. The update is a pure computation; callers persist the
//! returned vector themselves and must serialize updates per user.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use embed::geo;

use crate::types::{GeoFix, UserPreference};

/// Errors from the preference update. Invalid location input is *not*
/// among them: a fix that fails to parse or falls out of range is
/// deliberately ignored, preserving the previous location estimate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    /// The visit count did not include the current visit. Proceeding
    /// would divide by zero, so the update refuses up front and the
    /// stored preference stays untouched.
    #[error("visit count {0} does not include the current visit")]
    InvalidState(u64),
    /// Preference and organization vectors disagree in length, so they
    /// were produced at different embedding dimensions.
    #[error("preference has {preference} slots but visited vector has {visited}")]
    DimensionMismatch { preference: usize, visited: usize },
    /// A persisted preference blob whose length is not a whole number of
    /// `f32` values.
    #[error("preference blob of {0} bytes is not a whole number of f32s")]
    CorruptBytes(usize),
}

/// Which running-average recurrence updates the taste slots.
///
/// The platform's reference implementation divides the slot-wise *sum*
/// by the new visit count, which is only a true mean if the stored value
/// were an accumulated sum. It is not, so older visits get discounted
/// twice. `Literal` reproduces that behavior bit for bit and is the
/// default; `Incremental` is the standard running-mean recurrence for
/// deployments that opt into the corrected semantics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeanMode {
    /// `taste = (taste + visited) / n` — reference behavior.
    #[default]
    Literal,
    /// `taste = taste + (visited - taste) / n` — corrected mean.
    Incremental,
}

/// Compute the updated preference vector after a visit.
///
/// `visit_count` counts the user's visit records *including* the one
/// being processed; the caller inserts the visit record first. A present
/// and valid `new_location` overwrites slots 0–1 with the same
/// normalization the embedder applies; an invalid one is skipped.
pub fn update_preference(
    current: &UserPreference,
    visited: &[f32],
    new_location: Option<&GeoFix>,
    visit_count: u64,
    mode: MeanMode,
) -> Result<Vec<f32>, PreferenceError> {
    if visit_count == 0 {
        return Err(PreferenceError::InvalidState(visit_count));
    }
    if current.vector.len() != visited.len() {
        return Err(PreferenceError::DimensionMismatch {
            preference: current.vector.len(),
            visited: visited.len(),
        });
    }

    let mut updated = current.vector.clone();

    if let Some(fix) = new_location {
        match parse_fix(fix) {
            Some((latitude, longitude)) => {
                updated[0] = geo::normalized_latitude(latitude);
                updated[1] = geo::normalized_longitude(longitude);
            }
            None => {
                debug!(
                    user_id = current.user_id,
                    latitude = %fix.latitude,
                    longitude = %fix.longitude,
                    "ignoring unusable location fix"
                );
            }
        }
    }

    let n = visit_count as f32;
    for (slot, visited_value) in updated[2..].iter_mut().zip(&visited[2..]) {
        *slot = match mode {
            MeanMode::Literal => (*slot + visited_value) / n,
            MeanMode::Incremental => *slot + (visited_value - *slot) / n,
        };
    }

    Ok(updated)
}

/// Parse a wire-form fix into coordinates, or `None` when either value
/// fails to parse or falls outside the accepted ranges.
fn parse_fix(fix: &GeoFix) -> Option<(f64, f64)> {
    let latitude: f64 = fix.latitude.trim().parse().ok()?;
    let longitude: f64 = fix.longitude.trim().parse().ok()?;
    if geo::latitude_in_range(latitude) && geo::longitude_in_range(longitude) {
        Some((latitude, longitude))
    } else {
        None
    }
}
