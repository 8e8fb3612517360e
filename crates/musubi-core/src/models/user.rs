//! User profile domain model.
//!
//! Profiles are keyed by the stable user id the authentication provider
//! issues. Display name, email and photo are copied onto memberships,
//! attendance and payment records as point-in-time snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller identity as verified by the authentication provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    /// Opaque push delivery tokens registered by the user's devices.
    pub push_tokens: Vec<String>,
    pub faculty: Option<String>,
    pub grade: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields that can be updated on an existing profile.
///
/// Display name and photo changes are propagated to every membership
/// of the user in the same batch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUserProfile {
    pub display_name: Option<String>,
    /// `Some(Some(url))` = set, `Some(None)` = clear, `None` = no change.
    pub photo_url: Option<Option<String>>,
    pub faculty: Option<String>,
    pub grade: Option<String>,
}

impl UpdateUserProfile {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.photo_url.is_none()
            && self.faculty.is_none()
            && self.grade.is_none()
    }

    /// Whether the update touches a field denormalized onto memberships.
    pub fn touches_memberships(&self) -> bool {
        self.display_name.is_some() || self.photo_url.is_some()
    }
}
