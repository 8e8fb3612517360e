//! Circle (organization) domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A club or group managed in Musubi. Owns its members, guests and
/// events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub id: Uuid,
    pub name: String,
    /// Icon glyph shown next to the name.
    pub emoji: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCircle {
    pub name: String,
    pub emoji: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateCircle {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub description: Option<String>,
}
