//! Circle membership domain model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CircleRole {
    Organizer,
    Member,
}

impl CircleRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircleRole::Organizer => "organizer",
            CircleRole::Member => "member",
        }
    }
}

impl fmt::Display for CircleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircleRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organizer" => Ok(CircleRole::Organizer),
            "member" => Ok(CircleRole::Member),
            other => Err(format!("unknown circle role: {other}")),
        }
    }
}

/// A registered user's membership in a circle, keyed by
/// `(circle_id, uid)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircleMember {
    pub circle_id: Uuid,
    pub uid: String,
    pub role: CircleRole,
    pub joined_at: DateTime<Utc>,
    pub display_name: String,
    pub email: String,
    pub photo_url: Option<String>,
}

impl CircleMember {
    pub fn is_organizer(&self) -> bool {
        self.role == CircleRole::Organizer
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    pub circle_id: Uuid,
    pub uid: String,
    pub role: CircleRole,
    pub display_name: String,
    pub email: String,
    pub photo_url: Option<String>,
}
