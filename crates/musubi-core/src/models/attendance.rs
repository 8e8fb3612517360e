//! Attendance domain model.
//!
//! One record exists per roster entry per event, keyed by
//! `(circle_id, event_id, attendee)`. Re-recording replaces the whole
//! record.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::payment::PaymentWrite;

/// Who an attendance or payment record belongs to.
///
/// Members are identified by their user id, guests by the id the circle
/// issued them. Exactly one of the two applies to any attendee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttendeeId {
    Member(String),
    Guest(Uuid),
}

impl AttendeeId {
    /// Document key of the attendee within an event's subcollections.
    pub fn key(&self) -> String {
        match self {
            AttendeeId::Member(uid) => uid.clone(),
            AttendeeId::Guest(id) => id.to_string(),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, AttendeeId::Guest(_))
    }

    pub fn uid(&self) -> Option<&str> {
        match self {
            AttendeeId::Member(uid) => Some(uid),
            AttendeeId::Guest(_) => None,
        }
    }

    pub fn guest_id(&self) -> Option<Uuid> {
        match self {
            AttendeeId::Member(_) => None,
            AttendeeId::Guest(id) => Some(*id),
        }
    }

    /// Rebuild an attendee id from its stored `(is_guest, key)` pair.
    pub fn from_parts(is_guest: bool, key: &str) -> Result<Self, String> {
        if is_guest {
            Uuid::parse_str(key)
                .map(AttendeeId::Guest)
                .map_err(|e| format!("invalid guest id {key}: {e}"))
        } else {
            Ok(AttendeeId::Member(key.to_string()))
        }
    }
}

impl fmt::Display for AttendeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendeeId::Member(uid) => write!(f, "member:{uid}"),
            AttendeeId::Guest(id) => write!(f, "guest:{id}"),
        }
    }
}

/// One roster line submitted to the attendance recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeInput {
    pub attendee: AttendeeId,
    pub attended: bool,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub attendee: AttendeeId,
    pub attended: bool,
    /// `None` when the attendee was recorded as absent.
    pub checked_in_at: Option<DateTime<Utc>>,
    /// Organizer who recorded or scanned the attendee.
    pub checked_in_by: String,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

/// A roster line as offered to the organizer before recording: every
/// active member and guest, with whatever was recorded previously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub attendee: AttendeeId,
    pub display_name: String,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    /// `None` if no attendance has been recorded for this attendee yet.
    pub prior_attended: Option<bool>,
}

/// All writes of one recording, committed atomically.
///
/// Attendance writes and payment writes are full overwrites of the
/// records at their keys. Either the whole batch becomes visible or none
/// of it does.
#[derive(Debug, Clone)]
pub struct AttendanceBatch {
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub checked_in_by: String,
    pub attendance: Vec<AttendeeInput>,
    pub payments: Vec<PaymentWrite>,
}

impl AttendanceBatch {
    pub fn new(circle_id: Uuid, event_id: Uuid, checked_in_by: impl Into<String>) -> Self {
        Self {
            circle_id,
            event_id,
            checked_in_by: checked_in_by.into(),
            attendance: Vec::new(),
            payments: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attendance.is_empty() && self.payments.is_empty()
    }
}
