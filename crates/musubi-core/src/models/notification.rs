//! Notification log domain model.
//!
//! Logs are append-only: one row per reminder dispatch attempt that
//! reached the push capability, whatever its outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PaymentReminder,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PaymentReminder => "payment_reminder",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payment_reminder" => Some(NotificationType::PaymentReminder),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: Uuid,
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub recipient_uid: String,
    pub notification_type: NotificationType,
    pub sent_at: DateTime<Utc>,
    pub sent_by: String,
    pub title: String,
    pub body: String,
    pub success: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationLog {
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub recipient_uid: String,
    pub notification_type: NotificationType,
    pub sent_by: String,
    pub title: String,
    pub body: String,
    pub success: bool,
    pub error: Option<String>,
}
