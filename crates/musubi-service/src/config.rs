//! Service configuration.

use musubi_core::models::notification::NotificationType;
use musubi_core::qr::MEMBER_PAYLOAD_TYPE;

/// What re-recording attendance does to payments that already moved on
/// from `unpaid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RerecordPolicy {
    /// Every attendee marked present gets a fresh `unpaid` payment,
    /// discarding any earlier attestation or confirmation.
    #[default]
    ResetPayments,
    /// Payments in `pending_confirmation` or `confirmed` are left as
    /// they are. Attendance is still overwritten.
    PreserveSettled,
}

/// Configuration for the workflow services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub rerecord_policy: RerecordPolicy,
    /// Number of most recent events the analytics cover (default: 20).
    pub analytics_event_window: u64,
    /// Marker a scanned QR payload must carry.
    pub qr_payload_type: String,
    /// Type tag written to reminder notification logs.
    pub reminder_type: NotificationType,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            rerecord_policy: RerecordPolicy::default(),
            analytics_event_window: 20,
            qr_payload_type: MEMBER_PAYLOAD_TYPE.into(),
            reminder_type: NotificationType::PaymentReminder,
        }
    }
}
