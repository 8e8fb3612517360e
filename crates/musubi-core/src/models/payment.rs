//! Payment domain model and status state machine.
//!
//! A payment record is a manual attestation, not a money movement:
//!
//! ```text
//! unpaid --mark_paid--> pending_confirmation --confirm--> confirmed
//!   |                                                       |
//!   +--------------------confirm-----------------------> confirmed
//! any state --reset--> unpaid
//! ```
//!
//! There is no edge from `confirmed` back to `pending_confirmation`;
//! reset is the only way out of `confirmed`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::attendance::AttendeeId;
use crate::error::{MusubiError, MusubiResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    PendingConfirmation,
    Confirmed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::PendingConfirmation => "pending_confirmation",
            PaymentStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(PaymentStatus::Unpaid),
            "pending_confirmation" => Ok(PaymentStatus::PendingConfirmation),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// A transition of the payment state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    /// The owing member attests they paid.
    MarkPaid,
    /// An organizer confirms receipt.
    Confirm,
    /// An organizer returns the payment to `unpaid`, clearing all
    /// attestation metadata.
    Reset,
}

impl PaymentAction {
    pub fn target(&self) -> PaymentStatus {
        match self {
            PaymentAction::MarkPaid => PaymentStatus::PendingConfirmation,
            PaymentAction::Confirm => PaymentStatus::Confirmed,
            PaymentAction::Reset => PaymentStatus::Unpaid,
        }
    }

    /// States this action may be applied from.
    pub fn allowed_from(&self) -> &'static [PaymentStatus] {
        match self {
            PaymentAction::MarkPaid | PaymentAction::Confirm => &[
                PaymentStatus::Unpaid,
                PaymentStatus::PendingConfirmation,
            ],
            PaymentAction::Reset => &[
                PaymentStatus::Unpaid,
                PaymentStatus::PendingConfirmation,
                PaymentStatus::Confirmed,
            ],
        }
    }

    /// Validate the transition from `from` and return the new status.
    pub fn apply(&self, from: PaymentStatus) -> MusubiResult<PaymentStatus> {
        if self.allowed_from().contains(&from) {
            return Ok(self.target());
        }
        match (self, from) {
            (PaymentAction::MarkPaid, PaymentStatus::Confirmed) => {
                Err(MusubiError::AlreadyConfirmed)
            }
            _ => Err(MusubiError::InvalidTransition {
                from: from.to_string(),
                to: self.target().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub attendee: AttendeeId,
    /// The event fee at the time the record was created.
    pub amount: u64,
    pub status: PaymentStatus,
    pub marked_paid_at: Option<DateTime<Utc>>,
    pub marked_paid_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub confirmed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub display_name: String,
    pub email: Option<String>,
}

/// A freshly derived payment: written as `unpaid` with all attestation
/// metadata cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWrite {
    pub attendee: AttendeeId,
    pub amount: u64,
    pub display_name: String,
    pub email: Option<String>,
}

/// A guarded status change applied by the repository.
///
/// The repository only writes when the stored status is still one of
/// `action.allowed_from()`.
#[derive(Debug, Clone)]
pub struct PaymentTransition {
    pub action: PaymentAction,
    pub actor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_paid_moves_to_pending() {
        assert_eq!(
            PaymentAction::MarkPaid.apply(PaymentStatus::Unpaid).unwrap(),
            PaymentStatus::PendingConfirmation
        );
        assert_eq!(
            PaymentAction::MarkPaid
                .apply(PaymentStatus::PendingConfirmation)
                .unwrap(),
            PaymentStatus::PendingConfirmation
        );
    }

    #[test]
    fn mark_paid_on_confirmed_is_already_confirmed() {
        let err = PaymentAction::MarkPaid
            .apply(PaymentStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, MusubiError::AlreadyConfirmed));
    }

    #[test]
    fn confirm_allowed_without_member_attestation() {
        assert_eq!(
            PaymentAction::Confirm.apply(PaymentStatus::Unpaid).unwrap(),
            PaymentStatus::Confirmed
        );
    }

    #[test]
    fn confirm_twice_is_invalid() {
        let err = PaymentAction::Confirm
            .apply(PaymentStatus::Confirmed)
            .unwrap_err();
        assert!(matches!(err, MusubiError::InvalidTransition { .. }));
    }

    #[test]
    fn reset_is_the_only_way_out_of_confirmed() {
        for action in [PaymentAction::MarkPaid, PaymentAction::Confirm] {
            assert!(action.apply(PaymentStatus::Confirmed).is_err());
        }
        assert_eq!(
            PaymentAction::Reset.apply(PaymentStatus::Confirmed).unwrap(),
            PaymentStatus::Unpaid
        );
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::PendingConfirmation,
            PaymentStatus::Confirmed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
        assert!("paid".parse::<PaymentStatus>().is_err());
    }
}
