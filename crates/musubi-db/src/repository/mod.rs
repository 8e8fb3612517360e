//! SurrealDB repository implementations.
//!
//! Composite document keys are flattened into one string record id, so
//! the document for an attendee of an event is addressed as
//! `attendance:⟨circle:event:attendee⟩`.

mod attendance;
mod circle;
mod event;
mod guest;
mod member;
mod notification;
mod payment;
mod user;

pub use attendance::SurrealAttendanceRepository;
pub use circle::SurrealCircleRepository;
pub use event::SurrealEventRepository;
pub use guest::SurrealGuestRepository;
pub use member::SurrealMemberRepository;
pub use notification::SurrealNotificationLogRepository;
pub use payment::SurrealPaymentRepository;
pub use user::SurrealUserProfileRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

pub(crate) fn member_key(circle_id: Uuid, uid: &str) -> String {
    format!("{circle_id}:{uid}")
}

/// Key shared by the attendance and payment documents of one attendee.
pub(crate) fn attendee_key(circle_id: Uuid, event_id: Uuid, attendee: &str) -> String {
    format!("{circle_id}:{event_id}:{attendee}")
}

pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|e| DbError::InvalidRecord(format!("invalid {field}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendee_keys_are_scoped_by_event() {
        let circle = Uuid::new_v4();
        let a = attendee_key(circle, Uuid::new_v4(), "uid-1");
        let b = attendee_key(circle, Uuid::new_v4(), "uid-1");
        assert_ne!(a, b);
        assert!(a.ends_with(":uid-1"));
    }
}
