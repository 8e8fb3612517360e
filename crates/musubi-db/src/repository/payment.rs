//! SurrealDB implementation of [`PaymentRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::attendance::AttendeeId;
use musubi_core::models::payment::{
    PaymentAction, PaymentRecord, PaymentStatus, PaymentTransition,
};
use musubi_core::repository::PaymentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{attendee_key, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PaymentRow {
    circle_id: String,
    event_id: String,
    attendee_id: String,
    is_guest: bool,
    amount: u64,
    status: String,
    marked_paid_at: Option<DateTime<Utc>>,
    marked_paid_by: Option<String>,
    confirmed_at: Option<DateTime<Utc>>,
    confirmed_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    display_name: String,
    email: Option<String>,
}

impl PaymentRow {
    fn try_into_record(self) -> Result<PaymentRecord, DbError> {
        Ok(PaymentRecord {
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            event_id: parse_uuid("event_id", &self.event_id)?,
            attendee: AttendeeId::from_parts(self.is_guest, &self.attendee_id)
                .map_err(DbError::InvalidRecord)?,
            amount: self.amount,
            status: self
                .status
                .parse::<PaymentStatus>()
                .map_err(DbError::InvalidRecord)?,
            marked_paid_at: self.marked_paid_at,
            marked_paid_by: self.marked_paid_by,
            confirmed_at: self.confirmed_at,
            confirmed_by: self.confirmed_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
            display_name: self.display_name,
            email: self.email,
        })
    }
}

fn into_records(rows: Vec<PaymentRow>) -> Result<Vec<PaymentRecord>, DbError> {
    rows.into_iter().map(|row| row.try_into_record()).collect()
}

/// SET clause for each transition. `$actor` is bound for the actions
/// that record who acted.
fn transition_sets(action: PaymentAction) -> &'static str {
    match action {
        PaymentAction::MarkPaid => {
            "status = 'pending_confirmation', marked_paid_at = time::now(), \
             marked_paid_by = $actor, updated_at = time::now()"
        }
        PaymentAction::Confirm => {
            "status = 'confirmed', confirmed_at = time::now(), \
             confirmed_by = $actor, updated_at = time::now()"
        }
        PaymentAction::Reset => {
            "status = 'unpaid', marked_paid_at = NONE, marked_paid_by = NONE, \
             confirmed_at = NONE, confirmed_by = NONE, updated_at = time::now()"
        }
    }
}

/// SurrealDB implementation of the Payment repository.
#[derive(Clone)]
pub struct SurrealPaymentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPaymentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PaymentRepository for SurrealPaymentRepository<C> {
    async fn get(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &str,
    ) -> MusubiResult<PaymentRecord> {
        let key = attendee_key(circle_id, event_id, attendee);

        let mut result = self
            .db
            .query("SELECT * FROM type::record('payment', $key)")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("payment", key))?;

        Ok(row.try_into_record()?)
    }

    async fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> MusubiResult<Vec<PaymentRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM payment \
                 WHERE circle_id = $circle_id AND event_id = $event_id \
                 ORDER BY display_name ASC",
            )
            .bind(("circle_id", circle_id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_records(rows)?)
    }

    async fn list_by_status(
        &self,
        circle_id: Uuid,
        event_id: Option<Uuid>,
        status: PaymentStatus,
    ) -> MusubiResult<Vec<PaymentRecord>> {
        let query = match event_id {
            Some(_) => {
                "SELECT * FROM payment \
                 WHERE circle_id = $circle_id AND event_id = $event_id \
                 AND status = $status ORDER BY created_at ASC"
            }
            None => {
                "SELECT * FROM payment \
                 WHERE circle_id = $circle_id AND status = $status \
                 ORDER BY created_at ASC"
            }
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("circle_id", circle_id.to_string()))
            .bind(("status", status.as_str()));
        if let Some(event_id) = event_id {
            builder = builder.bind(("event_id", event_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_records(rows)?)
    }

    async fn transition(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &str,
        transition: PaymentTransition,
    ) -> MusubiResult<Option<PaymentRecord>> {
        let key = attendee_key(circle_id, event_id, attendee);
        let allowed: Vec<String> = transition
            .action
            .allowed_from()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        // The status guard lives in the WHERE clause so a concurrent
        // transition cannot be overwritten by a stale read.
        let query = format!(
            "UPDATE type::record('payment', $key) SET {} \
             WHERE status IN $allowed",
            transition_sets(transition.action)
        );

        let mut result = self
            .db
            .query(&query)
            .bind(("key", key.clone()))
            .bind(("allowed", allowed))
            .bind(("actor", transition.actor.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let record = row.try_into_record()?;

        info!(
            payment = %key,
            status = %record.status,
            actor = %transition.actor,
            "Payment status changed"
        );

        Ok(Some(record))
    }

    async fn list_by_user(&self, uid: &str) -> MusubiResult<Vec<PaymentRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM payment WHERE uid = $uid \
                 ORDER BY created_at DESC",
            )
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PaymentRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_records(rows)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_all_attestation_fields() {
        let sets = transition_sets(PaymentAction::Reset);
        for field in [
            "marked_paid_at = NONE",
            "marked_paid_by = NONE",
            "confirmed_at = NONE",
            "confirmed_by = NONE",
        ] {
            assert!(sets.contains(field), "missing {field}");
        }
    }

    #[test]
    fn confirm_leaves_member_attestation_alone() {
        let sets = transition_sets(PaymentAction::Confirm);
        assert!(!sets.contains("marked_paid"));
    }
}
