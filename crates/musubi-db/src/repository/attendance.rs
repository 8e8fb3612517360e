//! SurrealDB implementation of [`AttendanceRepository`].
//!
//! A recording is committed as one SurrealQL transaction: every
//! attendance document and every derived payment document of the batch
//! is upserted with `CONTENT`, which replaces the stored document
//! wholesale. If any statement fails the transaction is cancelled and
//! nothing becomes visible.

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::attendance::{AttendanceBatch, AttendanceRecord, AttendeeId};
use musubi_core::repository::AttendanceRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::{CountRow, attendee_key, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AttendanceRow {
    circle_id: String,
    event_id: String,
    attendee_id: String,
    is_guest: bool,
    attended: bool,
    checked_in_at: Option<DateTime<Utc>>,
    checked_in_by: String,
    display_name: String,
    email: Option<String>,
    photo_url: Option<String>,
}

impl AttendanceRow {
    fn try_into_record(self) -> Result<AttendanceRecord, DbError> {
        Ok(AttendanceRecord {
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            event_id: parse_uuid("event_id", &self.event_id)?,
            attendee: AttendeeId::from_parts(self.is_guest, &self.attendee_id)
                .map_err(DbError::InvalidRecord)?,
            attended: self.attended,
            checked_in_at: self.checked_in_at,
            checked_in_by: self.checked_in_by,
            display_name: self.display_name,
            email: self.email,
            photo_url: self.photo_url,
        })
    }
}

/// SurrealDB implementation of the Attendance repository.
#[derive(Clone)]
pub struct SurrealAttendanceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAttendanceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// Build the transaction text for a batch. Values are bound separately
/// under `$a{i}_*` (attendance) and `$p{i}_*` (payment) names.
fn batch_query(batch: &AttendanceBatch) -> String {
    let mut query = String::from("BEGIN TRANSACTION;\nLET $now = time::now();\n");

    for (i, input) in batch.attendance.iter().enumerate() {
        let checked_in_at = if input.attended { "$now" } else { "NONE" };
        query.push_str(&format!(
            "UPSERT type::record('attendance', $a{i}_key) CONTENT {{ \
             circle_id: $circle_id, event_id: $event_id, \
             attendee_id: $a{i}_attendee, is_guest: $a{i}_is_guest, \
             uid: $a{i}_uid, guest_id: $a{i}_guest_id, \
             attended: $a{i}_attended, checked_in_at: {checked_in_at}, \
             checked_in_by: $checked_in_by, \
             display_name: $a{i}_display_name, email: $a{i}_email, \
             photo_url: $a{i}_photo_url }};\n"
        ));
    }

    for i in 0..batch.payments.len() {
        query.push_str(&format!(
            "UPSERT type::record('payment', $p{i}_key) CONTENT {{ \
             circle_id: $circle_id, event_id: $event_id, \
             attendee_id: $p{i}_attendee, is_guest: $p{i}_is_guest, \
             uid: $p{i}_uid, guest_id: $p{i}_guest_id, \
             amount: $p{i}_amount, status: 'unpaid', \
             marked_paid_at: NONE, marked_paid_by: NONE, \
             confirmed_at: NONE, confirmed_by: NONE, \
             created_at: $now, updated_at: $now, \
             display_name: $p{i}_display_name, email: $p{i}_email }};\n"
        ));
    }

    query.push_str("COMMIT TRANSACTION;");
    query
}

impl<C: Connection> AttendanceRepository for SurrealAttendanceRepository<C> {
    async fn get(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &str,
    ) -> MusubiResult<Option<AttendanceRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('attendance', $key)")
            .bind(("key", attendee_key(circle_id, event_id, attendee)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> MusubiResult<Vec<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM attendance \
                 WHERE circle_id = $circle_id AND event_id = $event_id \
                 ORDER BY display_name ASC",
            )
            .bind(("circle_id", circle_id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let records = rows
            .into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }

    async fn count_attended(&self, circle_id: Uuid, event_id: Uuid) -> MusubiResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM attendance \
                 WHERE circle_id = $circle_id AND event_id = $event_id \
                 AND attended = true GROUP ALL",
            )
            .bind(("circle_id", circle_id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn commit_batch(&self, batch: AttendanceBatch) -> MusubiResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let query = batch_query(&batch);
        let circle_id = batch.circle_id;
        let event_id = batch.event_id;
        let attendance_count = batch.attendance.len();
        let payment_count = batch.payments.len();

        let mut builder = self
            .db
            .query(&query)
            .bind(("circle_id", circle_id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .bind(("checked_in_by", batch.checked_in_by));

        for (i, input) in batch.attendance.into_iter().enumerate() {
            let key = input.attendee.key();
            builder = builder
                .bind((format!("a{i}_key"), attendee_key(circle_id, event_id, &key)))
                .bind((format!("a{i}_attendee"), key))
                .bind((format!("a{i}_is_guest"), input.attendee.is_guest()))
                .bind((
                    format!("a{i}_uid"),
                    input.attendee.uid().map(str::to_string),
                ))
                .bind((
                    format!("a{i}_guest_id"),
                    input.attendee.guest_id().map(|id| id.to_string()),
                ))
                .bind((format!("a{i}_attended"), input.attended))
                .bind((format!("a{i}_display_name"), input.display_name))
                .bind((format!("a{i}_email"), input.email))
                .bind((format!("a{i}_photo_url"), input.photo_url));
        }

        for (i, payment) in batch.payments.into_iter().enumerate() {
            let key = payment.attendee.key();
            builder = builder
                .bind((format!("p{i}_key"), attendee_key(circle_id, event_id, &key)))
                .bind((format!("p{i}_attendee"), key))
                .bind((format!("p{i}_is_guest"), payment.attendee.is_guest()))
                .bind((
                    format!("p{i}_uid"),
                    payment.attendee.uid().map(str::to_string),
                ))
                .bind((
                    format!("p{i}_guest_id"),
                    payment.attendee.guest_id().map(|id| id.to_string()),
                ))
                .bind((format!("p{i}_amount"), payment.amount))
                .bind((format!("p{i}_display_name"), payment.display_name))
                .bind((format!("p{i}_email"), payment.email));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(
            %circle_id,
            %event_id,
            attendance = attendance_count,
            payments = payment_count,
            "Committed attendance batch"
        );

        Ok(())
    }

    async fn list_attended_by_user(&self, uid: &str) -> MusubiResult<Vec<AttendanceRecord>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM attendance \
                 WHERE uid = $uid AND attended = true \
                 ORDER BY checked_in_at DESC",
            )
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AttendanceRow> = result.take(0).map_err(DbError::from)?;
        let records = rows
            .into_iter()
            .map(|row| row.try_into_record())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(records)
    }
}
