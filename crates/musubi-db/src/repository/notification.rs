//! SurrealDB implementation of [`NotificationLogRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::notification::{
    CreateNotificationLog, NotificationLog, NotificationType,
};
use musubi_core::repository::NotificationLogRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct NotificationLogRow {
    record_id: String,
    circle_id: String,
    event_id: String,
    recipient_uid: String,
    notification_type: String,
    sent_at: DateTime<Utc>,
    sent_by: String,
    title: String,
    body: String,
    success: bool,
    error: Option<String>,
}

impl NotificationLogRow {
    fn try_into_log(self) -> Result<NotificationLog, DbError> {
        let notification_type = NotificationType::parse(&self.notification_type)
            .ok_or_else(|| {
                DbError::InvalidRecord(format!(
                    "unknown notification type: {}",
                    self.notification_type
                ))
            })?;
        Ok(NotificationLog {
            id: parse_uuid("notification_log id", &self.record_id)?,
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            event_id: parse_uuid("event_id", &self.event_id)?,
            recipient_uid: self.recipient_uid,
            notification_type,
            sent_at: self.sent_at,
            sent_by: self.sent_by,
            title: self.title,
            body: self.body,
            success: self.success,
            error: self.error,
        })
    }
}

/// SurrealDB implementation of the notification log.
#[derive(Clone)]
pub struct SurrealNotificationLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNotificationLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> NotificationLogRepository for SurrealNotificationLogRepository<C> {
    async fn append(&self, input: CreateNotificationLog) -> MusubiResult<NotificationLog> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('notification_log', $id) SET \
                 circle_id = $circle_id, event_id = $event_id, \
                 recipient_uid = $recipient_uid, \
                 notification_type = $notification_type, \
                 sent_by = $sent_by, title = $title, body = $body, \
                 success = $success, error = $error;
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('notification_log', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", input.circle_id.to_string()))
            .bind(("event_id", input.event_id.to_string()))
            .bind(("recipient_uid", input.recipient_uid))
            .bind(("notification_type", input.notification_type.as_str()))
            .bind(("sent_by", input.sent_by))
            .bind(("title", input.title))
            .bind(("body", input.body))
            .bind(("success", input.success))
            .bind(("error", input.error))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<NotificationLogRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("notification_log", id_str))?;

        Ok(row.try_into_log()?)
    }

    async fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> MusubiResult<Vec<NotificationLog>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM notification_log \
                 WHERE circle_id = $circle_id AND event_id = $event_id \
                 ORDER BY sent_at DESC",
            )
            .bind(("circle_id", circle_id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NotificationLogRow> = result.take(0).map_err(DbError::from)?;
        let logs = rows
            .into_iter()
            .map(|row| row.try_into_log())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(logs)
    }
}
