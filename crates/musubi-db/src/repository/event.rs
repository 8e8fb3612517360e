//! SurrealDB implementation of [`EventRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::event::{CreateEvent, Event, UpdateEvent};
use musubi_core::repository::EventRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct EventRow {
    circle_id: String,
    name: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    fee: u64,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct EventRowWithId {
    record_id: String,
    circle_id: String,
    name: String,
    description: String,
    date: DateTime<Utc>,
    location: String,
    fee: u64,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRow {
    fn try_into_event(self, id: Uuid) -> Result<Event, DbError> {
        Ok(Event {
            id,
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            name: self.name,
            description: self.description,
            date: self.date,
            location: self.location,
            fee: self.fee,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl EventRowWithId {
    fn try_into_event(self) -> Result<Event, DbError> {
        Ok(Event {
            id: parse_uuid("event id", &self.record_id)?,
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            name: self.name,
            description: self.description,
            date: self.date,
            location: self.location,
            fee: self.fee,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Event repository.
#[derive(Clone)]
pub struct SurrealEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> EventRepository for SurrealEventRepository<C> {
    async fn create(&self, input: CreateEvent) -> MusubiResult<Event> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('event', $id) SET \
                 circle_id = $circle_id, name = $name, \
                 description = $description, date = $date, \
                 location = $location, fee = $fee, created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", input.circle_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("date", input.date))
            .bind(("location", input.location))
            .bind(("fee", input.fee))
            .bind(("created_by", input.created_by))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("event", id_str))?;

        Ok(row.try_into_event(id)?)
    }

    async fn get(&self, circle_id: Uuid, id: Uuid) -> MusubiResult<Event> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('event', $id) \
                 WHERE circle_id = $circle_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("event", id_str))?;

        Ok(row.try_into_event(id)?)
    }

    async fn update(&self, circle_id: Uuid, id: Uuid, input: UpdateEvent) -> MusubiResult<Event> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.date.is_some() {
            sets.push("date = $date");
        }
        if input.location.is_some() {
            sets.push("location = $location");
        }
        if input.fee.is_some() {
            sets.push("fee = $fee");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('event', $id) SET {} \
             WHERE circle_id = $circle_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("circle_id", circle_id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(date) = input.date {
            builder = builder.bind(("date", date));
        }
        if let Some(location) = input.location {
            builder = builder.bind(("location", location));
        }
        if let Some(fee) = input.fee {
            builder = builder.bind(("fee", fee));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("event", id_str))?;

        Ok(row.try_into_event(id)?)
    }

    async fn list(&self, circle_id: Uuid, limit: Option<u64>) -> MusubiResult<Vec<Event>> {
        let query = match limit {
            Some(_) => {
                "SELECT meta::id(id) AS record_id, * FROM event \
                 WHERE circle_id = $circle_id \
                 ORDER BY date DESC LIMIT $limit"
            }
            None => {
                "SELECT meta::id(id) AS record_id, * FROM event \
                 WHERE circle_id = $circle_id \
                 ORDER BY date DESC"
            }
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("circle_id", circle_id.to_string()));
        if let Some(limit) = limit {
            builder = builder.bind(("limit", limit));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<EventRowWithId> = result.take(0).map_err(DbError::from)?;
        let events = rows
            .into_iter()
            .map(|row| row.try_into_event())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(events)
    }

    async fn count(&self, circle_id: Uuid) -> MusubiResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM event \
                 WHERE circle_id = $circle_id GROUP ALL",
            )
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
