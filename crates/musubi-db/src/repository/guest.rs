//! SurrealDB implementation of [`GuestRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::guest::{CreateGuest, Guest, UpdateGuest};
use musubi_core::repository::GuestRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GuestRow {
    circle_id: String,
    name: String,
    email: Option<String>,
    phone_number: Option<String>,
    notes: Option<String>,
    added_by: String,
    added_at: DateTime<Utc>,
    is_active: bool,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct GuestRowWithId {
    record_id: String,
    circle_id: String,
    name: String,
    email: Option<String>,
    phone_number: Option<String>,
    notes: Option<String>,
    added_by: String,
    added_at: DateTime<Utc>,
    is_active: bool,
}

impl GuestRow {
    fn try_into_guest(self, id: Uuid) -> Result<Guest, DbError> {
        Ok(Guest {
            id,
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            notes: self.notes,
            added_by: self.added_by,
            added_at: self.added_at,
            is_active: self.is_active,
        })
    }
}

impl GuestRowWithId {
    fn try_into_guest(self) -> Result<Guest, DbError> {
        Ok(Guest {
            id: parse_uuid("guest id", &self.record_id)?,
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            notes: self.notes,
            added_by: self.added_by,
            added_at: self.added_at,
            is_active: self.is_active,
        })
    }
}

/// SurrealDB implementation of the Guest repository.
#[derive(Clone)]
pub struct SurrealGuestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGuestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GuestRepository for SurrealGuestRepository<C> {
    async fn create(&self, input: CreateGuest) -> MusubiResult<Guest> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "CREATE type::record('guest', $id) SET \
                 circle_id = $circle_id, name = $name, email = $email, \
                 phone_number = $phone_number, notes = $notes, \
                 added_by = $added_by, is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", input.circle_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone_number", input.phone_number))
            .bind(("notes", input.notes))
            .bind(("added_by", input.added_by))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("guest", id_str))?;

        Ok(row.try_into_guest(id)?)
    }

    async fn get(&self, circle_id: Uuid, id: Uuid) -> MusubiResult<Guest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('guest', $id) \
                 WHERE circle_id = $circle_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("guest", id_str))?;

        Ok(row.try_into_guest(id)?)
    }

    async fn update(&self, circle_id: Uuid, id: Uuid, input: UpdateGuest) -> MusubiResult<Guest> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone_number.is_some() {
            sets.push("phone_number = $phone_number");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if sets.is_empty() {
            return self.get(circle_id, id).await;
        }

        let query = format!(
            "UPDATE type::record('guest', $id) SET {} \
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
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone_number) = input.phone_number {
            builder = builder.bind(("phone_number", phone_number));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("guest", id_str))?;

        Ok(row.try_into_guest(id)?)
    }

    async fn deactivate(&self, circle_id: Uuid, id: Uuid) -> MusubiResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('guest', $id) SET is_active = false \
                 WHERE circle_id = $circle_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<GuestRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("guest", id_str).into());
        }
        Ok(())
    }

    async fn list_active(&self, circle_id: Uuid) -> MusubiResult<Vec<Guest>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM guest \
                 WHERE circle_id = $circle_id AND is_active = true \
                 ORDER BY added_at ASC",
            )
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GuestRowWithId> = result.take(0).map_err(DbError::from)?;
        let guests = rows
            .into_iter()
            .map(|row| row.try_into_guest())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(guests)
    }
}
