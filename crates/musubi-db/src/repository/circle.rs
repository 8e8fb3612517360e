//! SurrealDB implementation of [`CircleRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::circle::{Circle, CreateCircle, UpdateCircle};
use musubi_core::models::user::VerifiedIdentity;
use musubi_core::repository::CircleRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::member_key;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct CircleRow {
    name: String,
    emoji: String,
    description: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CircleRow {
    fn into_circle(self, id: Uuid) -> Circle {
        Circle {
            id,
            name: self.name,
            emoji: self.emoji,
            description: self.description,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// SurrealDB implementation of the Circle repository.
#[derive(Clone)]
pub struct SurrealCircleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCircleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CircleRepository for SurrealCircleRepository<C> {
    async fn create(&self, input: CreateCircle, founder: &VerifiedIdentity) -> MusubiResult<Circle> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // The circle and its founding organizer land together or not at
        // all, so a circle can never exist without an organizer.
        self.db
            .query(
                "BEGIN TRANSACTION;
                 CREATE type::record('circle', $id) SET \
                     name = $name, emoji = $emoji, \
                     description = $description, created_by = $uid;
                 CREATE type::record('member', $member_key) SET \
                     circle_id = $id, uid = $uid, role = 'organizer', \
                     display_name = $display_name, email = $email, \
                     photo_url = $photo_url;
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str.clone()))
            .bind(("member_key", member_key(id, &founder.uid)))
            .bind(("name", input.name))
            .bind(("emoji", input.emoji))
            .bind(("description", input.description))
            .bind(("uid", founder.uid.clone()))
            .bind(("display_name", founder.display_name.clone()))
            .bind(("email", founder.email.clone()))
            .bind(("photo_url", founder.photo_url.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(circle_id = %id, founder = %founder.uid, "Created circle");

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> MusubiResult<Circle> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('circle', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CircleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("circle", id_str))?;

        Ok(row.into_circle(id))
    }

    async fn update(&self, id: Uuid, input: UpdateCircle) -> MusubiResult<Circle> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.emoji.is_some() {
            sets.push("emoji = $emoji");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('circle', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(emoji) = input.emoji {
            builder = builder.bind(("emoji", emoji));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let mut result = builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<CircleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("circle", id_str))?;

        Ok(row.into_circle(id))
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> MusubiResult<Vec<Circle>> {
        let mut circles = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_by_id(*id).await {
                Ok(circle) => circles.push(circle),
                Err(MusubiError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        circles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(circles)
    }
}
