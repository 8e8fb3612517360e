//! SurrealDB implementation of [`MemberRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::member::{CircleMember, CircleRole, CreateMember};
use musubi_core::repository::MemberRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, member_key, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct MemberRow {
    circle_id: String,
    uid: String,
    role: String,
    joined_at: DateTime<Utc>,
    display_name: String,
    email: String,
    photo_url: Option<String>,
}

#[derive(Debug, SurrealValue)]
struct RoleRow {
    role: String,
}

#[derive(Debug, SurrealValue)]
struct CircleIdRow {
    circle_id: String,
}

fn parse_role(s: &str) -> Result<CircleRole, DbError> {
    s.parse().map_err(DbError::InvalidRecord)
}

impl MemberRow {
    fn try_into_member(self) -> Result<CircleMember, DbError> {
        Ok(CircleMember {
            circle_id: parse_uuid("circle_id", &self.circle_id)?,
            uid: self.uid,
            role: parse_role(&self.role)?,
            joined_at: self.joined_at,
            display_name: self.display_name,
            email: self.email,
            photo_url: self.photo_url,
        })
    }
}

/// SurrealDB implementation of the Member repository.
#[derive(Clone)]
pub struct SurrealMemberRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMemberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MemberRepository for SurrealMemberRepository<C> {
    async fn add(&self, input: CreateMember) -> MusubiResult<CircleMember> {
        let key = member_key(input.circle_id, &input.uid);

        let mut result = self
            .db
            .query(
                "CREATE type::record('member', $key) SET \
                 circle_id = $circle_id, uid = $uid, role = $role, \
                 display_name = $display_name, email = $email, \
                 photo_url = $photo_url",
            )
            .bind(("key", key.clone()))
            .bind(("circle_id", input.circle_id.to_string()))
            .bind(("uid", input.uid))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("display_name", input.display_name))
            .bind(("email", input.email))
            .bind(("photo_url", input.photo_url))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("member", key))?;

        Ok(row.try_into_member()?)
    }

    async fn get(&self, circle_id: Uuid, uid: &str) -> MusubiResult<CircleMember> {
        let key = member_key(circle_id, uid);

        let mut result = self
            .db
            .query("SELECT * FROM type::record('member', $key)")
            .bind(("key", key.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("member", key))?;

        Ok(row.try_into_member()?)
    }

    async fn find_role(&self, circle_id: Uuid, uid: &str) -> MusubiResult<Option<CircleRole>> {
        let mut result = self
            .db
            .query("SELECT role FROM type::record('member', $key)")
            .bind(("key", member_key(circle_id, uid)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let role = rows
            .into_iter()
            .next()
            .map(|r| parse_role(&r.role))
            .transpose()?;

        debug!(circle_id = %circle_id, uid = %uid, role = ?role, "Resolved circle role");
        Ok(role)
    }

    async fn set_role(
        &self,
        circle_id: Uuid,
        uid: &str,
        role: CircleRole,
    ) -> MusubiResult<CircleMember> {
        let key = member_key(circle_id, uid);

        let mut result = self
            .db
            .query("UPDATE type::record('member', $key) SET role = $role")
            .bind(("key", key.clone()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("member", key))?;

        Ok(row.try_into_member()?)
    }

    async fn remove(&self, circle_id: Uuid, uid: &str) -> MusubiResult<()> {
        self.db
            .query("DELETE type::record('member', $key)")
            .bind(("key", member_key(circle_id, uid)))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, circle_id: Uuid) -> MusubiResult<Vec<CircleMember>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM member WHERE circle_id = $circle_id \
                 ORDER BY joined_at ASC",
            )
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let members = rows
            .into_iter()
            .map(|row| row.try_into_member())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(members)
    }

    async fn count(&self, circle_id: Uuid) -> MusubiResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member \
                 WHERE circle_id = $circle_id GROUP ALL",
            )
            .bind(("circle_id", circle_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_with_role(&self, circle_id: Uuid, role: CircleRole) -> MusubiResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member \
                 WHERE circle_id = $circle_id AND role = $role GROUP ALL",
            )
            .bind(("circle_id", circle_id.to_string()))
            .bind(("role", role.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn circle_ids_for_user(&self, uid: &str) -> MusubiResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query("SELECT circle_id FROM member WHERE uid = $uid")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CircleIdRow> = result.take(0).map_err(DbError::from)?;
        let ids = rows
            .iter()
            .map(|row| parse_uuid("circle_id", &row.circle_id))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(ids)
    }
}
