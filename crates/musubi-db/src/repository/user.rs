//! SurrealDB implementation of [`UserProfileRepository`].

use chrono::{DateTime, Utc};
use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::user::{UpdateUserProfile, UserProfile, VerifiedIdentity};
use musubi_core::repository::UserProfileRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UserProfileRow {
    uid: String,
    email: String,
    display_name: String,
    photo_url: Option<String>,
    push_tokens: Vec<String>,
    faculty: Option<String>,
    grade: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        UserProfile {
            uid: row.uid,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
            push_tokens: row.push_tokens,
            faculty: row.faculty,
            grade: row.grade,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SurrealDB implementation of the user profile repository.
#[derive(Clone)]
pub struct SurrealUserProfileRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserProfileRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserProfileRepository for SurrealUserProfileRepository<C> {
    async fn upsert_on_sign_in(&self, identity: &VerifiedIdentity) -> MusubiResult<UserProfile> {
        match self.get(&identity.uid).await {
            Ok(_) => {
                self.db
                    .query(
                        "UPDATE type::record('user_profile', $uid) SET \
                         email = $email, updated_at = time::now()",
                    )
                    .bind(("uid", identity.uid.clone()))
                    .bind(("email", identity.email.clone()))
                    .await
                    .map_err(DbError::from)?
                    .check()
                    .map_err(|e| DbError::Query(e.to_string()))?;
            }
            Err(MusubiError::NotFound { .. }) => {
                self.db
                    .query(
                        "CREATE type::record('user_profile', $uid) SET \
                         uid = $uid, email = $email, \
                         display_name = $display_name, \
                         photo_url = $photo_url, push_tokens = []",
                    )
                    .bind(("uid", identity.uid.clone()))
                    .bind(("email", identity.email.clone()))
                    .bind(("display_name", identity.display_name.clone()))
                    .bind(("photo_url", identity.photo_url.clone()))
                    .await
                    .map_err(DbError::from)?
                    .check()
                    .map_err(|e| DbError::Query(e.to_string()))?;
                info!(uid = %identity.uid, "Created user profile");
            }
            Err(e) => return Err(e),
        }

        self.get(&identity.uid).await
    }

    async fn get(&self, uid: &str) -> MusubiResult<UserProfile> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user_profile', $uid)")
            .bind(("uid", uid.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user_profile", uid))?;

        Ok(row.into())
    }

    async fn get_by_email(&self, email: &str) -> MusubiResult<UserProfile> {
        let mut result = self
            .db
            .query("SELECT * FROM user_profile WHERE email = $email LIMIT 1")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserProfileRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("user_profile", format!("email={email}")))?;

        Ok(row.into())
    }

    async fn update_and_propagate(
        &self,
        uid: &str,
        input: UpdateUserProfile,
    ) -> MusubiResult<UserProfile> {
        // Fail with NotFound before opening the transaction.
        self.get(uid).await?;

        let mut profile_sets = Vec::new();
        let mut member_sets = Vec::new();
        if input.display_name.is_some() {
            profile_sets.push("display_name = $display_name");
            member_sets.push("display_name = $display_name");
        }
        if input.photo_url.is_some() {
            profile_sets.push("photo_url = $photo_url");
            member_sets.push("photo_url = $photo_url");
        }
        if input.faculty.is_some() {
            profile_sets.push("faculty = $faculty");
        }
        if input.grade.is_some() {
            profile_sets.push("grade = $grade");
        }
        profile_sets.push("updated_at = time::now()");

        let mut query = String::from("BEGIN TRANSACTION;\n");
        query.push_str(&format!(
            "UPDATE type::record('user_profile', $uid) SET {};\n",
            profile_sets.join(", ")
        ));
        if !member_sets.is_empty() {
            query.push_str(&format!(
                "UPDATE member SET {} WHERE uid = $uid;\n",
                member_sets.join(", ")
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut builder = self.db.query(&query).bind(("uid", uid.to_string()));
        if let Some(display_name) = input.display_name {
            builder = builder.bind(("display_name", display_name));
        }
        if let Some(photo_url) = input.photo_url {
            builder = builder.bind(("photo_url", photo_url));
        }
        if let Some(faculty) = input.faculty {
            builder = builder.bind(("faculty", faculty));
        }
        if let Some(grade) = input.grade {
            builder = builder.bind(("grade", grade));
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(
            uid = %uid,
            propagated = !member_sets.is_empty(),
            "Updated user profile"
        );

        self.get(uid).await
    }

    async fn add_push_token(&self, uid: &str, token: &str) -> MusubiResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('user_profile', $uid) SET \
                 push_tokens = array::union(push_tokens, [$push_token]), \
                 updated_at = time::now()",
            )
            .bind(("uid", uid.to_string()))
            .bind(("push_token", token.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<UserProfileRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("user_profile", uid).into());
        }
        Ok(())
    }

    async fn remove_push_tokens(&self, uid: &str, tokens: &[String]) -> MusubiResult<()> {
        if tokens.is_empty() {
            return Ok(());
        }

        self.db
            .query(
                "UPDATE type::record('user_profile', $uid) SET \
                 push_tokens = array::complement(push_tokens, $tokens), \
                 updated_at = time::now()",
            )
            .bind(("uid", uid.to_string()))
            .bind(("tokens", tokens.to_vec()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(uid = %uid, removed = tokens.len(), "Removed invalid push tokens");
        Ok(())
    }
}
