//! Versioned SurrealDB schema for the Musubi collections.
//!
//! All tables are SCHEMAFULL. UUIDs and user ids are stored as strings,
//! enums as strings with ASSERT constraints. Attendance and payment
//! records carry `circle_id`, `event_id` and `uid` so they can be queried
//! across events and circles without joins.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

/// Applied versions are recorded here, one row per migration.
const VERSION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS schema_version SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE schema_version TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE schema_version TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE schema_version TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_schema_version ON TABLE schema_version \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

/// A numbered DDL script. Versions only ever grow.
struct Step {
    version: u32,
    name: &'static str,
    ddl: &'static str,
}

static STEPS: &[Step] = &[Step {
    version: 1,
    name: "circles_events_payments",
    ddl: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- User profiles (global, keyed by auth provider uid)
-- =======================================================================
DEFINE TABLE user_profile SCHEMAFULL;
DEFINE FIELD uid ON TABLE user_profile TYPE string;
DEFINE FIELD email ON TABLE user_profile TYPE string;
DEFINE FIELD display_name ON TABLE user_profile TYPE string;
DEFINE FIELD photo_url ON TABLE user_profile TYPE option<string>;
DEFINE FIELD push_tokens ON TABLE user_profile TYPE array<string> \
    DEFAULT [];
DEFINE FIELD faculty ON TABLE user_profile TYPE option<string>;
DEFINE FIELD grade ON TABLE user_profile TYPE option<string>;
DEFINE FIELD created_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user_profile TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_profile_email ON TABLE user_profile COLUMNS email;

-- =======================================================================
-- Circles
-- =======================================================================
DEFINE TABLE circle SCHEMAFULL;
DEFINE FIELD name ON TABLE circle TYPE string;
DEFINE FIELD emoji ON TABLE circle TYPE string DEFAULT '';
DEFINE FIELD description ON TABLE circle TYPE string DEFAULT '';
DEFINE FIELD created_by ON TABLE circle TYPE string;
DEFINE FIELD created_at ON TABLE circle TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE circle TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Members (circle scope, keyed by circle_id + uid)
-- =======================================================================
DEFINE TABLE member SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE member TYPE string;
DEFINE FIELD uid ON TABLE member TYPE string;
DEFINE FIELD role ON TABLE member TYPE string \
    ASSERT $value IN ['organizer', 'member'];
DEFINE FIELD joined_at ON TABLE member TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD display_name ON TABLE member TYPE string;
DEFINE FIELD email ON TABLE member TYPE string;
DEFINE FIELD photo_url ON TABLE member TYPE option<string>;
DEFINE INDEX idx_member_circle_uid ON TABLE member \
    COLUMNS circle_id, uid UNIQUE;
DEFINE INDEX idx_member_uid ON TABLE member COLUMNS uid;

-- =======================================================================
-- Guests (circle scope, soft-deleted only)
-- =======================================================================
DEFINE TABLE guest SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE guest TYPE string;
DEFINE FIELD name ON TABLE guest TYPE string;
DEFINE FIELD email ON TABLE guest TYPE option<string>;
DEFINE FIELD phone_number ON TABLE guest TYPE option<string>;
DEFINE FIELD notes ON TABLE guest TYPE option<string>;
DEFINE FIELD added_by ON TABLE guest TYPE string;
DEFINE FIELD added_at ON TABLE guest TYPE datetime DEFAULT time::now();
DEFINE FIELD is_active ON TABLE guest TYPE bool DEFAULT true;
DEFINE INDEX idx_guest_circle_active ON TABLE guest \
    COLUMNS circle_id, is_active;

-- =======================================================================
-- Events (circle scope)
-- =======================================================================
DEFINE TABLE event SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE event TYPE string;
DEFINE FIELD name ON TABLE event TYPE string;
DEFINE FIELD description ON TABLE event TYPE string DEFAULT '';
DEFINE FIELD date ON TABLE event TYPE datetime;
DEFINE FIELD location ON TABLE event TYPE string DEFAULT '';
DEFINE FIELD fee ON TABLE event TYPE int ASSERT $value >= 0;
DEFINE FIELD created_by ON TABLE event TYPE string;
DEFINE FIELD created_at ON TABLE event TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE event TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_event_circle_date ON TABLE event COLUMNS circle_id, date;

-- =======================================================================
-- Attendance (event scope, keyed by circle_id + event_id + attendee)
-- =======================================================================
DEFINE TABLE attendance SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE attendance TYPE string;
DEFINE FIELD event_id ON TABLE attendance TYPE string;
DEFINE FIELD attendee_id ON TABLE attendance TYPE string;
DEFINE FIELD is_guest ON TABLE attendance TYPE bool;
DEFINE FIELD uid ON TABLE attendance TYPE option<string>;
DEFINE FIELD guest_id ON TABLE attendance TYPE option<string>;
DEFINE FIELD attended ON TABLE attendance TYPE bool;
DEFINE FIELD checked_in_at ON TABLE attendance TYPE option<datetime>;
DEFINE FIELD checked_in_by ON TABLE attendance TYPE string;
DEFINE FIELD display_name ON TABLE attendance TYPE string;
DEFINE FIELD email ON TABLE attendance TYPE option<string>;
DEFINE FIELD photo_url ON TABLE attendance TYPE option<string>;
DEFINE INDEX idx_attendance_event ON TABLE attendance \
    COLUMNS circle_id, event_id;
DEFINE INDEX idx_attendance_uid ON TABLE attendance COLUMNS uid, attended;

-- =======================================================================
-- Payments (event scope, keyed like attendance)
-- =======================================================================
DEFINE TABLE payment SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE payment TYPE string;
DEFINE FIELD event_id ON TABLE payment TYPE string;
DEFINE FIELD attendee_id ON TABLE payment TYPE string;
DEFINE FIELD is_guest ON TABLE payment TYPE bool;
DEFINE FIELD uid ON TABLE payment TYPE option<string>;
DEFINE FIELD guest_id ON TABLE payment TYPE option<string>;
DEFINE FIELD amount ON TABLE payment TYPE int ASSERT $value >= 0;
DEFINE FIELD status ON TABLE payment TYPE string \
    ASSERT $value IN ['unpaid', 'pending_confirmation', 'confirmed'];
DEFINE FIELD marked_paid_at ON TABLE payment TYPE option<datetime>;
DEFINE FIELD marked_paid_by ON TABLE payment TYPE option<string>;
DEFINE FIELD confirmed_at ON TABLE payment TYPE option<datetime>;
DEFINE FIELD confirmed_by ON TABLE payment TYPE option<string>;
DEFINE FIELD created_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE payment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD display_name ON TABLE payment TYPE string;
DEFINE FIELD email ON TABLE payment TYPE option<string>;
DEFINE INDEX idx_payment_event ON TABLE payment COLUMNS circle_id, event_id;
DEFINE INDEX idx_payment_circle_status ON TABLE payment \
    COLUMNS circle_id, status;
DEFINE INDEX idx_payment_uid ON TABLE payment COLUMNS uid;

-- =======================================================================
-- Notification logs (append-only)
-- =======================================================================
DEFINE TABLE notification_log SCHEMAFULL;
DEFINE FIELD circle_id ON TABLE notification_log TYPE string;
DEFINE FIELD event_id ON TABLE notification_log TYPE string;
DEFINE FIELD recipient_uid ON TABLE notification_log TYPE string;
DEFINE FIELD notification_type ON TABLE notification_log TYPE string \
    ASSERT $value IN ['payment_reminder'];
DEFINE FIELD sent_at ON TABLE notification_log TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD sent_by ON TABLE notification_log TYPE string;
DEFINE FIELD title ON TABLE notification_log TYPE string;
DEFINE FIELD body ON TABLE notification_log TYPE string;
DEFINE FIELD success ON TABLE notification_log TYPE bool;
DEFINE FIELD error ON TABLE notification_log TYPE option<string>;
DEFINE INDEX idx_notification_log_event ON TABLE notification_log \
    COLUMNS circle_id, event_id;
";

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<AppliedVersion> = result.take(0)?;
    Ok(rows.first().map_or(0, |row| row.version))
}

/// Bring the database schema up to the newest version.
///
/// Safe to call on every start: steps already recorded in
/// `schema_version` are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(VERSION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Step> = STEPS.iter().filter(|s| s.version > applied).collect();
    if pending.is_empty() {
        info!(version = applied, "Schema is current");
        return Ok(());
    }

    for step in pending {
        info!(version = step.version, name = step.name, "Applying schema step");
        db.query(step.ddl)
            .await?
            .check()
            .map_err(|e| DbError::Migration(format!("v{} {}: {e}", step.version, step.name)))?;

        db.query("CREATE schema_version SET version = $version, name = $name")
            .bind(("version", step.version))
            .bind(("name", step.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!("recording v{} failed: {e}", step.version))
            })?;
    }

    let current = STEPS.last().map_or(applied, |step| step.version);
    info!(version = current, "Schema migrated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_grow_strictly() {
        assert!(STEPS.windows(2).all(|w| w[0].version < w[1].version));
    }

    #[test]
    fn schema_defines_every_collection() {
        for table in [
            "user_profile",
            "circle",
            "member",
            "guest",
            "event",
            "attendance",
            "payment",
            "notification_log",
        ] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} SCHEMAFULL")),
                "missing table {table}"
            );
        }
    }
}
