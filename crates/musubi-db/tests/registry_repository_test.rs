//! Integration tests for the profile, circle, member, guest and event
//! repositories using in-memory SurrealDB.

use chrono::{Duration, Utc};
use musubi_core::error::MusubiError;
use musubi_core::models::circle::{CreateCircle, UpdateCircle};
use musubi_core::models::event::{CreateEvent, UpdateEvent};
use musubi_core::models::guest::{CreateGuest, UpdateGuest};
use musubi_core::models::member::{CircleRole, CreateMember};
use musubi_core::models::user::{UpdateUserProfile, VerifiedIdentity};
use musubi_core::repository::{
    CircleRepository, EventRepository, GuestRepository, MemberRepository, UserProfileRepository,
};
use musubi_db::repository::{
    SurrealCircleRepository, SurrealEventRepository, SurrealGuestRepository,
    SurrealMemberRepository, SurrealUserProfileRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    musubi_db::run_migrations(&db).await.unwrap();
    db
}

fn identity(uid: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: uid.into(),
        email: format!("{uid}@example.com"),
        display_name: format!("User {uid}"),
        photo_url: None,
    }
}

fn member_input(circle_id: Uuid, uid: &str, role: CircleRole) -> CreateMember {
    CreateMember {
        circle_id,
        uid: uid.into(),
        role,
        display_name: format!("User {uid}"),
        email: format!("{uid}@example.com"),
        photo_url: None,
    }
}

async fn create_circle(db: &Surreal<surrealdb::engine::local::Db>, founder: &str) -> Uuid {
    let circles = SurrealCircleRepository::new(db.clone());
    circles
        .create(
            CreateCircle {
                name: "Tennis".into(),
                emoji: "🎾".into(),
                description: String::new(),
            },
            &identity(founder),
        )
        .await
        .unwrap()
        .id
}

// -----------------------------------------------------------------------
// User profiles
// -----------------------------------------------------------------------

#[tokio::test]
async fn sign_in_creates_then_refreshes_profile() {
    let db = setup().await;
    let repo = SurrealUserProfileRepository::new(db);

    let created = repo.upsert_on_sign_in(&identity("u1")).await.unwrap();
    assert_eq!(created.email, "u1@example.com");
    assert!(created.push_tokens.is_empty());

    let mut changed = identity("u1");
    changed.email = "new@example.com".into();
    let refreshed = repo.upsert_on_sign_in(&changed).await.unwrap();
    assert_eq!(refreshed.email, "new@example.com");
    assert_eq!(refreshed.display_name, created.display_name);

    let by_email = repo.get_by_email("new@example.com").await.unwrap();
    assert_eq!(by_email.uid, "u1");
}

#[tokio::test]
async fn push_tokens_are_a_set() {
    let db = setup().await;
    let repo = SurrealUserProfileRepository::new(db);
    repo.upsert_on_sign_in(&identity("u1")).await.unwrap();

    repo.add_push_token("u1", "tok-a").await.unwrap();
    repo.add_push_token("u1", "tok-a").await.unwrap();
    repo.add_push_token("u1", "tok-b").await.unwrap();
    let profile = repo.get("u1").await.unwrap();
    assert_eq!(profile.push_tokens.len(), 2);

    repo.remove_push_tokens("u1", &["tok-a".to_string()])
        .await
        .unwrap();
    let profile = repo.get("u1").await.unwrap();
    assert_eq!(profile.push_tokens, vec!["tok-b".to_string()]);
}

#[tokio::test]
async fn push_token_for_unknown_user_is_not_found() {
    let db = setup().await;
    let repo = SurrealUserProfileRepository::new(db);

    let err = repo.add_push_token("ghost", "tok").await.unwrap_err();
    assert!(matches!(err, MusubiError::NotFound { .. }));
}

#[tokio::test]
async fn profile_update_propagates_to_memberships() {
    let db = setup().await;
    let profiles = SurrealUserProfileRepository::new(db.clone());
    let members = SurrealMemberRepository::new(db.clone());

    profiles.upsert_on_sign_in(&identity("u1")).await.unwrap();
    let first = create_circle(&db, "u1").await;
    let second = create_circle(&db, "u1").await;

    let updated = profiles
        .update_and_propagate(
            "u1",
            UpdateUserProfile {
                display_name: Some("Renamed".into()),
                photo_url: Some(Some("https://img/1.png".into())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.display_name, "Renamed");

    for circle_id in [first, second] {
        let member = members.get(circle_id, "u1").await.unwrap();
        assert_eq!(member.display_name, "Renamed");
        assert_eq!(member.photo_url.as_deref(), Some("https://img/1.png"));
    }
}

// -----------------------------------------------------------------------
// Circles and members
// -----------------------------------------------------------------------

#[tokio::test]
async fn creating_a_circle_makes_founder_organizer() {
    let db = setup().await;
    let circles = SurrealCircleRepository::new(db.clone());
    let members = SurrealMemberRepository::new(db.clone());

    let circle_id = create_circle(&db, "founder").await;
    let circle = circles.get_by_id(circle_id).await.unwrap();
    assert_eq!(circle.created_by, "founder");

    let role = members.find_role(circle_id, "founder").await.unwrap();
    assert_eq!(role, Some(CircleRole::Organizer));
    assert_eq!(members.count(circle_id).await.unwrap(), 1);
}

#[tokio::test]
async fn update_circle_changes_only_given_fields() {
    let db = setup().await;
    let circles = SurrealCircleRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    let updated = circles
        .update(
            circle_id,
            UpdateCircle {
                description: Some("Weekly doubles".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Tennis");
    assert_eq!(updated.description, "Weekly doubles");
}

#[tokio::test]
async fn missing_circle_is_not_found() {
    let db = setup().await;
    let circles = SurrealCircleRepository::new(db);

    let err = circles.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, MusubiError::NotFound { .. }));
}

#[tokio::test]
async fn membership_lookup_spans_circles() {
    let db = setup().await;
    let circles = SurrealCircleRepository::new(db.clone());
    let members = SurrealMemberRepository::new(db.clone());

    let first = create_circle(&db, "founder").await;
    let second = create_circle(&db, "other").await;
    members
        .add(member_input(second, "founder", CircleRole::Member))
        .await
        .unwrap();

    let mut ids = members.circle_ids_for_user("founder").await.unwrap();
    ids.sort();
    let mut expected = vec![first, second];
    expected.sort();
    assert_eq!(ids, expected);

    let listed = circles.list_by_ids(&[first, Uuid::new_v4()]).await.unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn roles_can_change_and_members_can_leave() {
    let db = setup().await;
    let members = SurrealMemberRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    members
        .add(member_input(circle_id, "m1", CircleRole::Member))
        .await
        .unwrap();
    assert_eq!(
        members
            .count_with_role(circle_id, CircleRole::Organizer)
            .await
            .unwrap(),
        1
    );

    let promoted = members
        .set_role(circle_id, "m1", CircleRole::Organizer)
        .await
        .unwrap();
    assert!(promoted.is_organizer());
    assert_eq!(
        members
            .count_with_role(circle_id, CircleRole::Organizer)
            .await
            .unwrap(),
        2
    );

    members.remove(circle_id, "m1").await.unwrap();
    assert_eq!(members.find_role(circle_id, "m1").await.unwrap(), None);
    assert_eq!(members.list(circle_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_member_has_no_role() {
    let db = setup().await;
    let members = SurrealMemberRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    assert_eq!(members.find_role(circle_id, "stranger").await.unwrap(), None);
    let err = members.get(circle_id, "stranger").await.unwrap_err();
    assert!(matches!(err, MusubiError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Guests
// -----------------------------------------------------------------------

#[tokio::test]
async fn deactivated_guests_drop_out_of_active_list() {
    let db = setup().await;
    let guests = SurrealGuestRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    let kept = guests
        .create(CreateGuest {
            circle_id,
            name: "Kept".into(),
            email: None,
            phone_number: None,
            notes: None,
            added_by: "founder".into(),
        })
        .await
        .unwrap();
    let gone = guests
        .create(CreateGuest {
            circle_id,
            name: "Gone".into(),
            email: Some("gone@example.com".into()),
            phone_number: None,
            notes: None,
            added_by: "founder".into(),
        })
        .await
        .unwrap();
    assert!(gone.is_active);

    guests.deactivate(circle_id, gone.id).await.unwrap();

    let active = guests.list_active(circle_id).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, kept.id);

    // Soft-deleted guests are still readable.
    let fetched = guests.get(circle_id, gone.id).await.unwrap();
    assert!(!fetched.is_active);
}

#[tokio::test]
async fn guest_update_and_scope() {
    let db = setup().await;
    let guests = SurrealGuestRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    let guest = guests
        .create(CreateGuest {
            circle_id,
            name: "Visitor".into(),
            email: None,
            phone_number: None,
            notes: None,
            added_by: "founder".into(),
        })
        .await
        .unwrap();

    let updated = guests
        .update(
            circle_id,
            guest.id,
            UpdateGuest {
                notes: Some("plays left-handed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Visitor");
    assert_eq!(updated.notes.as_deref(), Some("plays left-handed"));

    let err = guests.get(Uuid::new_v4(), guest.id).await.unwrap_err();
    assert!(matches!(err, MusubiError::NotFound { .. }));
}

// -----------------------------------------------------------------------
// Events
// -----------------------------------------------------------------------

fn event_input(circle_id: Uuid, name: &str, days_ago: i64) -> CreateEvent {
    CreateEvent {
        circle_id,
        name: name.into(),
        description: String::new(),
        date: Utc::now() - Duration::days(days_ago),
        location: "Court 3".into(),
        fee: 1000,
        created_by: "founder".into(),
    }
}

#[tokio::test]
async fn events_list_newest_first_with_limit() {
    let db = setup().await;
    let events = SurrealEventRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    events
        .create(event_input(circle_id, "old", 30))
        .await
        .unwrap();
    events
        .create(event_input(circle_id, "new", 1))
        .await
        .unwrap();
    events
        .create(event_input(circle_id, "mid", 10))
        .await
        .unwrap();

    let all = events.list(circle_id, None).await.unwrap();
    let names: Vec<_> = all.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["new", "mid", "old"]);

    let limited = events.list(circle_id, Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(events.count(circle_id).await.unwrap(), 3);
}

#[tokio::test]
async fn event_update_changes_fee() {
    let db = setup().await;
    let events = SurrealEventRepository::new(db.clone());
    let circle_id = create_circle(&db, "founder").await;

    let event = events
        .create(event_input(circle_id, "practice", 0))
        .await
        .unwrap();
    assert_eq!(event.fee, 1000);

    let updated = events
        .update(
            circle_id,
            event.id,
            UpdateEvent {
                fee: Some(1500),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.fee, 1500);
    assert_eq!(updated.name, "practice");
}
