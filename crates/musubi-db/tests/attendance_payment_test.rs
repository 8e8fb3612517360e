//! Integration tests for atomic attendance batches and payment status
//! transitions using in-memory SurrealDB.

use musubi_core::models::attendance::{AttendanceBatch, AttendeeId, AttendeeInput};
use musubi_core::models::notification::{CreateNotificationLog, NotificationType};
use musubi_core::models::payment::{
    PaymentAction, PaymentStatus, PaymentTransition, PaymentWrite,
};
use musubi_core::repository::{
    AttendanceRepository, NotificationLogRepository, PaymentRepository,
};
use musubi_db::repository::{
    SurrealAttendanceRepository, SurrealNotificationLogRepository, SurrealPaymentRepository,
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

fn attendee(uid: &str, attended: bool) -> AttendeeInput {
    AttendeeInput {
        attendee: AttendeeId::Member(uid.into()),
        attended,
        display_name: uid.to_uppercase(),
        email: Some(format!("{uid}@example.com")),
        photo_url: None,
    }
}

fn payment(uid: &str, amount: u64) -> PaymentWrite {
    PaymentWrite {
        attendee: AttendeeId::Member(uid.into()),
        amount,
        display_name: uid.to_uppercase(),
        email: None,
    }
}

fn transition(action: PaymentAction, actor: &str) -> PaymentTransition {
    PaymentTransition {
        action,
        actor: actor.into(),
    }
}

/// Record A and B attended, C absent, with fee 1000.
async fn record_abc(
    attendance: &SurrealAttendanceRepository<surrealdb::engine::local::Db>,
    circle_id: Uuid,
    event_id: Uuid,
) {
    let mut batch = AttendanceBatch::new(circle_id, event_id, "org");
    batch.attendance = vec![attendee("a", true), attendee("b", true), attendee("c", false)];
    batch.payments = vec![payment("a", 1000), payment("b", 1000)];
    attendance.commit_batch(batch).await.unwrap();
}

// -----------------------------------------------------------------------
// Attendance batches
// -----------------------------------------------------------------------

#[tokio::test]
async fn batch_writes_attendance_and_payments() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let payments = SurrealPaymentRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());

    record_abc(&attendance, circle_id, event_id).await;

    let records = attendance.list_for_event(circle_id, event_id).await.unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.checked_in_at.is_some(), record.attended);
        assert_eq!(record.checked_in_by, "org");
    }
    assert_eq!(
        attendance.count_attended(circle_id, event_id).await.unwrap(),
        2
    );

    let owed = payments.list_for_event(circle_id, event_id).await.unwrap();
    assert_eq!(owed.len(), 2);
    assert!(owed.iter().all(|p| p.status == PaymentStatus::Unpaid));
    assert!(owed.iter().all(|p| p.amount == 1000));
}

#[tokio::test]
async fn rerecording_overwrites_previous_records() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());

    record_abc(&attendance, circle_id, event_id).await;

    let mut batch = AttendanceBatch::new(circle_id, event_id, "org2");
    batch.attendance = vec![attendee("a", false)];
    attendance.commit_batch(batch).await.unwrap();

    let a = attendance
        .get(circle_id, event_id, "a")
        .await
        .unwrap()
        .unwrap();
    assert!(!a.attended);
    assert!(a.checked_in_at.is_none());
    assert_eq!(a.checked_in_by, "org2");
    assert_eq!(
        attendance.count_attended(circle_id, event_id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());

    attendance
        .commit_batch(AttendanceBatch::new(circle_id, event_id, "org"))
        .await
        .unwrap();
    assert!(
        attendance
            .list_for_event(circle_id, event_id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn guest_attendees_round_trip() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());
    let guest_id = Uuid::new_v4();

    let mut batch = AttendanceBatch::new(circle_id, event_id, "org");
    batch.attendance = vec![AttendeeInput {
        attendee: AttendeeId::Guest(guest_id),
        attended: true,
        display_name: "Visitor".into(),
        email: None,
        photo_url: None,
    }];
    attendance.commit_batch(batch).await.unwrap();

    let record = attendance
        .get(circle_id, event_id, &guest_id.to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.attendee, AttendeeId::Guest(guest_id));
}

#[tokio::test]
async fn attended_history_spans_circles() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());

    record_abc(&attendance, Uuid::new_v4(), Uuid::new_v4()).await;
    record_abc(&attendance, Uuid::new_v4(), Uuid::new_v4()).await;

    assert_eq!(attendance.list_attended_by_user("a").await.unwrap().len(), 2);
    assert!(attendance.list_attended_by_user("c").await.unwrap().is_empty());
}

// -----------------------------------------------------------------------
// Payment transitions
// -----------------------------------------------------------------------

#[tokio::test]
async fn mark_paid_then_confirm() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let payments = SurrealPaymentRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());
    record_abc(&attendance, circle_id, event_id).await;

    let pending = payments
        .transition(circle_id, event_id, "a", transition(PaymentAction::MarkPaid, "a"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(pending.status, PaymentStatus::PendingConfirmation);
    assert_eq!(pending.marked_paid_by.as_deref(), Some("a"));
    assert!(pending.marked_paid_at.is_some());

    let confirmed = payments
        .transition(circle_id, event_id, "a", transition(PaymentAction::Confirm, "org"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Confirmed);
    assert_eq!(confirmed.confirmed_by.as_deref(), Some("org"));
    assert_eq!(confirmed.marked_paid_by.as_deref(), Some("a"));
}

#[tokio::test]
async fn confirmed_payment_rejects_mark_paid_without_writing() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let payments = SurrealPaymentRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());
    record_abc(&attendance, circle_id, event_id).await;

    payments
        .transition(circle_id, event_id, "b", transition(PaymentAction::Confirm, "org"))
        .await
        .unwrap()
        .unwrap();

    let rejected = payments
        .transition(circle_id, event_id, "b", transition(PaymentAction::MarkPaid, "b"))
        .await
        .unwrap();
    assert!(rejected.is_none());

    let stored = payments.get(circle_id, event_id, "b").await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Confirmed);
    assert!(stored.marked_paid_by.is_none());
}

#[tokio::test]
async fn reset_clears_attestation() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let payments = SurrealPaymentRepository::new(db.clone());
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());
    record_abc(&attendance, circle_id, event_id).await;

    payments
        .transition(circle_id, event_id, "a", transition(PaymentAction::MarkPaid, "a"))
        .await
        .unwrap();
    payments
        .transition(circle_id, event_id, "a", transition(PaymentAction::Confirm, "org"))
        .await
        .unwrap();

    let reset = payments
        .transition(circle_id, event_id, "a", transition(PaymentAction::Reset, "org"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reset.status, PaymentStatus::Unpaid);
    assert!(reset.marked_paid_at.is_none());
    assert!(reset.marked_paid_by.is_none());
    assert!(reset.confirmed_at.is_none());
    assert!(reset.confirmed_by.is_none());
}

#[tokio::test]
async fn unpaid_listing_by_circle_and_event() {
    let db = setup().await;
    let attendance = SurrealAttendanceRepository::new(db.clone());
    let payments = SurrealPaymentRepository::new(db.clone());
    let circle_id = Uuid::new_v4();
    let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
    record_abc(&attendance, circle_id, first).await;
    record_abc(&attendance, circle_id, second).await;

    payments
        .transition(circle_id, first, "a", transition(PaymentAction::Confirm, "org"))
        .await
        .unwrap();

    let circle_wide = payments
        .list_by_status(circle_id, None, PaymentStatus::Unpaid)
        .await
        .unwrap();
    assert_eq!(circle_wide.len(), 3);

    let one_event = payments
        .list_by_status(circle_id, Some(first), PaymentStatus::Unpaid)
        .await
        .unwrap();
    assert_eq!(one_event.len(), 1);
    assert_eq!(one_event[0].attendee, AttendeeId::Member("b".into()));

    assert_eq!(payments.list_by_user("a").await.unwrap().len(), 2);
}

#[tokio::test]
async fn missing_payment_is_not_found() {
    let db = setup().await;
    let payments = SurrealPaymentRepository::new(db);

    let err = payments
        .get(Uuid::new_v4(), Uuid::new_v4(), "nobody")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        musubi_core::error::MusubiError::NotFound { .. }
    ));
}

// -----------------------------------------------------------------------
// Notification logs
// -----------------------------------------------------------------------

#[tokio::test]
async fn notification_logs_append_and_list() {
    let db = setup().await;
    let logs = SurrealNotificationLogRepository::new(db);
    let (circle_id, event_id) = (Uuid::new_v4(), Uuid::new_v4());

    let log = logs
        .append(CreateNotificationLog {
            circle_id,
            event_id,
            recipient_uid: "a".into(),
            notification_type: NotificationType::PaymentReminder,
            sent_by: "org".into(),
            title: "Reminder".into(),
            body: "Please pay".into(),
            success: false,
            error: Some("all tokens invalid".into()),
        })
        .await
        .unwrap();
    assert!(!log.success);

    let listed = logs.list_for_event(circle_id, event_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, log.id);
    assert_eq!(listed[0].error.as_deref(), Some("all tokens invalid"));
}
