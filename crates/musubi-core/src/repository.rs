//! Repository trait definitions: the document store contract.
//!
//! All repository operations are async. Circle-scoped repositories take
//! the `circle_id` on every call. Multi-document writes that must be
//! all-or-nothing are expressed as a single call taking a batch.

use uuid::Uuid;

use crate::error::MusubiResult;
use crate::models::{
    attendance::{AttendanceBatch, AttendanceRecord},
    circle::{Circle, CreateCircle, UpdateCircle},
    event::{CreateEvent, Event, UpdateEvent},
    guest::{CreateGuest, Guest, UpdateGuest},
    member::{CircleMember, CircleRole, CreateMember},
    notification::{CreateNotificationLog, NotificationLog},
    payment::{PaymentRecord, PaymentStatus, PaymentTransition},
    user::{UpdateUserProfile, UserProfile, VerifiedIdentity},
};

// ---------------------------------------------------------------------------
// Global scope
// ---------------------------------------------------------------------------

pub trait UserProfileRepository: Send + Sync {
    /// Create the profile on first sign-in, refresh the email afterwards.
    fn upsert_on_sign_in(
        &self,
        identity: &VerifiedIdentity,
    ) -> impl Future<Output = MusubiResult<UserProfile>> + Send;
    fn get(&self, uid: &str) -> impl Future<Output = MusubiResult<UserProfile>> + Send;
    fn get_by_email(&self, email: &str)
    -> impl Future<Output = MusubiResult<UserProfile>> + Send;

    /// Update the profile and, in the same atomic batch, copy display
    /// name and photo changes onto every membership of the user.
    fn update_and_propagate(
        &self,
        uid: &str,
        input: UpdateUserProfile,
    ) -> impl Future<Output = MusubiResult<UserProfile>> + Send;

    /// Set-union `token` into the user's delivery tokens.
    fn add_push_token(&self, uid: &str, token: &str)
    -> impl Future<Output = MusubiResult<()>> + Send;

    /// Remove every token in `tokens` from the user's delivery tokens.
    fn remove_push_tokens(
        &self,
        uid: &str,
        tokens: &[String],
    ) -> impl Future<Output = MusubiResult<()>> + Send;
}

pub trait CircleRepository: Send + Sync {
    /// Create the circle and its founding organizer membership in one
    /// atomic batch.
    fn create(
        &self,
        input: CreateCircle,
        founder: &VerifiedIdentity,
    ) -> impl Future<Output = MusubiResult<Circle>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MusubiResult<Circle>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateCircle,
    ) -> impl Future<Output = MusubiResult<Circle>> + Send;
    /// Circles with the given ids, newest first. Unknown ids are skipped.
    fn list_by_ids(&self, ids: &[Uuid]) -> impl Future<Output = MusubiResult<Vec<Circle>>> + Send;
}

pub trait NotificationLogRepository: Send + Sync {
    /// Append a log row. Logs are never updated or deleted.
    fn append(
        &self,
        input: CreateNotificationLog,
    ) -> impl Future<Output = MusubiResult<NotificationLog>> + Send;
    fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> impl Future<Output = MusubiResult<Vec<NotificationLog>>> + Send;
}

// ---------------------------------------------------------------------------
// Circle-scoped repositories
// ---------------------------------------------------------------------------

pub trait MemberRepository: Send + Sync {
    fn add(&self, input: CreateMember) -> impl Future<Output = MusubiResult<CircleMember>> + Send;
    fn get(
        &self,
        circle_id: Uuid,
        uid: &str,
    ) -> impl Future<Output = MusubiResult<CircleMember>> + Send;

    /// Role of `uid` in the circle, `None` if not a member. This is the
    /// single authorization primitive; callers must not cache it.
    fn find_role(
        &self,
        circle_id: Uuid,
        uid: &str,
    ) -> impl Future<Output = MusubiResult<Option<CircleRole>>> + Send;
    fn set_role(
        &self,
        circle_id: Uuid,
        uid: &str,
        role: CircleRole,
    ) -> impl Future<Output = MusubiResult<CircleMember>> + Send;
    /// Removes the membership row only.
    fn remove(&self, circle_id: Uuid, uid: &str) -> impl Future<Output = MusubiResult<()>> + Send;
    fn list(&self, circle_id: Uuid) -> impl Future<Output = MusubiResult<Vec<CircleMember>>> + Send;
    fn count(&self, circle_id: Uuid) -> impl Future<Output = MusubiResult<u64>> + Send;
    fn count_with_role(
        &self,
        circle_id: Uuid,
        role: CircleRole,
    ) -> impl Future<Output = MusubiResult<u64>> + Send;

    /// Ids of every circle `uid` belongs to (collection-spanning query).
    fn circle_ids_for_user(
        &self,
        uid: &str,
    ) -> impl Future<Output = MusubiResult<Vec<Uuid>>> + Send;
}

pub trait GuestRepository: Send + Sync {
    fn create(&self, input: CreateGuest) -> impl Future<Output = MusubiResult<Guest>> + Send;
    fn get(&self, circle_id: Uuid, id: Uuid) -> impl Future<Output = MusubiResult<Guest>> + Send;
    fn update(
        &self,
        circle_id: Uuid,
        id: Uuid,
        input: UpdateGuest,
    ) -> impl Future<Output = MusubiResult<Guest>> + Send;
    /// Soft-delete: clears the active flag.
    fn deactivate(&self, circle_id: Uuid, id: Uuid) -> impl Future<Output = MusubiResult<()>> + Send;
    fn list_active(&self, circle_id: Uuid) -> impl Future<Output = MusubiResult<Vec<Guest>>> + Send;
}

pub trait EventRepository: Send + Sync {
    fn create(&self, input: CreateEvent) -> impl Future<Output = MusubiResult<Event>> + Send;
    fn get(&self, circle_id: Uuid, id: Uuid) -> impl Future<Output = MusubiResult<Event>> + Send;
    fn update(
        &self,
        circle_id: Uuid,
        id: Uuid,
        input: UpdateEvent,
    ) -> impl Future<Output = MusubiResult<Event>> + Send;
    /// Events of the circle, newest `date` first.
    fn list(
        &self,
        circle_id: Uuid,
        limit: Option<u64>,
    ) -> impl Future<Output = MusubiResult<Vec<Event>>> + Send;
    fn count(&self, circle_id: Uuid) -> impl Future<Output = MusubiResult<u64>> + Send;
}

pub trait AttendanceRepository: Send + Sync {
    fn get(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee_key: &str,
    ) -> impl Future<Output = MusubiResult<Option<AttendanceRecord>>> + Send;
    fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> impl Future<Output = MusubiResult<Vec<AttendanceRecord>>> + Send;
    fn count_attended(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> impl Future<Output = MusubiResult<u64>> + Send;

    /// Commit every attendance and payment write of the batch atomically.
    fn commit_batch(&self, batch: AttendanceBatch) -> impl Future<Output = MusubiResult<()>> + Send;

    /// Attended records of `uid` across all circles, newest check-in
    /// first (collection-spanning query).
    fn list_attended_by_user(
        &self,
        uid: &str,
    ) -> impl Future<Output = MusubiResult<Vec<AttendanceRecord>>> + Send;
}

pub trait PaymentRepository: Send + Sync {
    fn get(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee_key: &str,
    ) -> impl Future<Output = MusubiResult<PaymentRecord>> + Send;
    fn list_for_event(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> impl Future<Output = MusubiResult<Vec<PaymentRecord>>> + Send;

    /// Payments of the circle in `status`, optionally narrowed to one
    /// event. Relies on the circle id denormalized onto every record.
    fn list_by_status(
        &self,
        circle_id: Uuid,
        event_id: Option<Uuid>,
        status: PaymentStatus,
    ) -> impl Future<Output = MusubiResult<Vec<PaymentRecord>>> + Send;

    /// Apply a state machine transition. Returns `None` without writing
    /// if the stored status is not one the action may be applied from.
    fn transition(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee_key: &str,
        transition: PaymentTransition,
    ) -> impl Future<Output = MusubiResult<Option<PaymentRecord>>> + Send;

    /// Payments owed by `uid` across all circles (collection-spanning
    /// query), newest first.
    fn list_by_user(&self, uid: &str)
    -> impl Future<Output = MusubiResult<Vec<PaymentRecord>>> + Send;
}
