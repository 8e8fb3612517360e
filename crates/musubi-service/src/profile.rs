//! User profiles, push token registration and the member's own page.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use musubi_core::error::MusubiResult;
use musubi_core::models::attendance::AttendanceRecord;
use musubi_core::models::payment::PaymentRecord;
use musubi_core::models::user::{UpdateUserProfile, UserProfile, VerifiedIdentity};
use musubi_core::repository::{
    AttendanceRepository, EventRepository, MemberRepository, PaymentRepository,
    UserProfileRepository,
};
use serde::Serialize;
use tracing::info;

use crate::activity::{AttendanceRank, attendance_heatmap, attendance_streak};
use crate::error::require_non_empty;

#[derive(Debug, Clone, Serialize)]
pub struct MemberActivity {
    pub attendance_count: usize,
    pub rank: AttendanceRank,
    pub streak: u32,
    pub heatmap: BTreeSet<NaiveDate>,
    /// Events across every circle the user belongs to.
    pub total_events: u64,
    pub attendance: Vec<AttendanceRecord>,
    pub payments: Vec<PaymentRecord>,
}

pub struct ProfileService<U, M, E, A, P>
where
    U: UserProfileRepository,
    M: MemberRepository,
    E: EventRepository,
    A: AttendanceRepository,
    P: PaymentRepository,
{
    users: U,
    members: M,
    events: E,
    attendance: A,
    payments: P,
}

impl<U, M, E, A, P> ProfileService<U, M, E, A, P>
where
    U: UserProfileRepository,
    M: MemberRepository,
    E: EventRepository,
    A: AttendanceRepository,
    P: PaymentRepository,
{
    pub fn new(users: U, members: M, events: E, attendance: A, payments: P) -> Self {
        Self {
            users,
            members,
            events,
            attendance,
            payments,
        }
    }

    /// Create the profile on first sign-in, refresh it afterwards.
    pub async fn ensure_profile(&self, identity: &VerifiedIdentity) -> MusubiResult<UserProfile> {
        self.users.upsert_on_sign_in(identity).await
    }

    pub async fn register_push_token(&self, uid: &str, token: &str) -> MusubiResult<()> {
        require_non_empty("push token", token)?;
        self.users.add_push_token(uid, token).await?;
        info!(uid, "Registered push token");
        Ok(())
    }

    /// Update the profile and resync the copies of name and photo held
    /// on every membership, in one atomic write.
    pub async fn update_profile(
        &self,
        uid: &str,
        input: UpdateUserProfile,
    ) -> MusubiResult<UserProfile> {
        if input.is_empty() {
            return self.users.get(uid).await;
        }
        if let Some(name) = &input.display_name {
            require_non_empty("display name", name)?;
        }
        self.users.update_and_propagate(uid, input).await
    }

    pub async fn attendance_history(&self, uid: &str) -> MusubiResult<Vec<AttendanceRecord>> {
        self.attendance.list_attended_by_user(uid).await
    }

    pub async fn payment_history(&self, uid: &str) -> MusubiResult<Vec<PaymentRecord>> {
        self.payments.list_by_user(uid).await
    }

    pub async fn member_activity(&self, uid: &str) -> MusubiResult<MemberActivity> {
        let attendance = self.attendance_history(uid).await?;
        let payments = self.payment_history(uid).await?;

        let mut total_events = 0;
        for circle_id in self.members.circle_ids_for_user(uid).await? {
            total_events += self.events.count(circle_id).await?;
        }

        let check_ins: Vec<_> = attendance.iter().filter_map(|r| r.checked_in_at).collect();
        Ok(MemberActivity {
            attendance_count: attendance.len(),
            rank: AttendanceRank::from_count(attendance.len()),
            streak: attendance_streak(&check_ins),
            heatmap: attendance_heatmap(&check_ins),
            total_events,
            attendance,
            payments,
        })
    }
}
