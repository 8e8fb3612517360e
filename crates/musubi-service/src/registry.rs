//! Membership & guest registry.
//!
//! Decides who may appear on an event roster: registered members keyed
//! by uid and ad-hoc guests keyed by a locally issued id. Guests are
//! only ever deactivated, never deleted, since attendance and payment
//! records keep referring to them.

use std::collections::HashMap;

use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::attendance::{AttendeeId, RosterEntry};
use musubi_core::models::circle::{Circle, CreateCircle, UpdateCircle};
use musubi_core::models::guest::{CreateGuest, Guest, UpdateGuest};
use musubi_core::models::member::{CircleMember, CircleRole, CreateMember};
use musubi_core::models::user::VerifiedIdentity;
use musubi_core::repository::{
    AttendanceRepository, CircleRepository, GuestRepository, MemberRepository,
    UserProfileRepository,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ServiceError, require_non_empty};
use crate::guard::require_organizer;

/// Guest details supplied by an organizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuestInput {
    pub name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

pub struct RegistryService<U, C, M, G, A>
where
    U: UserProfileRepository,
    C: CircleRepository,
    M: MemberRepository,
    G: GuestRepository,
    A: AttendanceRepository,
{
    users: U,
    circles: C,
    members: M,
    guests: G,
    attendance: A,
}

impl<U, C, M, G, A> RegistryService<U, C, M, G, A>
where
    U: UserProfileRepository,
    C: CircleRepository,
    M: MemberRepository,
    G: GuestRepository,
    A: AttendanceRepository,
{
    pub fn new(users: U, circles: C, members: M, guests: G, attendance: A) -> Self {
        Self {
            users,
            circles,
            members,
            guests,
            attendance,
        }
    }

    // -------------------------------------------------------------------
    // Circles
    // -------------------------------------------------------------------

    /// Create a circle with `creator` as its first organizer.
    pub async fn create_circle(
        &self,
        input: CreateCircle,
        creator: &VerifiedIdentity,
    ) -> MusubiResult<Circle> {
        require_non_empty("circle name", &input.name)?;
        self.circles.create(input, creator).await
    }

    pub async fn get_circle(&self, circle_id: Uuid) -> MusubiResult<Circle> {
        self.circles.get_by_id(circle_id).await
    }

    /// Circles `uid` belongs to, newest first.
    pub async fn list_circles_for_user(&self, uid: &str) -> MusubiResult<Vec<Circle>> {
        let ids = self.members.circle_ids_for_user(uid).await?;
        self.circles.list_by_ids(&ids).await
    }

    pub async fn update_circle(
        &self,
        circle_id: Uuid,
        input: UpdateCircle,
        actor: &str,
    ) -> MusubiResult<Circle> {
        require_organizer(&self.members, circle_id, actor).await?;
        if let Some(name) = &input.name {
            require_non_empty("circle name", name)?;
        }
        self.circles.update(circle_id, input).await
    }

    // -------------------------------------------------------------------
    // Members
    // -------------------------------------------------------------------

    /// Add the registered user with `email` as a plain member.
    pub async fn add_member_by_email(
        &self,
        circle_id: Uuid,
        email: &str,
        actor: &str,
    ) -> MusubiResult<CircleMember> {
        require_organizer(&self.members, circle_id, actor).await?;

        let profile = self.users.get_by_email(email.trim()).await?;
        if self
            .members
            .find_role(circle_id, &profile.uid)
            .await?
            .is_some()
        {
            return Err(MusubiError::AlreadyExists {
                entity: "member".into(),
            });
        }

        let member = self
            .members
            .add(CreateMember {
                circle_id,
                uid: profile.uid,
                role: CircleRole::Member,
                display_name: profile.display_name,
                email: profile.email,
                photo_url: profile.photo_url,
            })
            .await?;

        info!(%circle_id, uid = %member.uid, added_by = actor, "Added member");
        Ok(member)
    }

    pub async fn promote_to_organizer(
        &self,
        circle_id: Uuid,
        target: &str,
        actor: &str,
    ) -> MusubiResult<CircleMember> {
        self.check_membership_change(circle_id, target, actor)
            .await?;
        let member = self
            .members
            .set_role(circle_id, target, CircleRole::Organizer)
            .await?;
        info!(%circle_id, uid = target, "Promoted to organizer");
        Ok(member)
    }

    pub async fn demote_to_member(
        &self,
        circle_id: Uuid,
        target: &str,
        actor: &str,
    ) -> MusubiResult<CircleMember> {
        let current = self
            .check_membership_change(circle_id, target, actor)
            .await?;
        self.ensure_not_last_organizer(circle_id, &current).await?;
        let member = self
            .members
            .set_role(circle_id, target, CircleRole::Member)
            .await?;
        info!(%circle_id, uid = target, "Demoted to member");
        Ok(member)
    }

    /// Remove the membership row. Attendance and payment records of the
    /// user stay in place.
    pub async fn remove_member(&self, circle_id: Uuid, target: &str, actor: &str) -> MusubiResult<()> {
        let current = self
            .check_membership_change(circle_id, target, actor)
            .await?;
        self.ensure_not_last_organizer(circle_id, &current).await?;
        self.members.remove(circle_id, target).await?;
        info!(%circle_id, uid = target, removed_by = actor, "Removed member");
        Ok(())
    }

    /// Members with organizers first, then by display name.
    pub async fn list_members(&self, circle_id: Uuid) -> MusubiResult<Vec<CircleMember>> {
        let mut members = self.members.list(circle_id).await?;
        members.sort_by(|a, b| {
            b.is_organizer()
                .cmp(&a.is_organizer())
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        Ok(members)
    }

    async fn check_membership_change(
        &self,
        circle_id: Uuid,
        target: &str,
        actor: &str,
    ) -> MusubiResult<CircleMember> {
        require_organizer(&self.members, circle_id, actor).await?;
        if target == actor {
            return Err(ServiceError::SelfTarget.into());
        }
        self.members.get(circle_id, target).await
    }

    async fn ensure_not_last_organizer(
        &self,
        circle_id: Uuid,
        target: &CircleMember,
    ) -> MusubiResult<()> {
        if !target.is_organizer() {
            return Ok(());
        }
        let organizers = self
            .members
            .count_with_role(circle_id, CircleRole::Organizer)
            .await?;
        if organizers <= 1 {
            return Err(MusubiError::LastOrganizer);
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Guests
    // -------------------------------------------------------------------

    pub async fn add_guest(
        &self,
        circle_id: Uuid,
        input: GuestInput,
        actor: &str,
    ) -> MusubiResult<Guest> {
        require_organizer(&self.members, circle_id, actor).await?;
        require_non_empty("guest name", &input.name)?;

        let guest = self
            .guests
            .create(CreateGuest {
                circle_id,
                name: input.name,
                email: input.email,
                phone_number: input.phone_number,
                notes: input.notes,
                added_by: actor.to_string(),
            })
            .await?;

        info!(%circle_id, guest_id = %guest.id, "Added guest");
        Ok(guest)
    }

    pub async fn list_active_guests(&self, circle_id: Uuid) -> MusubiResult<Vec<Guest>> {
        self.guests.list_active(circle_id).await
    }

    pub async fn update_guest(
        &self,
        circle_id: Uuid,
        guest_id: Uuid,
        input: UpdateGuest,
        actor: &str,
    ) -> MusubiResult<Guest> {
        require_organizer(&self.members, circle_id, actor).await?;
        if let Some(name) = &input.name {
            require_non_empty("guest name", name)?;
        }
        self.guests.update(circle_id, guest_id, input).await
    }

    /// Soft-delete: the guest drops off future rosters but stays
    /// resolvable from historical records.
    pub async fn deactivate_guest(
        &self,
        circle_id: Uuid,
        guest_id: Uuid,
        actor: &str,
    ) -> MusubiResult<()> {
        require_organizer(&self.members, circle_id, actor).await?;
        self.guests.deactivate(circle_id, guest_id).await?;
        info!(%circle_id, %guest_id, "Deactivated guest");
        Ok(())
    }

    // -------------------------------------------------------------------
    // Roster
    // -------------------------------------------------------------------

    /// Active members and guests, each seeded with the attendance already
    /// recorded for the event. Read-only.
    pub async fn list_roster(&self, circle_id: Uuid, event_id: Uuid) -> MusubiResult<Vec<RosterEntry>> {
        let members = self.list_members(circle_id).await?;
        let guests = self.guests.list_active(circle_id).await?;
        let prior: HashMap<AttendeeId, bool> = self
            .attendance
            .list_for_event(circle_id, event_id)
            .await?
            .into_iter()
            .map(|record| (record.attendee, record.attended))
            .collect();

        let member_entries = members.into_iter().map(|m| {
            let attendee = AttendeeId::Member(m.uid);
            RosterEntry {
                prior_attended: prior.get(&attendee).copied(),
                attendee,
                display_name: m.display_name,
                email: Some(m.email),
                photo_url: m.photo_url,
            }
        });
        let guest_entries = guests.into_iter().map(|g| {
            let attendee = AttendeeId::Guest(g.id);
            RosterEntry {
                prior_attended: prior.get(&attendee).copied(),
                attendee,
                display_name: g.name,
                email: g.email,
                photo_url: None,
            }
        });

        Ok(member_entries.chain(guest_entries).collect())
    }
}
