//! Payment state machine operations.
//!
//! Legality of each transition is decided by [`PaymentAction::apply`]
//! against the stored status, then the repository performs the write
//! only if the status is still one the action may leave from. Losing
//! that race surfaces as the same error a stale caller would get.

use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::attendance::AttendeeId;
use musubi_core::models::member::CircleRole;
use musubi_core::models::payment::{
    PaymentAction, PaymentRecord, PaymentStatus, PaymentTransition,
};
use musubi_core::repository::{MemberRepository, PaymentRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::guard::{require_organizer, require_role};

pub struct PaymentService<M: MemberRepository, P: PaymentRepository> {
    members: M,
    payments: P,
}

impl<M: MemberRepository, P: PaymentRepository> PaymentService<M, P> {
    pub fn new(members: M, payments: P) -> Self {
        Self { members, payments }
    }

    /// The calling member attests they paid their own payment for the
    /// event. Fails with [`MusubiError::AlreadyConfirmed`] once an
    /// organizer has confirmed it.
    pub async fn mark_as_paid(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        actor: &str,
    ) -> MusubiResult<PaymentRecord> {
        require_role(&self.members, circle_id, actor, CircleRole::Member).await?;
        let own = AttendeeId::Member(actor.to_string());
        self.apply(circle_id, event_id, &own, PaymentAction::MarkPaid, actor)
            .await
    }

    /// Organizer confirms receipt, with or without a prior attestation.
    pub async fn confirm_payment(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &AttendeeId,
        actor: &str,
    ) -> MusubiResult<PaymentRecord> {
        require_organizer(&self.members, circle_id, actor).await?;
        self.apply(circle_id, event_id, attendee, PaymentAction::Confirm, actor)
            .await
    }

    /// Organizer returns the payment to `unpaid`, clearing all
    /// attestation and confirmation metadata.
    pub async fn reset_payment(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &AttendeeId,
        actor: &str,
    ) -> MusubiResult<PaymentRecord> {
        require_organizer(&self.members, circle_id, actor).await?;
        self.apply(circle_id, event_id, attendee, PaymentAction::Reset, actor)
            .await
    }

    pub async fn list_payments(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> MusubiResult<Vec<PaymentRecord>> {
        self.payments.list_for_event(circle_id, event_id).await
    }

    async fn apply(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &AttendeeId,
        action: PaymentAction,
        actor: &str,
    ) -> MusubiResult<PaymentRecord> {
        let key = attendee.key();
        let current = self.payments.get(circle_id, event_id, &key).await?;
        if let Err(e) = action.apply(current.status) {
            warn!(
                %circle_id,
                %event_id,
                attendee = %attendee,
                status = %current.status,
                ?action,
                "Rejected payment transition"
            );
            return Err(e);
        }

        let transition = PaymentTransition {
            action,
            actor: actor.to_string(),
        };
        match self
            .payments
            .transition(circle_id, event_id, &key, transition)
            .await?
        {
            Some(updated) => {
                info!(
                    %circle_id,
                    %event_id,
                    attendee = %attendee,
                    from = %current.status,
                    to = %updated.status,
                    actor,
                    "Payment transition applied"
                );
                Ok(updated)
            }
            // The status changed between the read and the conditional
            // write.
            None => {
                let now = self.payments.get(circle_id, event_id, &key).await?;
                let err = lost_race(action, now.status);
                warn!(%circle_id, %event_id, attendee = %attendee, error = %err, "Payment transition lost a race");
                Err(err)
            }
        }
    }
}

/// Error for a conditional write that found a different status than the
/// one it was checked against. The guard error wins if the stored status
/// no longer allows the action; otherwise the caller may simply retry.
fn lost_race(action: PaymentAction, now: PaymentStatus) -> MusubiError {
    match action.apply(now) {
        Err(e) => e,
        Ok(_) => MusubiError::Conflict {
            entity: "payment".into(),
        },
    }
}
