//! Attendance recorder and QR check-in.
//!
//! Both paths build an [`AttendanceBatch`] and hand it to the store as
//! one atomic commit: every attendance record of the roster plus one
//! `unpaid` payment per attendee marked present. Concurrent recordings
//! of the same event interleave per batch, last commit wins per record.

use std::collections::HashSet;

use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::attendance::{
    AttendanceBatch, AttendanceRecord, AttendeeId, AttendeeInput,
};
use musubi_core::models::payment::{PaymentStatus, PaymentWrite};
use musubi_core::qr::QrPayload;
use musubi_core::repository::{
    AttendanceRepository, EventRepository, MemberRepository, PaymentRepository,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{RerecordPolicy, ServiceConfig};
use crate::error::ServiceError;
use crate::guard::require_organizer;

/// What a bulk recording wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordSummary {
    pub attendance_written: usize,
    pub payments_written: usize,
    /// Payments left alone under [`RerecordPolicy::PreserveSettled`].
    pub payments_preserved: usize,
}

/// Result of a single QR scan. `success == false` means the attendee
/// was already checked in and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInOutcome {
    pub success: bool,
    pub display_name: String,
}

pub struct AttendanceService<M, E, A, P>
where
    M: MemberRepository,
    E: EventRepository,
    A: AttendanceRepository,
    P: PaymentRepository,
{
    members: M,
    events: E,
    attendance: A,
    payments: P,
    config: ServiceConfig,
}

impl<M, E, A, P> AttendanceService<M, E, A, P>
where
    M: MemberRepository,
    E: EventRepository,
    A: AttendanceRepository,
    P: PaymentRepository,
{
    pub fn new(members: M, events: E, attendance: A, payments: P, config: ServiceConfig) -> Self {
        Self {
            members,
            events,
            attendance,
            payments,
            config,
        }
    }

    /// Record the full roster for an event.
    ///
    /// Every entry overwrites the attendance record at its key. Each
    /// entry marked present also gets a payment at the event's fee,
    /// subject to the configured [`RerecordPolicy`]. Entries marked
    /// absent never create or touch a payment.
    pub async fn record_attendance(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        roster: Vec<AttendeeInput>,
        actor: &str,
    ) -> MusubiResult<RecordSummary> {
        require_organizer(&self.members, circle_id, actor).await?;
        let event = self.events.get(circle_id, event_id).await?;

        let mut seen = HashSet::with_capacity(roster.len());
        for entry in &roster {
            if !seen.insert(entry.attendee.key()) {
                return Err(ServiceError::DuplicateAttendee(entry.attendee.to_string()).into());
            }
        }

        let mut batch = AttendanceBatch::new(circle_id, event_id, actor);
        let mut preserved = 0;
        for entry in &roster {
            if !entry.attended {
                continue;
            }
            if self.keeps_existing_payment(circle_id, event_id, &entry.attendee).await? {
                preserved += 1;
                continue;
            }
            batch.payments.push(PaymentWrite {
                attendee: entry.attendee.clone(),
                amount: event.fee,
                display_name: entry.display_name.clone(),
                email: entry.email.clone(),
            });
        }
        batch.attendance = roster;

        let summary = RecordSummary {
            attendance_written: batch.attendance.len(),
            payments_written: batch.payments.len(),
            payments_preserved: preserved,
        };
        self.attendance.commit_batch(batch).await?;

        info!(
            %circle_id,
            %event_id,
            recorded_by = actor,
            attendance = summary.attendance_written,
            payments = summary.payments_written,
            preserved = summary.payments_preserved,
            "Recorded attendance"
        );
        Ok(summary)
    }

    /// Check in one member from a scanned uid.
    ///
    /// A member already recorded as present is reported with
    /// `success: false` and nothing is written, so repeated scans are
    /// harmless.
    pub async fn qr_check_in(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        scanned_uid: &str,
        actor: &str,
    ) -> MusubiResult<CheckInOutcome> {
        require_organizer(&self.members, circle_id, actor).await?;
        let member = self.members.get(circle_id, scanned_uid).await?;
        let event = self.events.get(circle_id, event_id).await?;

        let attendee = AttendeeId::Member(member.uid.clone());
        let existing = self
            .attendance
            .get(circle_id, event_id, &attendee.key())
            .await?;
        if existing.is_some_and(|record| record.attended) {
            debug!(%circle_id, %event_id, uid = scanned_uid, "Already checked in");
            return Ok(CheckInOutcome {
                success: false,
                display_name: member.display_name,
            });
        }

        let mut batch = AttendanceBatch::new(circle_id, event_id, actor);
        if !self.keeps_existing_payment(circle_id, event_id, &attendee).await? {
            batch.payments.push(PaymentWrite {
                attendee: attendee.clone(),
                amount: event.fee,
                display_name: member.display_name.clone(),
                email: Some(member.email.clone()),
            });
        }
        batch.attendance.push(AttendeeInput {
            attendee,
            attended: true,
            display_name: member.display_name.clone(),
            email: Some(member.email),
            photo_url: member.photo_url,
        });
        self.attendance.commit_batch(batch).await?;

        info!(%circle_id, %event_id, uid = scanned_uid, scanned_by = actor, "QR check-in");
        Ok(CheckInOutcome {
            success: true,
            display_name: member.display_name,
        })
    }

    /// Decode a raw scanned payload, validate its marker, then check the
    /// member in.
    pub async fn check_in_from_qr(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        raw_payload: &str,
        actor: &str,
    ) -> MusubiResult<CheckInOutcome> {
        let uid = self.parse_payload(raw_payload)?;
        self.qr_check_in(circle_id, event_id, &uid, actor).await
    }

    pub async fn list_attendance(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
    ) -> MusubiResult<Vec<AttendanceRecord>> {
        self.attendance.list_for_event(circle_id, event_id).await
    }

    fn parse_payload(&self, raw: &str) -> Result<String, ServiceError> {
        let payload =
            QrPayload::decode(raw).map_err(|e| ServiceError::QrRejected(e.to_string()))?;
        if payload.payload_type != self.config.qr_payload_type {
            return Err(ServiceError::QrRejected(format!(
                "unexpected type marker {:?}",
                payload.payload_type
            )));
        }
        if payload.uid.trim().is_empty() {
            return Err(ServiceError::QrRejected("missing uid".into()));
        }
        Ok(payload.uid)
    }

    /// Whether the policy says to leave the attendee's current payment
    /// alone instead of resetting it to `unpaid`.
    async fn keeps_existing_payment(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        attendee: &AttendeeId,
    ) -> MusubiResult<bool> {
        if self.config.rerecord_policy != RerecordPolicy::PreserveSettled {
            return Ok(false);
        }
        match self.payments.get(circle_id, event_id, &attendee.key()).await {
            Ok(payment) => Ok(payment.status != PaymentStatus::Unpaid),
            Err(MusubiError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
