//! Analytics aggregator.
//!
//! Recomputed from the attendance and payment records on every call.
//! Reads are not a snapshot; a recording in flight may be half visible.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use musubi_core::error::MusubiResult;
use musubi_core::models::attendance::AttendeeId;
use musubi_core::models::payment::PaymentStatus;
use musubi_core::repository::{
    AttendanceRepository, EventRepository, MemberRepository, PaymentRepository,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::guard::require_organizer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventAttendanceStat {
    pub event_id: Uuid,
    pub event_name: String,
    pub event_date: DateTime<Utc>,
    pub attended_count: u64,
    pub total_members: u64,
    /// Integer percentage in `0..=100`.
    pub attendance_rate: u8,
    pub unpaid_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnpaidMember {
    pub attendee: AttendeeId,
    pub display_name: String,
    pub event_id: Uuid,
    pub event_name: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CircleAnalytics {
    /// Oldest event first.
    pub stats: Vec<EventAttendanceStat>,
    pub unpaid_members: Vec<UnpaidMember>,
    /// Events in the window, not every event of the circle.
    pub total_events: u64,
    pub avg_attendance_rate: u8,
    pub total_unpaid_amount: u64,
}

/// `round(attended / total * 100)`, 0 when there are no members and
/// capped at 100 since guests can push attended above the member count.
pub fn attendance_rate(attended: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (attended * 200 + total) / (total * 2);
    rounded.min(100) as u8
}

fn average_rate(stats: &[EventAttendanceStat]) -> u8 {
    if stats.is_empty() {
        return 0;
    }
    let sum: u64 = stats.iter().map(|s| u64::from(s.attendance_rate)).sum();
    let n = stats.len() as u64;
    ((sum * 2 + n) / (n * 2)) as u8
}

pub struct AnalyticsService<M, E, A, P>
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

impl<M, E, A, P> AnalyticsService<M, E, A, P>
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

    /// Attendance per event over the most recent events, oldest first.
    pub async fn event_attendance_stats(
        &self,
        circle_id: Uuid,
    ) -> MusubiResult<Vec<EventAttendanceStat>> {
        let mut events = self
            .events
            .list(circle_id, Some(self.config.analytics_event_window))
            .await?;
        events.reverse();

        let total_members = self.members.count(circle_id).await?;
        let mut stats = Vec::with_capacity(events.len());
        for event in events {
            let attended_count = self.attendance.count_attended(circle_id, event.id).await?;
            let unpaid_count = self
                .payments
                .list_by_status(circle_id, Some(event.id), PaymentStatus::Unpaid)
                .await?
                .len() as u64;
            stats.push(EventAttendanceStat {
                event_id: event.id,
                event_name: event.name,
                event_date: event.date,
                attended_count,
                total_members,
                attendance_rate: attendance_rate(attended_count, total_members),
                unpaid_count,
            });
        }

        debug!(%circle_id, events = stats.len(), "Computed attendance stats");
        Ok(stats)
    }

    /// Every payment in the circle with status exactly `unpaid`.
    /// Attested but unconfirmed payments are not included.
    pub async fn unpaid_members(&self, circle_id: Uuid) -> MusubiResult<Vec<UnpaidMember>> {
        let unpaid = self
            .payments
            .list_by_status(circle_id, None, PaymentStatus::Unpaid)
            .await?;
        let names: HashMap<Uuid, String> = self
            .events
            .list(circle_id, None)
            .await?
            .into_iter()
            .map(|e| (e.id, e.name))
            .collect();

        Ok(unpaid
            .into_iter()
            .map(|p| UnpaidMember {
                event_name: names.get(&p.event_id).cloned().unwrap_or_default(),
                attendee: p.attendee,
                display_name: p.display_name,
                event_id: p.event_id,
                amount: p.amount,
            })
            .collect())
    }

    /// Sum of `unpaid` amounts for the circle, or for one event.
    pub async fn unpaid_total(&self, circle_id: Uuid, event_id: Option<Uuid>) -> MusubiResult<u64> {
        let unpaid = self
            .payments
            .list_by_status(circle_id, event_id, PaymentStatus::Unpaid)
            .await?;
        Ok(unpaid.iter().map(|p| p.amount).sum())
    }

    /// The organizer dashboard bundle. Every figure, totals included,
    /// covers only the events in the analytics window.
    pub async fn circle_analytics(
        &self,
        circle_id: Uuid,
        actor: &str,
    ) -> MusubiResult<CircleAnalytics> {
        require_organizer(&self.members, circle_id, actor).await?;

        let stats = self.event_attendance_stats(circle_id).await?;
        let window: HashSet<Uuid> = stats.iter().map(|s| s.event_id).collect();
        let unpaid_members: Vec<UnpaidMember> = self
            .unpaid_members(circle_id)
            .await?
            .into_iter()
            .filter(|u| window.contains(&u.event_id))
            .collect();
        let total_events = stats.len() as u64;

        Ok(CircleAnalytics {
            avg_attendance_rate: average_rate(&stats),
            total_unpaid_amount: unpaid_members.iter().map(|u| u.amount).sum(),
            stats,
            unpaid_members,
            total_events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_rounds_to_nearest() {
        assert_eq!(attendance_rate(2, 3), 67);
        assert_eq!(attendance_rate(1, 3), 33);
        assert_eq!(attendance_rate(1, 2), 50);
        assert_eq!(attendance_rate(1, 8), 13);
    }

    #[test]
    fn rate_is_zero_without_members() {
        assert_eq!(attendance_rate(0, 0), 0);
        assert_eq!(attendance_rate(5, 0), 0);
    }

    #[test]
    fn rate_never_exceeds_100() {
        assert_eq!(attendance_rate(3, 3), 100);
        assert_eq!(attendance_rate(7, 3), 100);
    }

    #[test]
    fn average_of_no_events_is_zero() {
        assert_eq!(average_rate(&[]), 0);
    }
}
