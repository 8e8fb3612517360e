//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;
use musubi_core::push::PushSender;
use musubi_db::repository::{
    SurrealAttendanceRepository, SurrealEventRepository, SurrealMemberRepository,
    SurrealNotificationLogRepository, SurrealPaymentRepository, SurrealUserProfileRepository,
};
use musubi_service::{AnalyticsService, AttendanceService, ReminderService, ServiceConfig};
use surrealdb::{Connection, Surreal};

use crate::auth::TokenVerifier;

pub type SurrealAttendanceService<C> = AttendanceService<
    SurrealMemberRepository<C>,
    SurrealEventRepository<C>,
    SurrealAttendanceRepository<C>,
    SurrealPaymentRepository<C>,
>;

pub type SurrealAnalyticsService<C> = AnalyticsService<
    SurrealMemberRepository<C>,
    SurrealEventRepository<C>,
    SurrealAttendanceRepository<C>,
    SurrealPaymentRepository<C>,
>;

pub type SurrealReminderService<C, S> = ReminderService<
    SurrealMemberRepository<C>,
    SurrealUserProfileRepository<C>,
    SurrealNotificationLogRepository<C>,
    S,
>;

struct Inner<C: Connection, S: PushSender> {
    verifier: Arc<TokenVerifier>,
    attendance: SurrealAttendanceService<C>,
    analytics: SurrealAnalyticsService<C>,
    reminders: SurrealReminderService<C, S>,
}

pub struct AppState<C: Connection, S: PushSender> {
    inner: Arc<Inner<C, S>>,
}

impl<C: Connection, S: PushSender> Clone for AppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection, S: PushSender> AppState<C, S> {
    pub fn new(db: Surreal<C>, sender: S, verifier: TokenVerifier, config: ServiceConfig) -> Self {
        let members = || SurrealMemberRepository::new(db.clone());
        let events = || SurrealEventRepository::new(db.clone());
        let attendance = || SurrealAttendanceRepository::new(db.clone());
        let payments = || SurrealPaymentRepository::new(db.clone());

        let inner = Inner {
            verifier: Arc::new(verifier),
            attendance: AttendanceService::new(
                members(),
                events(),
                attendance(),
                payments(),
                config.clone(),
            ),
            analytics: AnalyticsService::new(
                members(),
                events(),
                attendance(),
                payments(),
                config.clone(),
            ),
            reminders: ReminderService::new(
                members(),
                SurrealUserProfileRepository::new(db.clone()),
                SurrealNotificationLogRepository::new(db.clone()),
                sender,
                config,
            ),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn attendance(&self) -> &SurrealAttendanceService<C> {
        &self.inner.attendance
    }

    pub fn analytics(&self) -> &SurrealAnalyticsService<C> {
        &self.inner.analytics
    }

    pub fn reminders(&self) -> &SurrealReminderService<C, S> {
        &self.inner.reminders
    }
}

impl<C: Connection, S: PushSender> FromRef<AppState<C, S>> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState<C, S>) -> Self {
        Arc::clone(&state.inner.verifier)
    }
}
