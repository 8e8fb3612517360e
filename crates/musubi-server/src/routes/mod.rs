//! HTTP routes.
//!
//! Everything under `/api` requires a verified bearer token; circle
//! roles are checked by the services on every call.

mod analytics;
mod checkin;
mod health;
mod notifications;

use axum::Router;
use axum::routing::{get, post};
use musubi_core::push::PushSender;
use surrealdb::Connection;

use crate::state::AppState;

pub fn router<C, S>() -> Router<AppState<C, S>>
where
    C: Connection,
    S: PushSender + 'static,
{
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/notifications/send",
            post(notifications::send::<C, S>),
        )
        .route(
            "/api/circles/{circle_id}/events/{event_id}/checkin",
            post(checkin::check_in::<C, S>),
        )
        .route(
            "/api/circles/{circle_id}/analytics",
            get(analytics::circle_analytics::<C, S>),
        )
}
