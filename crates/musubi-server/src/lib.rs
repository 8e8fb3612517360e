//! Musubi Server: HTTP surface over the circle management services.

pub mod auth;
pub mod config;
pub mod error;
pub mod push;
pub mod routes;
pub mod state;

use axum::Router;
use musubi_core::push::PushSender;
use surrealdb::Connection;

pub use state::AppState;

/// Build the router with all routes bound to `state`.
pub fn app<C, S>(state: AppState<C, S>) -> Router
where
    C: Connection,
    S: PushSender + 'static,
{
    routes::router::<C, S>().with_state(state)
}
