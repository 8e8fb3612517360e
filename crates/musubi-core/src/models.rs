//! Domain models for Musubi.
//!
//! Every circle-scoped record carries its `circle_id` (and event-scoped
//! records their `event_id`) so collection-spanning queries never need a
//! join.

pub mod attendance;
pub mod circle;
pub mod event;
pub mod guest;
pub mod member;
pub mod notification;
pub mod payment;
pub mod user;
