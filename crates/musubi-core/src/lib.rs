//! Musubi Core: shared domain types, the error type, and the contracts
//! the rest of the workspace programs against.
//!
//! - [`models`]: circles, members, guests, events, attendance, payments,
//!   notification logs and user profiles
//! - [`repository`]: the document store contract, one trait per collection
//! - [`push`]: the push notification capability
//! - [`qr`]: the payload encoded in member check-in QR codes

pub mod error;
pub mod models;
pub mod push;
pub mod qr;
pub mod repository;
