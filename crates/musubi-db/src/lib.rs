//! Musubi Database: SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Versioned schema migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - One repository per collection ([`repository`]), implementing the
//!   `musubi-core` traits

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
