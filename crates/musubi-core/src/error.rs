//! Error types for Musubi.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MusubiError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Payment is already confirmed")]
    AlreadyConfirmed,

    #[error("Invalid payment transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("No delivery target registered for {recipient}")]
    NoDeliveryTarget { recipient: String },

    #[error("Delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("Concurrent update of {entity}, retry")]
    Conflict { entity: String },

    #[error("A circle must keep at least one organizer")]
    LastOrganizer,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MusubiError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

pub type MusubiResult<T> = Result<T, MusubiError>;
