//! Workflow error types.

use musubi_core::error::MusubiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unrecognized QR payload: {0}")]
    QrRejected(String),

    #[error("attendee {0} appears more than once in the roster")]
    DuplicateAttendee(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("organizers cannot change their own membership")]
    SelfTarget,
}

impl From<ServiceError> for MusubiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::QrRejected(_)
            | ServiceError::DuplicateAttendee(_)
            | ServiceError::EmptyField(_) => MusubiError::Validation {
                message: err.to_string(),
            },
            ServiceError::SelfTarget => MusubiError::Forbidden {
                reason: err.to_string(),
            },
        }
    }
}

/// Reject blank required text fields.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::EmptyField(field));
    }
    Ok(())
}
