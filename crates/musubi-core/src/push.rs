//! Push notification capability.
//!
//! The core only needs "send this title/body to these opaque device
//! tokens and tell me what happened to each one". Delivery itself is an
//! external service.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub tokens: Vec<String>,
    pub title: String,
    pub body: String,
    /// Key-value payload delivered alongside the notification.
    pub data: BTreeMap<String, String>,
    /// Page the client opens when the notification is tapped.
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// The token is permanently invalid and should be forgotten.
    InvalidToken,
    /// Transient failure; the token stays registered.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDelivery {
    pub token: String,
    pub outcome: DeliveryOutcome,
}

/// The send call as a whole failed; no per-token outcome is available.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("push transport error: {0}")]
    Transport(String),

    #[error("push request rejected: {0}")]
    Rejected(String),
}

pub trait PushSender: Send + Sync {
    /// Deliver `message` to each of its tokens, reporting one outcome per
    /// token in input order.
    fn send(
        &self,
        message: &PushMessage,
    ) -> impl Future<Output = Result<Vec<TokenDelivery>, PushError>> + Send;
}
