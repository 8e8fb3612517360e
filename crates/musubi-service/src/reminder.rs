//! Reminder dispatcher.
//!
//! Sends a payment reminder to one member through the push capability.
//! Tokens the capability reports as permanently invalid are removed from
//! the recipient. Every attempt that reaches the capability appends
//! exactly one notification log row, whether it succeeded or not.

use std::collections::BTreeMap;

use musubi_core::error::{MusubiError, MusubiResult};
use musubi_core::models::notification::{CreateNotificationLog, NotificationLog};
use musubi_core::push::{DeliveryOutcome, PushMessage, PushSender};
use musubi_core::repository::{
    MemberRepository, NotificationLogRepository, UserProfileRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::guard::require_organizer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub circle_id: Uuid,
    pub event_id: Uuid,
    pub recipient_uid: String,
    pub title: String,
    pub body: String,
}

/// Per-token tally of a dispatch that reached the push capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderOutcome {
    pub delivered: usize,
    pub failed: usize,
    /// Tokens dropped from the recipient as permanently invalid.
    pub removed_tokens: usize,
}

pub struct ReminderService<M, U, N, S>
where
    M: MemberRepository,
    U: UserProfileRepository,
    N: NotificationLogRepository,
    S: PushSender,
{
    members: M,
    users: U,
    logs: N,
    sender: S,
    config: ServiceConfig,
}

impl<M, U, N, S> ReminderService<M, U, N, S>
where
    M: MemberRepository,
    U: UserProfileRepository,
    N: NotificationLogRepository,
    S: PushSender,
{
    pub fn new(members: M, users: U, logs: N, sender: S, config: ServiceConfig) -> Self {
        Self {
            members,
            users,
            logs,
            sender,
            config,
        }
    }

    /// Send a reminder on behalf of an organizer.
    ///
    /// Fails with [`MusubiError::NoDeliveryTarget`] before sending if the
    /// recipient has no registered tokens, and with
    /// [`MusubiError::DeliveryFailure`] if the push call itself fails.
    /// Per-token failures do not fail the call.
    pub async fn send_reminder(
        &self,
        request: ReminderRequest,
        actor: &str,
    ) -> MusubiResult<ReminderOutcome> {
        require_organizer(&self.members, request.circle_id, actor).await?;

        let tokens = match self.users.get(&request.recipient_uid).await {
            Ok(profile) => profile.push_tokens,
            Err(MusubiError::NotFound { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };
        if tokens.is_empty() {
            return Err(MusubiError::NoDeliveryTarget {
                recipient: request.recipient_uid,
            });
        }

        let message = self.message(&request, tokens);
        let sent = self.sender.send(&message).await;

        let (outcome, failure) = match sent {
            Ok(deliveries) => {
                let mut outcome = ReminderOutcome::default();
                let mut invalid = Vec::new();
                for delivery in deliveries {
                    match delivery.outcome {
                        DeliveryOutcome::Delivered => outcome.delivered += 1,
                        DeliveryOutcome::InvalidToken => {
                            outcome.failed += 1;
                            invalid.push(delivery.token);
                        }
                        DeliveryOutcome::Failed(reason) => {
                            outcome.failed += 1;
                            warn!(recipient = %request.recipient_uid, %reason, "Push delivery failed");
                        }
                    }
                }
                if !invalid.is_empty() {
                    match self
                        .users
                        .remove_push_tokens(&request.recipient_uid, &invalid)
                        .await
                    {
                        Ok(()) => outcome.removed_tokens = invalid.len(),
                        Err(e) => {
                            warn!(recipient = %request.recipient_uid, error = %e, "Failed to remove invalid tokens")
                        }
                    }
                }
                (Some(outcome), None)
            }
            Err(e) => (None, Some(e.to_string())),
        };

        let log = self
            .logs
            .append(CreateNotificationLog {
                circle_id: request.circle_id,
                event_id: request.event_id,
                recipient_uid: request.recipient_uid.clone(),
                notification_type: self.config.reminder_type,
                sent_by: actor.to_string(),
                title: request.title,
                body: request.body,
                success: failure.is_none(),
                error: failure.clone(),
            })
            .await;

        match (outcome, failure) {
            (Some(outcome), _) => {
                log?;
                info!(
                    circle_id = %request.circle_id,
                    event_id = %request.event_id,
                    recipient = %request.recipient_uid,
                    delivered = outcome.delivered,
                    failed = outcome.failed,
                    removed_tokens = outcome.removed_tokens,
                    "Sent payment reminder"
                );
                Ok(outcome)
            }
            (None, failure) => {
                if let Err(e) = log {
                    error!(error = %e, "Failed to record notification log");
                }
                let reason = failure.unwrap_or_default();
                warn!(recipient = %request.recipient_uid, %reason, "Payment reminder failed");
                Err(MusubiError::DeliveryFailure(reason))
            }
        }
    }

    /// Reminder history of an event, newest first. Organizer only.
    pub async fn list_notification_logs(
        &self,
        circle_id: Uuid,
        event_id: Uuid,
        actor: &str,
    ) -> MusubiResult<Vec<NotificationLog>> {
        require_organizer(&self.members, circle_id, actor).await?;
        self.logs.list_for_event(circle_id, event_id).await
    }

    fn message(&self, request: &ReminderRequest, tokens: Vec<String>) -> PushMessage {
        let mut data = BTreeMap::new();
        data.insert("circleId".to_string(), request.circle_id.to_string());
        data.insert("eventId".to_string(), request.event_id.to_string());
        data.insert("type".to_string(), self.config.reminder_type.as_str().to_string());

        PushMessage {
            tokens,
            title: request.title.clone(),
            body: request.body.clone(),
            data,
            link: Some(format!(
                "/circles/{}/events/{}/payments",
                request.circle_id, request.event_id
            )),
        }
    }
}
