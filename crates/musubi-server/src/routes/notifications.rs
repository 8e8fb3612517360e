use axum::Json;
use axum::extract::State;
use musubi_core::push::PushSender;
use musubi_service::ReminderRequest;
use serde::{Deserialize, Serialize};
use surrealdb::Connection;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

/// Body of a reminder request. Older clients send `orgId` and
/// `recipientUid`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationBody {
    #[serde(alias = "recipientUid")]
    pub recipient_id: String,
    pub title: String,
    pub body: String,
    #[serde(alias = "orgId")]
    pub circle_id: Uuid,
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationResponse {
    pub success: bool,
    pub delivered: usize,
    pub failed: usize,
    pub removed_tokens: usize,
}

pub async fn send<C, S>(
    State(state): State<AppState<C, S>>,
    Caller(caller): Caller,
    Json(body): Json<SendNotificationBody>,
) -> Result<Json<SendNotificationResponse>, ApiError>
where
    C: Connection,
    S: PushSender + 'static,
{
    let request = ReminderRequest {
        circle_id: body.circle_id,
        event_id: body.event_id,
        recipient_uid: body.recipient_id,
        title: body.title,
        body: body.body,
    };
    let outcome = state.reminders().send_reminder(request, &caller.uid).await?;

    Ok(Json(SendNotificationResponse {
        success: true,
        delivered: outcome.delivered,
        failed: outcome.failed,
        removed_tokens: outcome.removed_tokens,
    }))
}
