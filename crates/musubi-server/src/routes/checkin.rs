use axum::Json;
use axum::extract::{Path, State};
use musubi_core::push::PushSender;
use musubi_service::CheckInOutcome;
use serde::Deserialize;
use surrealdb::Connection;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckInBody {
    /// Raw text decoded from the member's QR code.
    pub payload: String,
}

pub async fn check_in<C, S>(
    State(state): State<AppState<C, S>>,
    Path((circle_id, event_id)): Path<(Uuid, Uuid)>,
    Caller(caller): Caller,
    Json(body): Json<CheckInBody>,
) -> Result<Json<CheckInOutcome>, ApiError>
where
    C: Connection,
    S: PushSender + 'static,
{
    let outcome = state
        .attendance()
        .check_in_from_qr(circle_id, event_id, &body.payload, &caller.uid)
        .await?;
    Ok(Json(outcome))
}
