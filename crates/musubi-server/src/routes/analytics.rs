use axum::Json;
use axum::extract::{Path, State};
use musubi_core::push::PushSender;
use musubi_service::CircleAnalytics;
use surrealdb::Connection;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::state::AppState;

pub async fn circle_analytics<C, S>(
    State(state): State<AppState<C, S>>,
    Path(circle_id): Path<Uuid>,
    Caller(caller): Caller,
) -> Result<Json<CircleAnalytics>, ApiError>
where
    C: Connection,
    S: PushSender + 'static,
{
    let analytics = state
        .analytics()
        .circle_analytics(circle_id, &caller.uid)
        .await?;
    Ok(Json(analytics))
}
