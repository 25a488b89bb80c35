use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{extractors::CurrentUser, state::AppState, targets};

use super::dto::{MetricsResponse, SaveMetricsRequest};
use super::repo::UserMetrics;

pub fn metrics_routes() -> Router<AppState> {
    Router::new().route("/users/metrics", get(get_metrics).post(save_metrics))
}

#[instrument(skip(state))]
pub async fn get_metrics(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<MetricsResponse>, (StatusCode, String)> {
    let metrics = UserMetrics::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "User metrics not found.".to_string(),
        ))?;

    let response = MetricsResponse::from_record(metrics)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(response))
}

/// Create-or-update metrics, then refresh the derived targets unless the
/// user has customized them.
#[instrument(skip(state, payload))]
pub async fn save_metrics(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<SaveMetricsRequest>,
) -> Result<Json<MetricsResponse>, (StatusCode, String)> {
    if let Err(msg) = payload.validate() {
        warn!(%user_id, %msg, "invalid metrics payload");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    let metrics = UserMetrics::upsert(
        &state.db,
        user_id,
        payload.height,
        payload.weight,
        payload.age,
        &payload.gender,
        &payload.activity_level,
    )
    .await
    .map_err(internal)?;

    targets::services::refresh_auto_targets(&state, &metrics)
        .await
        .map_err(internal)?;

    info!(%user_id, "metrics saved");
    let response = MetricsResponse::from_record(metrics)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(response))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
