use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{extractors::CurrentUser, metrics::repo::UserMetrics, state::AppState};

use super::dto::{SaveTargetsRequest, TargetsResponse};
use super::repo::NutritionTargets;
use super::services;

pub fn targets_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/nutrition-targets",
            get(get_targets).put(put_targets),
        )
        .route("/users/nutrition-targets/reset", post(reset_targets))
}

/// Stored targets, or freshly derived ones when the user has metrics but
/// no targets yet.
#[instrument(skip(state))]
pub async fn get_targets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<TargetsResponse>, (StatusCode, String)> {
    let metrics = UserMetrics::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    let targets = match NutritionTargets::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?
    {
        Some(targets) => targets,
        None => {
            let Some(metrics) = metrics.as_ref() else {
                return Err((
                    StatusCode::NOT_FOUND,
                    "No nutrition targets or metrics found. Please set your metrics first."
                        .to_string(),
                ));
            };
            let derived = services::derive_targets(metrics, state.config.nutrition.macro_split())
                .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
            NutritionTargets::upsert_auto(&state.db, user_id, &derived)
                .await
                .map_err(internal)?
        }
    };

    Ok(Json(TargetsResponse::from_record(targets, metrics.as_ref())))
}

/// Manually set targets; marks them custom so metric changes stop
/// overwriting them.
#[instrument(skip(state, payload))]
pub async fn put_targets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<SaveTargetsRequest>,
) -> Result<Json<TargetsResponse>, (StatusCode, String)> {
    if let Err(msg) = payload.validate(state.config.nutrition.macro_calorie_margin) {
        warn!(%user_id, %msg, "invalid targets payload");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    let targets = NutritionTargets::upsert_custom(
        &state.db,
        user_id,
        payload.calories,
        payload.protein,
        payload.carbohydrates,
        payload.fat,
        payload.micronutrients,
    )
    .await
    .map_err(internal)?;

    let metrics = UserMetrics::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    info!(%user_id, "custom targets saved");
    Ok(Json(TargetsResponse::from_record(targets, metrics.as_ref())))
}

/// Drop custom values and re-derive targets from the stored metrics.
#[instrument(skip(state))]
pub async fn reset_targets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<TargetsResponse>, (StatusCode, String)> {
    let metrics = UserMetrics::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::BAD_REQUEST,
            "User metrics not found. Please set your metrics first.".to_string(),
        ))?;

    let derived = services::derive_targets(&metrics, state.config.nutrition.macro_split())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let targets = NutritionTargets::upsert_auto(&state.db, user_id, &derived)
        .await
        .map_err(internal)?;

    info!(%user_id, "targets reset to derived values");
    Ok(Json(TargetsResponse::from_record(targets, Some(&metrics))))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
