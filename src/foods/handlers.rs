use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::state::AppState;

use super::dto::{CreateFoodRequest, FoodListQuery, FoodResponse};
use super::repo::FoodItem;

pub fn food_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods).post(create_food))
        .route("/foods/:id", get(get_food).delete(delete_food))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<FoodListQuery>,
) -> Result<Json<Vec<FoodResponse>>, (StatusCode, String)> {
    let foods = FoodItem::list(&state.db, query.search.as_deref(), query.limit, query.offset)
        .await
        .map_err(internal)?;
    Ok(Json(foods.into_iter().map(FoodResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodResponse>, (StatusCode, String)> {
    let food = FoodItem::find_by_id(&state.db, id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Food not found".to_string()))?;
    Ok(Json(food.into()))
}

#[instrument(skip(state, payload))]
pub async fn create_food(
    State(state): State<AppState>,
    Json(payload): Json<CreateFoodRequest>,
) -> Result<(StatusCode, Json<FoodResponse>), (StatusCode, String)> {
    if let Err(msg) = payload.validate() {
        warn!(%msg, "invalid food payload");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    let food = FoodItem::create(
        &state.db,
        payload.name.trim(),
        payload.serving_size,
        payload.calories_per_serving,
        payload.protein_content,
        payload.fat_content,
        payload.carbohydrate_content,
        payload.micronutrients,
    )
    .await
    .map_err(internal)?;

    info!(food_id = %food.id, name = %food.name, "food created");
    Ok((StatusCode::CREATED, Json(food.into())))
}

/// Protect-on-delete: a food referenced by logged entries stays in the
/// catalog so historical logs remain resolvable.
#[instrument(skip(state))]
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let references = FoodItem::log_entry_count(&state.db, id)
        .await
        .map_err(internal)?;
    if references > 0 {
        warn!(food_id = %id, references, "refusing to delete referenced food");
        return Err((
            StatusCode::CONFLICT,
            format!("Food is referenced by {references} logged entries and cannot be deleted."),
        ));
    }

    let deleted = FoodItem::delete(&state.db, id).await.map_err(internal)?;
    if !deleted {
        return Err((StatusCode::NOT_FOUND, "Food not found".to_string()));
    }

    info!(food_id = %id, "food deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
