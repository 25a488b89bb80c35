use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use time::{Date, Duration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    extractors::CurrentUser, foods::repo::FoodItem, state::AppState,
    targets::repo::NutritionTargets,
};

use super::dto::{
    parse_date, pct, round1, Adherence, CreateEntryRequest, DailyLogListItem, DailyLogQuery,
    DailyLogResponse, EntryResponse, HistoryQuery, PeriodStatistics, StatisticsQuery,
    StatisticsResponse, UpdateEntryRequest,
};
use super::repo::{DailyLog, FoodLogEntry};
use super::services;

const MAX_HISTORY_DAYS: i64 = 90;
const STREAK_LOOKBACK_DAYS: i64 = 366;

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/daily-log", get(get_daily_log))
        .route("/daily-log/history", get(get_history))
        .route("/daily-log/entries", post(create_entry))
        .route(
            "/daily-log/entries/:id",
            put(update_entry).delete(delete_entry),
        )
        .route("/nutrition-statistics", get(get_statistics))
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Log for one date, created empty on first access.
#[instrument(skip(state))]
pub async fn get_daily_log(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<DailyLogQuery>,
) -> Result<Json<DailyLogResponse>, (StatusCode, String)> {
    let date = match query.date.as_deref() {
        Some(raw) => parse_date(raw).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?,
        None => today(),
    };

    let log = DailyLog::get_or_create(&state.db, user_id, date)
        .await
        .map_err(internal)?;
    let entries = FoodLogEntry::list_for_log_with_food(&state.db, log.id)
        .await
        .map_err(internal)?;
    let targets = NutritionTargets::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    Ok(Json(DailyLogResponse::assemble(
        log,
        entries,
        targets.as_ref(),
    )))
}

/// Logs over a date range, newest first. Defaults to the last 7 days;
/// the range is clamped to 90 days.
#[instrument(skip(state))]
pub async fn get_history(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<DailyLogListItem>>, (StatusCode, String)> {
    let end = query
        .end_date
        .as_deref()
        .and_then(|raw| parse_date(raw).ok())
        .unwrap_or_else(today);
    let mut start = query
        .start_date
        .as_deref()
        .and_then(|raw| parse_date(raw).ok())
        .unwrap_or_else(|| end - Duration::days(7));

    if (end - start).whole_days() > MAX_HISTORY_DAYS {
        start = end - Duration::days(MAX_HISTORY_DAYS);
    }

    let logs = DailyLog::list_range(&state.db, user_id, start, end)
        .await
        .map_err(internal)?;
    Ok(Json(logs.into_iter().map(DailyLogListItem::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), (StatusCode, String)> {
    if let Err(msg) = payload.validate() {
        warn!(%user_id, %msg, "invalid entry payload");
        return Err((StatusCode::BAD_REQUEST, msg));
    }
    let date = match payload.date.as_deref() {
        Some(raw) => parse_date(raw).map_err(|msg| (StatusCode::BAD_REQUEST, msg))?,
        None => today(),
    };

    let food = FoodItem::find_by_id(&state.db, payload.food_id)
        .await
        .map_err(internal)?
        .ok_or((StatusCode::NOT_FOUND, "Food not found".to_string()))?;

    let serving_unit = payload.serving_unit.as_deref().unwrap_or("serving");
    let change = services::add_entry(
        &state.db,
        user_id,
        date,
        &food,
        payload.serving_size,
        serving_unit,
        &payload.meal_type,
    )
    .await
    .map_err(internal)?;

    info!(%user_id, entry_id = %change.entry.id, food_id = %food.id, "food logged");
    Ok((
        StatusCode::CREATED,
        Json(EntryResponse::from_entry(change.entry, food.name)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEntryRequest>,
) -> Result<Json<EntryResponse>, (StatusCode, String)> {
    if let Err(msg) = payload.validate() {
        warn!(%user_id, %msg, "invalid entry payload");
        return Err((StatusCode::BAD_REQUEST, msg));
    }

    let entry = FoodLogEntry::find_for_user(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Food log entry not found.".to_string(),
        ))?;

    // Protect-on-delete keeps the food around as long as entries reference it.
    let food = FoodItem::find_by_id(&state.db, entry.food_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            error!(food_id = %entry.food_id, "logged food missing from catalog");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Referenced food missing".to_string(),
            )
        })?;

    let serving_size = payload.serving_size.unwrap_or(entry.serving_size);
    let serving_unit = payload
        .serving_unit
        .clone()
        .unwrap_or_else(|| entry.serving_unit.clone());
    let meal_type = payload
        .meal_type
        .clone()
        .unwrap_or_else(|| entry.meal_type.clone());

    let change = services::update_entry(
        &state.db,
        &entry,
        &food,
        serving_size,
        &serving_unit,
        &meal_type,
    )
    .await
    .map_err(internal)?;

    info!(%user_id, entry_id = %change.entry.id, "entry updated");
    Ok(Json(EntryResponse::from_entry(change.entry, food.name)))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    let entry = FoodLogEntry::find_for_user(&state.db, user_id, id)
        .await
        .map_err(internal)?
        .ok_or((
            StatusCode::NOT_FOUND,
            "Food log entry not found.".to_string(),
        ))?;

    services::remove_entry(&state.db, &entry)
        .await
        .map_err(internal)?;

    info!(%user_id, entry_id = %entry.id, "entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Averages, days logged, streak and target adherence for the last week
/// or month.
#[instrument(skip(state))]
pub async fn get_statistics(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<StatisticsResponse>, (StatusCode, String)> {
    let period = match query.period.as_deref() {
        Some("month") => "month",
        _ => "week",
    };
    let end = today();
    let start = match period {
        "month" => end - Duration::days(30),
        _ => end - Duration::days(7),
    };

    let stats = DailyLog::stats_for_range(&state.db, user_id, start, end)
        .await
        .map_err(internal)?;

    let lookback = end - Duration::days(STREAK_LOOKBACK_DAYS);
    let logged_dates = DailyLog::logged_dates_since(&state.db, user_id, lookback)
        .await
        .map_err(internal)?;
    let streak_days = services::streak_from_dates(end, &logged_dates);

    let targets = NutritionTargets::find_by_user(&state.db, user_id)
        .await
        .map_err(internal)?;

    let adherence = match (&targets, stats.avg_calories) {
        (Some(targets), Some(avg_calories)) => Some(Adherence {
            calories: pct(avg_calories, targets.calories),
            protein: pct(stats.avg_protein.unwrap_or(0.0), targets.protein),
            carbohydrates: pct(
                stats.avg_carbohydrates.unwrap_or(0.0),
                targets.carbohydrates,
            ),
            fat: pct(stats.avg_fat.unwrap_or(0.0), targets.fat),
        }),
        _ => None,
    };

    Ok(Json(StatisticsResponse {
        period: period.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        statistics: PeriodStatistics {
            avg_calories: round1(stats.avg_calories.unwrap_or(0.0)),
            avg_protein: round1(stats.avg_protein.unwrap_or(0.0)),
            avg_carbohydrates: round1(stats.avg_carbohydrates.unwrap_or(0.0)),
            avg_fat: round1(stats.avg_fat.unwrap_or(0.0)),
            days_logged: stats.days_logged,
            streak_days,
            adherence,
        },
    }))
}

fn internal(e: anyhow::Error) -> (StatusCode, String) {
    error!(error = %e, "internal error");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
