use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};
use uuid::Uuid;

use crate::targets::repo::NutritionTargets;

use super::repo::{DailyLog, FoodLogEntry, LoggedEntryRow};

pub const MEAL_TYPES: [&str; 4] = ["breakfast", "lunch", "dinner", "snack"];

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| "Invalid date format. Use YYYY-MM-DD.".to_string())
}

fn valid_meal_type(value: &str) -> bool {
    MEAL_TYPES.contains(&value)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percent of a target consumed; 0 when the target is unset.
pub(crate) fn pct(total: f64, target: f64) -> f64 {
    if target > 0.0 {
        round1(total / target * 100.0)
    } else {
        0.0
    }
}

/// Request body for logging a food.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub food_id: Uuid,
    pub date: Option<String>,
    pub serving_size: f64,
    pub serving_unit: Option<String>,
    pub meal_type: String,
}

impl CreateEntryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.serving_size.is_finite() || self.serving_size <= 0.0 {
            return Err("Serving size must be greater than 0.".into());
        }
        if !valid_meal_type(&self.meal_type) {
            return Err(format!(
                "Invalid meal type. Must be one of: {}",
                MEAL_TYPES.join(", ")
            ));
        }
        Ok(())
    }
}

/// Partial update of a logged entry.
#[derive(Debug, Deserialize)]
pub struct UpdateEntryRequest {
    pub serving_size: Option<f64>,
    pub serving_unit: Option<String>,
    pub meal_type: Option<String>,
}

impl UpdateEntryRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(serving_size) = self.serving_size {
            if !serving_size.is_finite() || serving_size <= 0.0 {
                return Err("Serving size must be greater than 0.".into());
            }
        }
        if let Some(meal_type) = self.meal_type.as_deref() {
            if !valid_meal_type(meal_type) {
                return Err(format!(
                    "Invalid meal type. Must be one of: {}",
                    MEAL_TYPES.join(", ")
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct DailyLogQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub meal_type: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: HashMap<String, f64>,
    pub logged_at: OffsetDateTime,
}

impl EntryResponse {
    pub fn from_entry(entry: FoodLogEntry, food_name: String) -> Self {
        Self {
            id: entry.id,
            food_id: entry.food_id,
            food_name,
            serving_size: entry.serving_size,
            serving_unit: entry.serving_unit,
            meal_type: entry.meal_type,
            calories: entry.calories,
            protein: entry.protein,
            carbohydrates: entry.carbohydrates,
            fat: entry.fat,
            micronutrients: entry.micronutrients.0,
            logged_at: entry.logged_at,
        }
    }
}

impl From<LoggedEntryRow> for EntryResponse {
    fn from(row: LoggedEntryRow) -> Self {
        Self {
            id: row.id,
            food_id: row.food_id,
            food_name: row.food_name,
            serving_size: row.serving_size,
            serving_unit: row.serving_unit,
            meal_type: row.meal_type,
            calories: row.calories,
            protein: row.protein,
            carbohydrates: row.carbohydrates,
            fat: row.fat,
            micronutrients: row.micronutrients.0,
            logged_at: row.logged_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TargetsSummary {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: HashMap<String, f64>,
}

impl From<&NutritionTargets> for TargetsSummary {
    fn from(targets: &NutritionTargets) -> Self {
        Self {
            calories: targets.calories,
            protein: targets.protein,
            carbohydrates: targets.carbohydrates,
            fat: targets.fat,
            micronutrients: targets.micronutrients.0.clone(),
        }
    }
}

/// Percent of each macro target consumed, one decimal place.
#[derive(Debug, Serialize)]
pub struct Adherence {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
}

impl Adherence {
    pub fn of_log(log: &DailyLog, targets: &NutritionTargets) -> Self {
        Self {
            calories: pct(log.total_calories, targets.calories),
            protein: pct(log.total_protein, targets.protein),
            carbohydrates: pct(log.total_carbohydrates, targets.carbohydrates),
            fat: pct(log.total_fat, targets.fat),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DailyLogResponse {
    pub date: String,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbohydrates: f64,
    pub micronutrients_summary: HashMap<String, f64>,
    pub entries: Vec<EntryResponse>,
    pub targets: Option<TargetsSummary>,
    pub adherence: Option<Adherence>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl DailyLogResponse {
    /// Missing targets render as `null` fields, not an error.
    pub fn assemble(
        log: DailyLog,
        entries: Vec<LoggedEntryRow>,
        targets: Option<&NutritionTargets>,
    ) -> Self {
        Self {
            date: log.date.to_string(),
            total_calories: log.total_calories,
            total_protein: log.total_protein,
            total_fat: log.total_fat,
            total_carbohydrates: log.total_carbohydrates,
            targets: targets.map(TargetsSummary::from),
            adherence: targets.map(|t| Adherence::of_log(&log, t)),
            micronutrients_summary: log.micronutrients_summary.0,
            entries: entries.into_iter().map(EntryResponse::from).collect(),
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }
}

/// Compact log shape for history listings, without nested entries.
#[derive(Debug, Serialize)]
pub struct DailyLogListItem {
    pub date: String,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbohydrates: f64,
    pub micronutrients_summary: HashMap<String, f64>,
}

impl From<DailyLog> for DailyLogListItem {
    fn from(log: DailyLog) -> Self {
        Self {
            date: log.date.to_string(),
            total_calories: log.total_calories,
            total_protein: log.total_protein,
            total_fat: log.total_fat,
            total_carbohydrates: log.total_carbohydrates,
            micronutrients_summary: log.micronutrients_summary.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PeriodStatistics {
    pub avg_calories: f64,
    pub avg_protein: f64,
    pub avg_carbohydrates: f64,
    pub avg_fat: f64,
    pub days_logged: i64,
    pub streak_days: u32,
    pub adherence: Option<Adherence>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub period: String,
    pub start_date: String,
    pub end_date: String,
    pub statistics: PeriodStatistics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-03-10").unwrap(), date!(2024 - 03 - 10));
    }

    #[test]
    fn rejects_malformed_dates() {
        for raw in ["03/10/2024", "2024-13-01", "yesterday", ""] {
            assert!(parse_date(raw).is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn create_request_rejects_non_positive_servings() {
        let req = CreateEntryRequest {
            food_id: Uuid::new_v4(),
            date: None,
            serving_size: 0.0,
            serving_unit: None,
            meal_type: "lunch".to_string(),
        };
        let msg = req.validate().unwrap_err();
        assert!(msg.contains("greater than 0"));
    }

    #[test]
    fn create_request_rejects_unknown_meal_type() {
        let req = CreateEntryRequest {
            food_id: Uuid::new_v4(),
            date: None,
            serving_size: 1.0,
            serving_unit: None,
            meal_type: "brunch".to_string(),
        };
        let msg = req.validate().unwrap_err();
        assert!(msg.contains("breakfast"));
        assert!(msg.contains("snack"));
    }

    #[test]
    fn update_request_only_checks_present_fields() {
        let empty = UpdateEntryRequest {
            serving_size: None,
            serving_unit: None,
            meal_type: None,
        };
        assert!(empty.validate().is_ok());

        let bad = UpdateEntryRequest {
            serving_size: Some(-1.0),
            serving_unit: None,
            meal_type: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn pct_guards_zero_targets() {
        assert_eq!(pct(1500.0, 2000.0), 75.0);
        assert_eq!(pct(1234.5, 0.0), 0.0);
    }

    #[test]
    fn pct_rounds_to_one_decimal() {
        assert_eq!(pct(1000.0, 3000.0), 33.3);
    }
}
