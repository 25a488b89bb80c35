use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::nutrition::{DailyTotals, EntryNutrition};

/// One user's nutrition log for one calendar date, with aggregate totals
/// derived from its entries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbohydrates: f64,
    pub micronutrients_summary: Json<HashMap<String, f64>>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// One logged food with its nutrition snapshot for the chosen serving.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodLogEntry {
    pub id: Uuid,
    pub daily_log_id: Uuid,
    pub food_id: Uuid,
    pub serving_size: f64,
    pub serving_unit: String,
    pub meal_type: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: Json<HashMap<String, f64>>,
    pub logged_at: OffsetDateTime,
}

/// Entry row joined with its food's name, for log listings.
#[derive(Debug, Clone, FromRow)]
pub struct LoggedEntryRow {
    pub id: Uuid,
    pub daily_log_id: Uuid,
    pub food_id: Uuid,
    pub food_name: String,
    pub serving_size: f64,
    pub serving_unit: String,
    pub meal_type: String,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: Json<HashMap<String, f64>>,
    pub logged_at: OffsetDateTime,
}

/// Averages over a date range, `None` when no logs exist.
#[derive(Debug, FromRow)]
pub struct NutritionStats {
    pub avg_calories: Option<f64>,
    pub avg_protein: Option<f64>,
    pub avg_carbohydrates: Option<f64>,
    pub avg_fat: Option<f64>,
    pub days_logged: i64,
}

impl DailyLog {
    pub async fn find_by_date(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<DailyLog>> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, date, total_calories, total_protein, total_fat,
                   total_carbohydrates, micronutrients_summary, created_at, updated_at
            FROM daily_logs
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await?;
        Ok(log)
    }

    /// Fetch the log for a date, creating an empty one when absent.
    pub async fn get_or_create(db: &PgPool, user_id: Uuid, date: Date) -> anyhow::Result<DailyLog> {
        if let Some(log) = Self::find_by_date(db, user_id, date).await? {
            return Ok(log);
        }

        let inserted = sqlx::query_as::<_, DailyLog>(
            r#"
            INSERT INTO daily_logs (user_id, date)
            VALUES ($1, $2)
            ON CONFLICT (user_id, date) DO NOTHING
            RETURNING id, user_id, date, total_calories, total_protein, total_fat,
                      total_carbohydrates, micronutrients_summary, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await?;

        match inserted {
            Some(log) => Ok(log),
            // a concurrent request created it first
            None => Self::find_by_date(db, user_id, date)
                .await?
                .context("daily log missing after conflicting insert"),
        }
    }

    /// Same as [`get_or_create`](Self::get_or_create) but inside a
    /// transaction, returning the row locked until commit.
    pub async fn get_or_create_for_update(
        txn: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<DailyLog> {
        sqlx::query(
            r#"
            INSERT INTO daily_logs (user_id, date)
            VALUES ($1, $2)
            ON CONFLICT (user_id, date) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(date)
        .execute(&mut **txn)
        .await?;

        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, date, total_calories, total_protein, total_fat,
                   total_carbohydrates, micronutrients_summary, created_at, updated_at
            FROM daily_logs
            WHERE user_id = $1 AND date = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&mut **txn)
        .await?;
        Ok(log)
    }

    /// Lock an existing log row for the rest of the transaction.
    pub async fn lock_for_update(
        txn: &mut Transaction<'_, Postgres>,
        daily_log_id: Uuid,
    ) -> anyhow::Result<DailyLog> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, date, total_calories, total_protein, total_fat,
                   total_carbohydrates, micronutrients_summary, created_at, updated_at
            FROM daily_logs
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(daily_log_id)
        .fetch_one(&mut **txn)
        .await?;
        Ok(log)
    }

    pub async fn update_totals(
        txn: &mut Transaction<'_, Postgres>,
        daily_log_id: Uuid,
        totals: &DailyTotals,
    ) -> anyhow::Result<DailyLog> {
        let log = sqlx::query_as::<_, DailyLog>(
            r#"
            UPDATE daily_logs
            SET total_calories = $2,
                total_protein = $3,
                total_fat = $4,
                total_carbohydrates = $5,
                micronutrients_summary = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING id, user_id, date, total_calories, total_protein, total_fat,
                      total_carbohydrates, micronutrients_summary, created_at, updated_at
            "#,
        )
        .bind(daily_log_id)
        .bind(totals.total_calories)
        .bind(totals.total_protein)
        .bind(totals.total_fat)
        .bind(totals.total_carbohydrates)
        .bind(Json(totals.micronutrients_summary.clone()))
        .fetch_one(&mut **txn)
        .await?;
        Ok(log)
    }

    pub async fn list_range(
        db: &PgPool,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<Vec<DailyLog>> {
        let rows = sqlx::query_as::<_, DailyLog>(
            r#"
            SELECT id, user_id, date, total_calories, total_protein, total_fat,
                   total_carbohydrates, micronutrients_summary, created_at, updated_at
            FROM daily_logs
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Logged dates, newest first, for streak counting.
    pub async fn logged_dates_since(
        db: &PgPool,
        user_id: Uuid,
        since: Date,
    ) -> anyhow::Result<Vec<Date>> {
        let dates = sqlx::query_scalar::<_, Date>(
            r#"
            SELECT date FROM daily_logs
            WHERE user_id = $1 AND date >= $2
            ORDER BY date DESC
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(db)
        .await?;
        Ok(dates)
    }

    pub async fn stats_for_range(
        db: &PgPool,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<NutritionStats> {
        let stats = sqlx::query_as::<_, NutritionStats>(
            r#"
            SELECT AVG(total_calories) AS avg_calories,
                   AVG(total_protein) AS avg_protein,
                   AVG(total_carbohydrates) AS avg_carbohydrates,
                   AVG(total_fat) AS avg_fat,
                   COUNT(*) AS days_logged
            FROM daily_logs
            WHERE user_id = $1 AND date >= $2 AND date <= $3
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(db)
        .await?;
        Ok(stats)
    }
}

impl FoodLogEntry {
    /// The stored snapshot in the shape the recalculator sums.
    pub fn nutrition(&self) -> EntryNutrition {
        EntryNutrition {
            calories: self.calories,
            protein: self.protein,
            fat: self.fat,
            carbohydrates: self.carbohydrates,
            micronutrients: self.micronutrients.0.clone(),
        }
    }

    pub async fn insert(
        txn: &mut Transaction<'_, Postgres>,
        daily_log_id: Uuid,
        food_id: Uuid,
        serving_size: f64,
        serving_unit: &str,
        meal_type: &str,
        snapshot: &EntryNutrition,
    ) -> anyhow::Result<FoodLogEntry> {
        let entry = sqlx::query_as::<_, FoodLogEntry>(
            r#"
            INSERT INTO food_log_entries
                (daily_log_id, food_id, serving_size, serving_unit, meal_type,
                 calories, protein, carbohydrates, fat, micronutrients)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, daily_log_id, food_id, serving_size, serving_unit, meal_type,
                      calories, protein, carbohydrates, fat, micronutrients, logged_at
            "#,
        )
        .bind(daily_log_id)
        .bind(food_id)
        .bind(serving_size)
        .bind(serving_unit)
        .bind(meal_type)
        .bind(snapshot.calories)
        .bind(snapshot.protein)
        .bind(snapshot.carbohydrates)
        .bind(snapshot.fat)
        .bind(Json(snapshot.micronutrients.clone()))
        .fetch_one(&mut **txn)
        .await?;
        Ok(entry)
    }

    pub async fn update(
        txn: &mut Transaction<'_, Postgres>,
        entry_id: Uuid,
        serving_size: f64,
        serving_unit: &str,
        meal_type: &str,
        snapshot: &EntryNutrition,
    ) -> anyhow::Result<FoodLogEntry> {
        let entry = sqlx::query_as::<_, FoodLogEntry>(
            r#"
            UPDATE food_log_entries
            SET serving_size = $2, serving_unit = $3, meal_type = $4,
                calories = $5, protein = $6, carbohydrates = $7, fat = $8,
                micronutrients = $9
            WHERE id = $1
            RETURNING id, daily_log_id, food_id, serving_size, serving_unit, meal_type,
                      calories, protein, carbohydrates, fat, micronutrients, logged_at
            "#,
        )
        .bind(entry_id)
        .bind(serving_size)
        .bind(serving_unit)
        .bind(meal_type)
        .bind(snapshot.calories)
        .bind(snapshot.protein)
        .bind(snapshot.carbohydrates)
        .bind(snapshot.fat)
        .bind(Json(snapshot.micronutrients.clone()))
        .fetch_one(&mut **txn)
        .await?;
        Ok(entry)
    }

    pub async fn delete(txn: &mut Transaction<'_, Postgres>, entry_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(r#"DELETE FROM food_log_entries WHERE id = $1"#)
            .bind(entry_id)
            .execute(&mut **txn)
            .await?;
        Ok(())
    }

    /// Entry by id, scoped to the owning user. `None` covers both a missing
    /// entry and someone else's entry.
    pub async fn find_for_user(
        db: &PgPool,
        user_id: Uuid,
        entry_id: Uuid,
    ) -> anyhow::Result<Option<FoodLogEntry>> {
        let entry = sqlx::query_as::<_, FoodLogEntry>(
            r#"
            SELECT e.id, e.daily_log_id, e.food_id, e.serving_size, e.serving_unit,
                   e.meal_type, e.calories, e.protein, e.carbohydrates, e.fat,
                   e.micronutrients, e.logged_at
            FROM food_log_entries e
            JOIN daily_logs d ON d.id = e.daily_log_id
            WHERE e.id = $1 AND d.user_id = $2
            "#,
        )
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(entry)
    }

    pub async fn list_for_log(
        txn: &mut Transaction<'_, Postgres>,
        daily_log_id: Uuid,
    ) -> anyhow::Result<Vec<FoodLogEntry>> {
        let rows = sqlx::query_as::<_, FoodLogEntry>(
            r#"
            SELECT id, daily_log_id, food_id, serving_size, serving_unit, meal_type,
                   calories, protein, carbohydrates, fat, micronutrients, logged_at
            FROM food_log_entries
            WHERE daily_log_id = $1
            ORDER BY logged_at ASC
            "#,
        )
        .bind(daily_log_id)
        .fetch_all(&mut **txn)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_log_with_food(
        db: &PgPool,
        daily_log_id: Uuid,
    ) -> anyhow::Result<Vec<LoggedEntryRow>> {
        let rows = sqlx::query_as::<_, LoggedEntryRow>(
            r#"
            SELECT e.id, e.daily_log_id, e.food_id, f.name AS food_name, e.serving_size,
                   e.serving_unit, e.meal_type, e.calories, e.protein, e.carbohydrates,
                   e.fat, e.micronutrients, e.logged_at
            FROM food_log_entries e
            JOIN food_items f ON f.id = e.food_id
            WHERE e.daily_log_id = $1
            ORDER BY e.logged_at ASC
            "#,
        )
        .bind(daily_log_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
