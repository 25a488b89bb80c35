use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::FoodNutrition;

/// Catalog food with per-serving composition. Owned by the catalog; logged
/// entries only reference it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FoodItem {
    pub id: Uuid,
    pub name: String,
    pub serving_size: f64,
    pub calories_per_serving: f64,
    pub protein_content: f64,
    pub fat_content: f64,
    pub carbohydrate_content: f64,
    pub micronutrients: Json<HashMap<String, f64>>,
    pub created_at: OffsetDateTime,
}

impl FoodItem {
    /// Per-serving values in the shape the nutrition core scales.
    pub fn nutrition(&self) -> FoodNutrition {
        FoodNutrition {
            calories: self.calories_per_serving,
            protein: self.protein_content,
            fat: self.fat_content,
            carbohydrates: self.carbohydrate_content,
            micronutrients: self.micronutrients.0.clone(),
        }
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FoodItem>> {
        let food = sqlx::query_as::<_, FoodItem>(
            r#"
            SELECT id, name, serving_size, calories_per_serving, protein_content,
                   fat_content, carbohydrate_content, micronutrients, created_at
            FROM food_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(food)
    }

    pub async fn list(
        db: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<FoodItem>> {
        let rows = sqlx::query_as::<_, FoodItem>(
            r#"
            SELECT id, name, serving_size, calories_per_serving, protein_content,
                   fat_content, carbohydrate_content, micronutrients, created_at
            FROM food_items
            WHERE $1::text IS NULL OR name ILIKE '%' || $1 || '%'
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        name: &str,
        serving_size: f64,
        calories_per_serving: f64,
        protein_content: f64,
        fat_content: f64,
        carbohydrate_content: f64,
        micronutrients: HashMap<String, f64>,
    ) -> anyhow::Result<FoodItem> {
        let food = sqlx::query_as::<_, FoodItem>(
            r#"
            INSERT INTO food_items
                (name, serving_size, calories_per_serving, protein_content,
                 fat_content, carbohydrate_content, micronutrients)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, serving_size, calories_per_serving, protein_content,
                      fat_content, carbohydrate_content, micronutrients, created_at
            "#,
        )
        .bind(name)
        .bind(serving_size)
        .bind(calories_per_serving)
        .bind(protein_content)
        .bind(fat_content)
        .bind(carbohydrate_content)
        .bind(Json(micronutrients))
        .fetch_one(db)
        .await?;
        Ok(food)
    }

    /// Number of logged entries still referencing this food. Deletion is
    /// refused while this is non-zero so historical logs stay resolvable.
    pub async fn log_entry_count(db: &PgPool, id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as(r#"SELECT COUNT(*) FROM food_log_entries WHERE food_id = $1"#)
                .bind(id)
                .fetch_one(db)
                .await?;
        Ok(count)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM food_items WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
