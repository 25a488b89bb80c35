use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::MacroTargets;

/// Daily nutrition targets. One row per user; either auto-derived from
/// metrics (`is_custom = false`) or entered manually.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NutritionTargets {
    pub user_id: Uuid,
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: Json<HashMap<String, f64>>,
    pub is_custom: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl NutritionTargets {
    pub async fn find_by_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> anyhow::Result<Option<NutritionTargets>> {
        let targets = sqlx::query_as::<_, NutritionTargets>(
            r#"
            SELECT user_id, calories, protein, carbohydrates, fat, micronutrients,
                   is_custom, created_at, updated_at
            FROM nutrition_targets
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(targets)
    }

    /// Store auto-derived macro targets. Any stored micronutrient targets
    /// are left as they are; only the macro fields and the flag change.
    pub async fn upsert_auto(
        db: &PgPool,
        user_id: Uuid,
        derived: &MacroTargets,
    ) -> anyhow::Result<NutritionTargets> {
        let targets = sqlx::query_as::<_, NutritionTargets>(
            r#"
            INSERT INTO nutrition_targets (user_id, calories, protein, carbohydrates, fat, is_custom)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            ON CONFLICT (user_id) DO UPDATE
            SET calories = EXCLUDED.calories,
                protein = EXCLUDED.protein,
                carbohydrates = EXCLUDED.carbohydrates,
                fat = EXCLUDED.fat,
                is_custom = FALSE,
                updated_at = now()
            RETURNING user_id, calories, protein, carbohydrates, fat, micronutrients,
                      is_custom, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(derived.calories)
        .bind(derived.protein_g)
        .bind(derived.carbohydrates_g)
        .bind(derived.fat_g)
        .fetch_one(db)
        .await?;
        Ok(targets)
    }

    pub async fn upsert_custom(
        db: &PgPool,
        user_id: Uuid,
        calories: f64,
        protein: f64,
        carbohydrates: f64,
        fat: f64,
        micronutrients: HashMap<String, f64>,
    ) -> anyhow::Result<NutritionTargets> {
        let targets = sqlx::query_as::<_, NutritionTargets>(
            r#"
            INSERT INTO nutrition_targets
                (user_id, calories, protein, carbohydrates, fat, micronutrients, is_custom)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (user_id) DO UPDATE
            SET calories = EXCLUDED.calories,
                protein = EXCLUDED.protein,
                carbohydrates = EXCLUDED.carbohydrates,
                fat = EXCLUDED.fat,
                micronutrients = EXCLUDED.micronutrients,
                is_custom = TRUE,
                updated_at = now()
            RETURNING user_id, calories, protein, carbohydrates, fat, micronutrients,
                      is_custom, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(calories)
        .bind(protein)
        .bind(carbohydrates)
        .bind(fat)
        .bind(Json(micronutrients))
        .fetch_one(db)
        .await?;
        Ok(targets)
    }
}
