use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::{calculate_bmr, calculate_tdee, NutritionError};

/// Physical metrics used to derive nutrition targets. One row per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserMetrics {
    pub user_id: Uuid,
    pub height: f64,
    pub weight: f64,
    pub age: i32,
    pub gender: String,
    pub activity_level: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl UserMetrics {
    pub fn bmr(&self) -> Result<f64, NutritionError> {
        calculate_bmr(self.weight, self.height, self.age.max(0) as u32, &self.gender)
    }

    pub fn tdee(&self) -> Result<f64, NutritionError> {
        calculate_tdee(self.bmr()?, &self.activity_level)
    }

    pub async fn find_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserMetrics>> {
        let metrics = sqlx::query_as::<_, UserMetrics>(
            r#"
            SELECT user_id, height, weight, age, gender, activity_level, created_at, updated_at
            FROM user_metrics
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(metrics)
    }

    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        height: f64,
        weight: f64,
        age: i32,
        gender: &str,
        activity_level: &str,
    ) -> anyhow::Result<UserMetrics> {
        let metrics = sqlx::query_as::<_, UserMetrics>(
            r#"
            INSERT INTO user_metrics (user_id, height, weight, age, gender, activity_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO UPDATE
            SET height = EXCLUDED.height,
                weight = EXCLUDED.weight,
                age = EXCLUDED.age,
                gender = EXCLUDED.gender,
                activity_level = EXCLUDED.activity_level,
                updated_at = now()
            RETURNING user_id, height, weight, age, gender, activity_level, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(height)
        .bind(weight)
        .bind(age)
        .bind(gender)
        .bind(activity_level)
        .fetch_one(db)
        .await?;
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn metrics(gender: &str, activity_level: &str) -> UserMetrics {
        UserMetrics {
            user_id: Uuid::new_v4(),
            height: 175.0,
            weight: 70.0,
            age: 25,
            gender: gender.to_string(),
            activity_level: activity_level.to_string(),
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn bmr_and_tdee_compose_the_calculator() {
        let m = metrics("M", "sedentary");
        assert_eq!(m.bmr().unwrap(), 1673.75);
        assert_eq!(m.tdee().unwrap(), 2008.5);
    }

    #[test]
    fn tdee_propagates_invalid_stored_values() {
        let m = metrics("M", "marathon");
        assert!(matches!(
            m.tdee(),
            Err(NutritionError::InvalidActivityLevel { .. })
        ));
    }
}
