use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::metrics::repo::UserMetrics;
use crate::nutrition::{calculate_macro_calories, NutritionError};

use super::repo::NutritionTargets;

/// Request body for manually entered nutrition targets.
#[derive(Debug, Deserialize)]
pub struct SaveTargetsRequest {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    #[serde(default)]
    pub micronutrients: HashMap<String, f64>,
}

impl SaveTargetsRequest {
    /// Reject targets whose macros imply more energy than the stated total,
    /// beyond the configured margin (default 5%, which absorbs rounding).
    pub fn validate(&self, margin: f64) -> Result<(), String> {
        let fields = [self.calories, self.protein, self.carbohydrates, self.fat];
        if fields.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err("Targets must be non-negative numbers.".into());
        }

        let macro_calories = calculate_macro_calories(self.protein, self.carbohydrates, self.fat);
        if macro_calories > self.calories * margin {
            return Err(NutritionError::MacroCaloriesExceedTarget {
                macro_calories,
                calories: self.calories,
            }
            .to_string());
        }
        Ok(())
    }
}

/// Targets plus the derived energy numbers when metrics exist.
#[derive(Debug, Serialize)]
pub struct TargetsResponse {
    pub calories: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub fat: f64,
    pub micronutrients: HashMap<String, f64>,
    pub is_custom: bool,
    pub bmr: Option<f64>,
    pub tdee: Option<f64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TargetsResponse {
    /// `bmr`/`tdee` are `None` when the user has no metrics; absence is a
    /// value here, not an error path.
    pub fn from_record(targets: NutritionTargets, metrics: Option<&UserMetrics>) -> Self {
        Self {
            calories: targets.calories,
            protein: targets.protein,
            carbohydrates: targets.carbohydrates,
            fat: targets.fat,
            micronutrients: targets.micronutrients.0,
            is_custom: targets.is_custom,
            bmr: metrics.and_then(|m| m.bmr().ok()),
            tdee: metrics.and_then(|m| m.tdee().ok()),
            created_at: targets.created_at,
            updated_at: targets.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(calories: f64, protein: f64, carbohydrates: f64, fat: f64) -> SaveTargetsRequest {
        SaveTargetsRequest {
            calories,
            protein,
            carbohydrates,
            fat,
            micronutrients: HashMap::new(),
        }
    }

    #[test]
    fn accepts_macros_within_the_margin() {
        // 600 + 800 + 600.03 = 2000.03 kcal, inside 5% of 2000
        assert!(request(2000.0, 150.0, 200.0, 66.67).validate(1.05).is_ok());
    }

    #[test]
    fn rejects_macros_exceeding_the_margin() {
        // 800 + 800 + 900 = 2500 kcal against a 2000 kcal target
        let msg = request(2000.0, 200.0, 200.0, 100.0)
            .validate(1.05)
            .unwrap_err();
        assert!(msg.contains("2500"), "{msg}");
        assert!(msg.contains("2000"), "{msg}");
    }

    #[test]
    fn margin_boundary_is_exclusive() {
        // exactly 2100 kcal of macros against 2000 * 1.05
        assert!(request(2000.0, 150.0, 225.0, 66.6666666667)
            .validate(1.05)
            .is_ok());
    }

    #[test]
    fn rejects_negative_or_non_finite_fields() {
        assert!(request(2000.0, -10.0, 200.0, 60.0).validate(1.05).is_err());
        assert!(request(f64::INFINITY, 10.0, 20.0, 6.0).validate(1.05).is_err());
    }

    #[test]
    fn a_wider_margin_admits_more() {
        let req = request(2000.0, 200.0, 200.0, 100.0);
        assert!(req.validate(1.05).is_err());
        assert!(req.validate(1.30).is_ok());
    }
}
