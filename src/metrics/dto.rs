use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::nutrition::calculator::{activity_multiplier, valid_activity_levels};
use crate::nutrition::NutritionError;

use super::repo::UserMetrics;

/// Request body for creating or updating physical metrics.
#[derive(Debug, Deserialize)]
pub struct SaveMetricsRequest {
    pub height: f64,
    pub weight: f64,
    pub age: i32,
    pub gender: String,
    pub activity_level: String,
}

impl SaveMetricsRequest {
    /// Bounds checks the calculator itself deliberately skips.
    pub fn validate(&self) -> Result<(), String> {
        if !self.height.is_finite() || self.height < 50.0 || self.height > 300.0 {
            return Err("Height must be between 50 and 300 cm.".into());
        }
        if !self.weight.is_finite() || self.weight < 20.0 || self.weight > 500.0 {
            return Err("Weight must be between 20 and 500 kg.".into());
        }
        if self.age < 1 || self.age > 150 {
            return Err("Age must be between 1 and 150.".into());
        }
        if self.gender != "M" && self.gender != "F" {
            return Err("Gender must be 'M' or 'F'.".into());
        }
        if activity_multiplier(&self.activity_level).is_none() {
            return Err(format!(
                "Invalid activity level. Must be one of: {}",
                valid_activity_levels()
            ));
        }
        Ok(())
    }
}

/// Metrics plus the derived energy numbers.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub height: f64,
    pub weight: f64,
    pub age: i32,
    pub gender: String,
    pub activity_level: String,
    pub bmr: f64,
    pub tdee: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl MetricsResponse {
    pub fn from_record(metrics: UserMetrics) -> Result<Self, NutritionError> {
        let bmr = metrics.bmr()?;
        let tdee = metrics.tdee()?;
        Ok(Self {
            height: metrics.height,
            weight: metrics.weight,
            age: metrics.age,
            gender: metrics.gender,
            activity_level: metrics.activity_level,
            bmr,
            tdee,
            created_at: metrics.created_at,
            updated_at: metrics.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> SaveMetricsRequest {
        SaveMetricsRequest {
            height: 175.0,
            weight: 70.0,
            age: 25,
            gender: "M".to_string(),
            activity_level: "moderate".to_string(),
        }
    }

    #[test]
    fn accepts_in_bounds_metrics() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_height() {
        for height in [49.9, 300.1, f64::NAN] {
            let mut req = valid_request();
            req.height = height;
            let err = req.validate().unwrap_err();
            assert!(err.contains("Height"));
        }
    }

    #[test]
    fn rejects_out_of_bounds_weight() {
        for weight in [19.9, 500.5] {
            let mut req = valid_request();
            req.weight = weight;
            let err = req.validate().unwrap_err();
            assert!(err.contains("Weight"));
        }
    }

    #[test]
    fn rejects_out_of_bounds_age() {
        for age in [0, -3, 151] {
            let mut req = valid_request();
            req.age = age;
            let err = req.validate().unwrap_err();
            assert!(err.contains("Age"));
        }
    }

    #[test]
    fn rejects_normalized_gender_codes() {
        for gender in ["Male", "m", ""] {
            let mut req = valid_request();
            req.gender = gender.to_string();
            let err = req.validate().unwrap_err();
            assert!(err.contains("Gender"));
        }
    }

    #[test]
    fn rejects_unknown_activity_level_and_lists_valid_ones() {
        let mut req = valid_request();
        req.activity_level = "couch".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.contains("sedentary"));
        assert!(err.contains("very_active"));
    }

    #[test]
    fn boundary_values_are_accepted() {
        let mut req = valid_request();
        req.height = 50.0;
        req.weight = 500.0;
        req.age = 150;
        assert!(req.validate().is_ok());
    }
}
