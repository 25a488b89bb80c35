use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::FoodItem;

/// Request body for adding a food to the catalog.
#[derive(Debug, Deserialize)]
pub struct CreateFoodRequest {
    pub name: String,
    pub serving_size: f64,
    pub calories_per_serving: f64,
    pub protein_content: f64,
    pub fat_content: f64,
    pub carbohydrate_content: f64,
    #[serde(default)]
    pub micronutrients: HashMap<String, f64>,
}

impl CreateFoodRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Food name must not be empty.".into());
        }
        if !self.serving_size.is_finite() || self.serving_size <= 0.0 {
            return Err("Serving size must be greater than 0.".into());
        }
        let per_serving = [
            ("calories_per_serving", self.calories_per_serving),
            ("protein_content", self.protein_content),
            ("fat_content", self.fat_content),
            ("carbohydrate_content", self.carbohydrate_content),
        ];
        for (field, value) in per_serving {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a non-negative number."));
            }
        }
        for (nutrient, value) in &self.micronutrients {
            if !value.is_finite() || *value < 0.0 {
                return Err(format!("Micronutrient '{nutrient}' must be a non-negative number."));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct FoodResponse {
    pub id: Uuid,
    pub name: String,
    pub serving_size: f64,
    pub calories_per_serving: f64,
    pub protein_content: f64,
    pub fat_content: f64,
    pub carbohydrate_content: f64,
    pub micronutrients: HashMap<String, f64>,
    pub created_at: OffsetDateTime,
}

impl From<FoodItem> for FoodResponse {
    fn from(food: FoodItem) -> Self {
        Self {
            id: food.id,
            name: food.name,
            serving_size: food.serving_size,
            calories_per_serving: food.calories_per_serving,
            protein_content: food.protein_content,
            fat_content: food.fat_content,
            carbohydrate_content: food.carbohydrate_content,
            micronutrients: food.micronutrients.0,
            created_at: food.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FoodListQuery {
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateFoodRequest {
        CreateFoodRequest {
            name: "Oatmeal".to_string(),
            serving_size: 100.0,
            calories_per_serving: 150.0,
            protein_content: 5.0,
            fat_content: 3.0,
            carbohydrate_content: 27.0,
            micronutrients: HashMap::from([("Iron".to_string(), 1.5)]),
        }
    }

    #[test]
    fn accepts_a_well_formed_food() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut req = valid_request();
        req.name = "   ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_serving_size() {
        let mut req = valid_request();
        req.serving_size = 0.0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_negative_macros() {
        let mut req = valid_request();
        req.protein_content = -1.0;
        let err = req.validate().unwrap_err();
        assert!(err.contains("protein_content"));
    }

    #[test]
    fn rejects_non_finite_values() {
        let mut req = valid_request();
        req.calories_per_serving = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_negative_micronutrients() {
        let mut req = valid_request();
        req.micronutrients.insert("Zinc".to_string(), -2.0);
        let err = req.validate().unwrap_err();
        assert!(err.contains("Zinc"));
    }
}
