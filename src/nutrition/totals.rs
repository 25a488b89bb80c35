use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::calculator::aggregate_micronutrients;

/// Per-serving nutrition of a catalog food, the input to scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodNutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    #[serde(default)]
    pub micronutrients: HashMap<String, f64>,
}

/// Nutrition snapshot of one logged entry.
///
/// Taken once when the entry is created or updated; never recomputed when
/// the source food's composition changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryNutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    #[serde(default)]
    pub micronutrients: HashMap<String, f64>,
}

/// Aggregate totals of a daily log, derived from its entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotals {
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_carbohydrates: f64,
    pub micronutrients_summary: HashMap<String, f64>,
}

/// Scale a food's per-serving values by a serving-size multiplier.
///
/// The multiplier must already be validated as positive; no further checks
/// happen here.
pub fn scale_nutrition(food: &FoodNutrition, multiplier: f64) -> EntryNutrition {
    EntryNutrition {
        calories: food.calories * multiplier,
        protein: food.protein * multiplier,
        fat: food.fat * multiplier,
        carbohydrates: food.carbohydrates * multiplier,
        micronutrients: food
            .micronutrients
            .iter()
            .map(|(nutrient, value)| (nutrient.clone(), value * multiplier))
            .collect(),
    }
}

/// Re-derive a daily log's totals from its current entries.
///
/// Always a full resum over the entry snapshots, never an incremental
/// delta, so repeated calls on the same entry set are idempotent and the
/// persisted aggregate cannot drift from its constituents. Macro sums keep
/// the entries' stored precision; only the micronutrient summary is rounded
/// (by the aggregator).
pub fn recalculate_totals(entries: &[EntryNutrition]) -> DailyTotals {
    let micronutrient_maps: Vec<HashMap<String, f64>> = entries
        .iter()
        .map(|entry| entry.micronutrients.clone())
        .collect();

    DailyTotals {
        total_calories: entries.iter().map(|e| e.calories).sum(),
        total_protein: entries.iter().map(|e| e.protein).sum(),
        total_fat: entries.iter().map(|e| e.fat).sum(),
        total_carbohydrates: entries.iter().map(|e| e.carbohydrates).sum(),
        micronutrients_summary: aggregate_micronutrients(&micronutrient_maps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oatmeal() -> FoodNutrition {
        FoodNutrition {
            calories: 150.0,
            protein: 5.0,
            fat: 3.0,
            carbohydrates: 27.0,
            micronutrients: HashMap::from([
                ("Iron".to_string(), 1.5),
                ("Fiber".to_string(), 4.0),
            ]),
        }
    }

    #[test]
    fn scaling_multiplies_every_field() {
        let entry = scale_nutrition(&oatmeal(), 2.0);
        assert_eq!(entry.calories, 300.0);
        assert_eq!(entry.protein, 10.0);
        assert_eq!(entry.fat, 6.0);
        assert_eq!(entry.carbohydrates, 54.0);
        assert_eq!(entry.micronutrients["Iron"], 3.0);
        assert_eq!(entry.micronutrients["Fiber"], 8.0);
    }

    #[test]
    fn scaling_supports_fractional_servings() {
        let entry = scale_nutrition(&oatmeal(), 0.5);
        assert_eq!(entry.calories, 75.0);
        assert_eq!(entry.micronutrients["Iron"], 0.75);
    }

    #[test]
    fn snapshot_is_independent_of_later_food_changes() {
        let mut food = oatmeal();
        let entry = scale_nutrition(&food, 1.0);
        food.calories = 999.0;
        food.micronutrients.insert("Iron".to_string(), 99.0);
        assert_eq!(entry.calories, 150.0);
        assert_eq!(entry.micronutrients["Iron"], 1.5);
    }

    #[test]
    fn totals_sum_entries_and_aggregate_micronutrients() {
        let entries = vec![
            scale_nutrition(&oatmeal(), 1.0),
            scale_nutrition(&oatmeal(), 2.0),
        ];
        let totals = recalculate_totals(&entries);
        assert_eq!(totals.total_calories, 450.0);
        assert_eq!(totals.total_protein, 15.0);
        assert_eq!(totals.total_fat, 9.0);
        assert_eq!(totals.total_carbohydrates, 81.0);
        assert_eq!(totals.micronutrients_summary["Iron"], 4.5);
        assert_eq!(totals.micronutrients_summary["Fiber"], 12.0);
    }

    #[test]
    fn totals_calories_equal_sum_of_entry_calories() {
        let entries = vec![
            scale_nutrition(&oatmeal(), 0.5),
            scale_nutrition(&oatmeal(), 1.25),
            scale_nutrition(&oatmeal(), 3.0),
        ];
        let totals = recalculate_totals(&entries);
        let expected: f64 = entries.iter().map(|e| e.calories).sum();
        assert_eq!(totals.total_calories, expected);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let entries = vec![
            scale_nutrition(&oatmeal(), 1.5),
            scale_nutrition(&oatmeal(), 0.75),
        ];
        let first = recalculate_totals(&entries);
        let second = recalculate_totals(&entries);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_entry_set_yields_zero_totals() {
        let totals = recalculate_totals(&[]);
        assert_eq!(totals.total_calories, 0.0);
        assert_eq!(totals.total_protein, 0.0);
        assert_eq!(totals.total_fat, 0.0);
        assert_eq!(totals.total_carbohydrates, 0.0);
        assert!(totals.micronutrients_summary.is_empty());
    }
}
