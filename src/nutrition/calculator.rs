use std::collections::HashMap;

use serde::Serialize;

use super::NutritionError;

/// Activity level multipliers for TDEE calculation.
pub const ACTIVITY_MULTIPLIERS: [(&str, f64); 5] = [
    ("sedentary", 1.2),
    ("light", 1.375),
    ("moderate", 1.55),
    ("active", 1.725),
    ("very_active", 1.9),
];

/// Macronutrient energy values (kcal per gram).
pub const PROTEIN_KCAL_PER_G: f64 = 4.0;
pub const CARBS_KCAL_PER_G: f64 = 4.0;
pub const FAT_KCAL_PER_G: f64 = 9.0;

/// Calorie split across the three macros. Ratios must sum to ~1.0.
#[derive(Debug, Clone, Copy)]
pub struct MacroSplit {
    pub carb_ratio: f64,
    pub protein_ratio: f64,
    pub fat_ratio: f64,
}

impl Default for MacroSplit {
    /// 40% carbs / 30% protein / 30% fat.
    fn default() -> Self {
        Self {
            carb_ratio: 0.40,
            protein_ratio: 0.30,
            fat_ratio: 0.30,
        }
    }
}

/// Daily targets derived from a TDEE and a macro split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroTargets {
    pub calories: f64,
    pub protein_g: f64,
    pub carbohydrates_g: f64,
    pub fat_g: f64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calculate Basal Metabolic Rate using the Mifflin-St Jeor equation.
///
/// Gender must be exactly `"M"` or `"F"`, no normalization. Bounds on
/// weight/height/age are not checked here; the metrics validation layer
/// enforces them before this runs.
pub fn calculate_bmr(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: &str,
) -> Result<f64, NutritionError> {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age);

    let bmr = match gender {
        "M" => base + 5.0,
        "F" => base - 161.0,
        _ => return Err(NutritionError::InvalidGender),
    };

    Ok(round2(bmr))
}

/// Multiplier for a known activity level key, `None` otherwise.
pub fn activity_multiplier(activity_level: &str) -> Option<f64> {
    ACTIVITY_MULTIPLIERS
        .iter()
        .find(|(key, _)| *key == activity_level)
        .map(|(_, multiplier)| *multiplier)
}

/// Comma-joined list of recognized activity level keys, for error messages.
pub fn valid_activity_levels() -> String {
    ACTIVITY_MULTIPLIERS
        .iter()
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Calculate Total Daily Energy Expenditure by scaling BMR with the
/// activity level multiplier.
pub fn calculate_tdee(bmr: f64, activity_level: &str) -> Result<f64, NutritionError> {
    let multiplier =
        activity_multiplier(activity_level).ok_or_else(|| NutritionError::InvalidActivityLevel {
            valid: valid_activity_levels(),
        })?;

    Ok(round2(bmr * multiplier))
}

/// Split a TDEE into daily macro gram targets.
///
/// `calories` in the result is the rounded TDEE itself, not the sum of the
/// rounded per-macro calories; the two can differ by rounding.
pub fn calculate_macro_targets(
    tdee: f64,
    split: MacroSplit,
) -> Result<MacroTargets, NutritionError> {
    let total_ratio = split.carb_ratio + split.protein_ratio + split.fat_ratio;
    if !(0.99..=1.01).contains(&total_ratio) {
        return Err(NutritionError::InvalidMacroRatios(total_ratio));
    }

    let carb_calories = tdee * split.carb_ratio;
    let protein_calories = tdee * split.protein_ratio;
    let fat_calories = tdee * split.fat_ratio;

    Ok(MacroTargets {
        calories: round2(tdee),
        protein_g: round2(protein_calories / PROTEIN_KCAL_PER_G),
        carbohydrates_g: round2(carb_calories / CARBS_KCAL_PER_G),
        fat_g: round2(fat_calories / FAT_KCAL_PER_G),
    })
}

/// Total calories implied by a set of macro gram amounts. The inverse of
/// [`calculate_macro_targets`], used to sanity-check manually entered targets.
pub fn calculate_macro_calories(protein_g: f64, carbohydrates_g: f64, fat_g: f64) -> f64 {
    round2(
        protein_g * PROTEIN_KCAL_PER_G
            + carbohydrates_g * CARBS_KCAL_PER_G
            + fat_g * FAT_KCAL_PER_G,
    )
}

/// Sum micronutrient maps across entries.
///
/// A key absent from a map contributes 0; empty maps are skipped. Values in
/// the result are rounded to 2 decimal places.
pub fn aggregate_micronutrients(maps: &[HashMap<String, f64>]) -> HashMap<String, f64> {
    let mut aggregated: HashMap<String, f64> = HashMap::new();

    for micronutrients in maps {
        for (nutrient, value) in micronutrients {
            *aggregated.entry(nutrient.clone()).or_insert(0.0) += value;
        }
    }

    aggregated
        .into_iter()
        .map(|(nutrient, value)| (nutrient, round2(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bmr_matches_mifflin_st_jeor_for_men() {
        // base = 700 + 1093.75 - 125 = 1668.75, +5 for men
        let bmr = calculate_bmr(70.0, 175.0, 25, "M").expect("valid input");
        assert_eq!(bmr, 1673.75);
    }

    #[test]
    fn bmr_matches_mifflin_st_jeor_for_women() {
        let bmr = calculate_bmr(70.0, 175.0, 25, "F").expect("valid input");
        assert_eq!(bmr, 1507.75);
    }

    #[test]
    fn bmr_rejects_unknown_gender_codes() {
        for gender in ["Male", "", "m", "f", "X"] {
            let err = calculate_bmr(70.0, 175.0, 25, gender).unwrap_err();
            assert_eq!(err, NutritionError::InvalidGender);
        }
    }

    #[test]
    fn tdee_scales_bmr_by_each_multiplier() {
        assert_eq!(calculate_tdee(1673.75, "sedentary").unwrap(), 2008.5);
        assert_eq!(calculate_tdee(1673.75, "light").unwrap(), 2301.41);
        assert_eq!(calculate_tdee(1673.75, "moderate").unwrap(), 2594.31);
        assert_eq!(calculate_tdee(1673.75, "active").unwrap(), 2887.22);
        assert_eq!(calculate_tdee(1673.75, "very_active").unwrap(), 3180.13);
    }

    #[test]
    fn tdee_error_enumerates_valid_levels() {
        let err = calculate_tdee(1673.75, "couch").unwrap_err();
        let msg = err.to_string();
        for key in ["sedentary", "light", "moderate", "active", "very_active"] {
            assert!(msg.contains(key), "{msg} should mention {key}");
        }
    }

    #[test]
    fn macro_targets_with_default_split() {
        let targets = calculate_macro_targets(2000.0, MacroSplit::default()).expect("valid split");
        assert_eq!(targets.calories, 2000.0);
        assert_eq!(targets.protein_g, 150.0);
        assert_eq!(targets.carbohydrates_g, 200.0);
        assert_eq!(targets.fat_g, 66.67);
    }

    #[test]
    fn macro_targets_calories_is_rounded_tdee_not_macro_sum() {
        let targets = calculate_macro_targets(2000.555, MacroSplit::default()).expect("valid");
        assert_eq!(targets.calories, 2000.56);
    }

    #[test]
    fn macro_targets_rejects_ratios_not_summing_to_one() {
        let split = MacroSplit {
            carb_ratio: 0.5,
            protein_ratio: 0.5,
            fat_ratio: 0.5,
        };
        let err = calculate_macro_targets(2000.0, split).unwrap_err();
        assert_eq!(err, NutritionError::InvalidMacroRatios(1.5));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn macro_targets_accepts_small_float_error_in_ratios() {
        let split = MacroSplit {
            carb_ratio: 0.33,
            protein_ratio: 0.33,
            fat_ratio: 0.34,
        };
        assert!(calculate_macro_targets(1800.0, split).is_ok());
    }

    #[test]
    fn macro_calories_is_the_inverse_check() {
        // 600 + 800 + 600.03
        assert_eq!(calculate_macro_calories(150.0, 200.0, 66.67), 2000.03);
        assert_eq!(calculate_macro_calories(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn aggregate_sums_per_key_across_maps() {
        let maps = vec![
            HashMap::from([("A".to_string(), 1.0), ("B".to_string(), 2.0)]),
            HashMap::new(),
            HashMap::from([("A".to_string(), 3.0)]),
        ];
        let summed = aggregate_micronutrients(&maps);
        assert_eq!(summed.len(), 2);
        assert_eq!(summed["A"], 4.0);
        assert_eq!(summed["B"], 2.0);
    }

    #[test]
    fn aggregate_of_empty_input_is_empty() {
        assert!(aggregate_micronutrients(&[]).is_empty());
    }

    #[test]
    fn aggregate_rounds_values_to_two_places() {
        let maps = vec![
            HashMap::from([("Vitamin C".to_string(), 0.333)]),
            HashMap::from([("Vitamin C".to_string(), 0.333)]),
        ];
        let summed = aggregate_micronutrients(&maps);
        assert_eq!(summed["Vitamin C"], 0.67);
    }
}
