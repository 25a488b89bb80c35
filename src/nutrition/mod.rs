//! Nutrition computation core: BMR/TDEE, macro targets, per-entry scaling
//! and daily aggregation. Pure synchronous functions, no I/O.

pub mod calculator;
pub mod totals;

pub use calculator::{
    aggregate_micronutrients, calculate_bmr, calculate_macro_calories, calculate_macro_targets,
    calculate_tdee, MacroSplit, MacroTargets,
};
pub use totals::{recalculate_totals, scale_nutrition, DailyTotals, EntryNutrition, FoodNutrition};

use thiserror::Error;

/// Invalid-argument errors raised by the nutrition core.
///
/// Every variant reflects bad caller input; none are retried or recovered
/// here. Callers translate them into user-facing validation responses.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    #[error("Gender must be 'M' or 'F'")]
    InvalidGender,

    #[error("Invalid activity level. Must be one of: {valid}")]
    InvalidActivityLevel { valid: String },

    #[error("Macro ratios must sum to 1.0, got {0}")]
    InvalidMacroRatios(f64),

    #[error(
        "Macronutrients exceed calorie target. \
         Macros account for {macro_calories:.0} kcal but target is {calories:.0} kcal."
    )]
    MacroCaloriesExceedTarget { macro_calories: f64, calories: f64 },
}
