use crate::metrics::repo::UserMetrics;
use crate::nutrition::{calculate_macro_targets, MacroSplit, MacroTargets, NutritionError};
use crate::state::AppState;

use super::repo::NutritionTargets;

/// BMR -> TDEE -> macro split: the derivation chain behind auto targets.
pub fn derive_targets(
    metrics: &UserMetrics,
    split: MacroSplit,
) -> Result<MacroTargets, NutritionError> {
    let tdee = metrics.tdee()?;
    calculate_macro_targets(tdee, split)
}

/// Recompute stored targets from fresh metrics.
///
/// Custom targets are the user's and stay untouched; auto-derived or
/// missing targets are (re)written with `is_custom = false`.
pub async fn refresh_auto_targets(state: &AppState, metrics: &UserMetrics) -> anyhow::Result<()> {
    if let Some(existing) = NutritionTargets::find_by_user(&state.db, metrics.user_id).await? {
        if existing.is_custom {
            return Ok(());
        }
    }

    let derived = derive_targets(metrics, state.config.nutrition.macro_split())
        .map_err(anyhow::Error::new)?;
    NutritionTargets::upsert_auto(&state.db, metrics.user_id, &derived).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use uuid::Uuid;

    fn metrics() -> UserMetrics {
        UserMetrics {
            user_id: Uuid::new_v4(),
            height: 175.0,
            weight: 70.0,
            age: 25,
            gender: "M".to_string(),
            activity_level: "sedentary".to_string(),
            created_at: datetime!(2024-01-01 00:00 UTC),
            updated_at: datetime!(2024-01-01 00:00 UTC),
        }
    }

    #[test]
    fn derivation_chains_bmr_tdee_and_split() {
        // BMR 1673.75, sedentary TDEE 2008.5, then 40/30/30
        let derived = derive_targets(&metrics(), MacroSplit::default()).expect("valid metrics");
        assert_eq!(derived.calories, 2008.5);
        assert_eq!(derived.protein_g, 150.64);
        assert_eq!(derived.carbohydrates_g, 200.85);
        assert_eq!(derived.fat_g, 66.95);
    }

    #[test]
    fn derivation_fails_on_bad_split() {
        let split = MacroSplit {
            carb_ratio: 0.7,
            protein_ratio: 0.7,
            fat_ratio: 0.7,
        };
        assert!(matches!(
            derive_targets(&metrics(), split),
            Err(NutritionError::InvalidMacroRatios(_))
        ));
    }
}
