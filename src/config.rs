use serde::Deserialize;

use crate::nutrition::MacroSplit;

/// Policy parameters for target derivation and validation.
///
/// The defaults (40/30/30 split, 5% margin) are kept for compatibility with
/// historical targets; deployments can override them per environment.
#[derive(Debug, Clone, Deserialize)]
pub struct NutritionConfig {
    pub carb_ratio: f64,
    pub protein_ratio: f64,
    pub fat_ratio: f64,
    pub macro_calorie_margin: f64,
}

impl NutritionConfig {
    pub fn macro_split(&self) -> MacroSplit {
        MacroSplit {
            carb_ratio: self.carb_ratio,
            protein_ratio: self.protein_ratio,
            fat_ratio: self.fat_ratio,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub nutrition: NutritionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let nutrition = NutritionConfig {
            carb_ratio: env_f64("NUTRITION_CARB_RATIO", 0.40),
            protein_ratio: env_f64("NUTRITION_PROTEIN_RATIO", 0.30),
            fat_ratio: env_f64("NUTRITION_FAT_RATIO", 0.30),
            macro_calorie_margin: env_f64("NUTRITION_MACRO_CALORIE_MARGIN", 1.05),
        };
        Ok(Self {
            database_url,
            nutrition,
        })
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
