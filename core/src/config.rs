use serde::{Deserialize, Serialize};

/// Inclusive bounds of the ordinal rating scale used by sub-aspects and
/// by the distribution buckets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingScale {
    pub min: i64,
    pub max: i64,
}

impl RatingScale {
    pub fn contains(&self, rating: i64) -> bool {
        (self.min..=self.max).contains(&rating)
    }

    pub fn levels(&self) -> impl Iterator<Item = i64> {
        self.min..=self.max
    }
}

/// Rules applied when an institution saves a custom standard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Category weights, and active aspect weights inside each category,
    /// must add up to this value.
    pub weight_total: f64,
    /// Accepted absolute deviation from `weight_total`.
    pub weight_tolerance: f64,
    pub min_active_aspects_per_category: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingDefaults {
    pub page_size: usize,
    pub tolerance_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub rating_scale: RatingScale,
    pub validation: ValidationRules,
    pub ranking: RankingDefaults,
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)?;

        if config.rating_scale.min > config.rating_scale.max {
            anyhow::bail!(
                "{path}: rating_scale.min ({}) exceeds rating_scale.max ({})",
                config.rating_scale.min,
                config.rating_scale.max
            );
        }
        if config.ranking.page_size == 0 {
            anyhow::bail!("{path}: ranking.page_size must be positive");
        }
        if !(0.0..=100.0).contains(&config.ranking.tolerance_percent) {
            anyhow::bail!("{path}: ranking.tolerance_percent must be within 0..=100");
        }

        log::debug!("Loaded engine config from {path}");
        Ok(config)
    }

    pub fn default_test() -> Self {
        Self {
            rating_scale: RatingScale { min: 1, max: 5 },
            validation: ValidationRules {
                weight_total: 100.0,
                weight_tolerance: 0.01,
                min_active_aspects_per_category: 1,
            },
            ranking: RankingDefaults {
                page_size: 25,
                tolerance_percent: 0.0,
            },
        }
    }
}
