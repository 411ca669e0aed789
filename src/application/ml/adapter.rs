//! Maps feature importance back onto the long-lived indicator weights.
//!
//! The adapter is the sole mutator of the weight vector. All reads and
//! writes go through one `RwLock`, so concurrent retrain requests serialize
//! their read-modify-write and readers always see a complete vector.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ml::features::INDICATOR_FEATURE_PREFIX;
use crate::application::ml::importance::ImportanceMap;
use crate::domain::errors::RetrainError;
use crate::domain::weights::IndicatorWeights;

/// Blend ratio per retraining cycle. Importance scores are noisy and
/// rescaled per run, so weights move slowly toward them.
pub const SMOOTHING_ALPHA: f64 = 0.1;

/// Importance sums to 1 over possibly few features; the rescale keeps
/// typical targets in the same range as the weights themselves.
pub const IMPORTANCE_SCALE: f64 = 2.0;

pub struct WeightAdapter {
    weights: Arc<RwLock<IndicatorWeights>>,
}

impl Default for WeightAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightAdapter {
    pub fn new() -> Self {
        Self {
            weights: Arc::new(RwLock::new(IndicatorWeights::default())),
        }
    }

    /// Snapshot of the current weights.
    pub async fn current(&self) -> IndicatorWeights {
        self.weights.read().await.clone()
    }

    /// Applies one importance map to the weight vector and returns the new
    /// vector. The write lock is held across the whole read-modify-write,
    /// and the vector is replaced in one assignment: all indicators or none.
    pub async fn update(&self, importance: &ImportanceMap) -> IndicatorWeights {
        let mut guard = self.weights.write().await;
        let mut next = guard.clone();

        for (feature, &score) in importance {
            let Some(stripped) = feature.strip_prefix(INDICATOR_FEATURE_PREFIX) else {
                continue;
            };
            // First segment before '_' is the indicator key, so a feature
            // for an indicator/timeframe combination ("RSI_1h") maps back
            // to its base indicator. Known limitation: ambiguous if an
            // indicator name itself contained '_'; none currently do.
            let Some(indicator) = stripped.split('_').next().filter(|s| !s.is_empty()) else {
                continue;
            };
            if !next.contains(indicator) {
                continue;
            }

            let target = score * IMPORTANCE_SCALE;
            next.blend(indicator, target, SMOOTHING_ALPHA);
            debug!(
                indicator,
                importance = score,
                target,
                weight = next.get(indicator),
                "Blended indicator weight"
            );
        }

        // Unconditional, also for indicators untouched this round.
        next.clamp_all();

        *guard = next.clone();
        next
    }

    /// Manual full or partial override. Rejects without mutating if any
    /// entry is out of bounds or names an indicator outside the fixed set.
    pub async fn set_manual(
        &self,
        updates: &BTreeMap<String, f64>,
    ) -> Result<IndicatorWeights, RetrainError> {
        let mut guard = self.weights.write().await;
        let mut next = guard.clone();
        next.apply_manual(updates)?;
        *guard = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weights::{WEIGHT_MAX, WEIGHT_MIN};
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn importance(entries: &[(&str, f64)]) -> ImportanceMap {
        entries
            .iter()
            .map(|(name, v)| (name.to_string(), *v))
            .collect()
    }

    #[tokio::test]
    async fn test_smoothing_arithmetic() {
        // importance 0.5 -> target 1.0 == old weight, so no movement
        let adapter = WeightAdapter::new();
        let weights = adapter
            .update(&importance(&[("indicator_RSI", 0.5)]))
            .await;
        assert!((weights.get("RSI").unwrap() - 1.0).abs() < 1e-12);

        // importance 1.0 -> target 2.0: 1.0*0.9 + 2.0*0.1 = 1.1
        let weights = adapter
            .update(&importance(&[("indicator_RSI", 1.0)]))
            .await;
        assert!((weights.get("RSI").unwrap() - 1.1).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_timeframe_suffix_maps_to_base_indicator() {
        let adapter = WeightAdapter::new();
        let weights = adapter
            .update(&importance(&[("indicator_MACD_1h_long", 1.0)]))
            .await;
        // 1.2*0.9 + 2.0*0.1 = 1.28
        assert!((weights.get("MACD").unwrap() - 1.28).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_unknown_and_non_indicator_features_ignored() {
        let adapter = WeightAdapter::new();
        let before = adapter.current().await;
        let after = adapter
            .update(&importance(&[
                ("score", 0.8),
                ("indicator_count", 0.1),
                ("indicator_SUPERTREND", 0.1),
            ]))
            .await;
        // "indicator_count" strips to key "count", which is not in the set
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_untouched_indicators_keep_weight() {
        let adapter = WeightAdapter::new();
        let weights = adapter
            .update(&importance(&[("indicator_RSI", 1.0)]))
            .await;
        assert_eq!(weights.get("EMA"), Some(0.8));
        assert_eq!(weights.get("VOLUME"), Some(0.7));
    }

    #[tokio::test]
    async fn test_bounds_hold_over_random_importance_inputs() {
        let adapter = WeightAdapter::new();
        let mut rng = StdRng::seed_from_u64(7);
        let names = [
            "indicator_RSI",
            "indicator_MACD",
            "indicator_EMA",
            "indicator_SMA",
            "indicator_BB",
            "indicator_STOCH",
            "indicator_ADX",
            "indicator_VOLUME",
            "score",
        ];

        for round in 0..500 {
            let mut map = ImportanceMap::new();
            for name in names {
                // Deliberately far outside the normalized [0, 1] range.
                let value: f64 = match round % 3 {
                    0 => rng.random_range(0.0..1.0),
                    1 => rng.random_range(0.0..1_000.0),
                    _ => rng.random_range(-1_000.0..0.0),
                };
                map.insert(name.to_string(), value);
            }
            let weights = adapter.update(&map).await;
            for (_, &w) in weights.as_map() {
                assert!((WEIGHT_MIN..=WEIGHT_MAX).contains(&w));
            }
        }
    }

    #[tokio::test]
    async fn test_manual_set_rejection_leaves_state_unchanged() {
        let adapter = WeightAdapter::new();
        let before = adapter.current().await;

        let mut updates = BTreeMap::new();
        updates.insert("RSI".to_string(), 0.05);
        assert!(adapter.set_manual(&updates).await.is_err());
        assert_eq!(adapter.current().await, before);
    }
}
