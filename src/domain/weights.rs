//! The indicator weight vector handed back to the signal generator.
//!
//! The indicator set is closed: it is fixed at process start and no update
//! path ever adds or removes an entry. Every mutation re-establishes the
//! `[WEIGHT_MIN, WEIGHT_MAX]` bound on every weight.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::errors::RetrainError;

pub const WEIGHT_MIN: f64 = 0.1;
pub const WEIGHT_MAX: f64 = 2.0;

/// Default weights applied at process start.
pub const DEFAULT_WEIGHTS: [(&str, f64); 8] = [
    ("RSI", 1.0),
    ("MACD", 1.2),
    ("EMA", 0.8),
    ("SMA", 0.6),
    ("BB", 1.0),
    ("STOCH", 0.9),
    ("ADX", 1.1),
    ("VOLUME", 0.7),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorWeights {
    weights: BTreeMap<String, f64>,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS
                .iter()
                .map(|(name, w)| (name.to_string(), *w))
                .collect(),
        }
    }
}

impl IndicatorWeights {
    pub fn contains(&self, indicator: &str) -> bool {
        self.weights.contains_key(indicator)
    }

    pub fn get(&self, indicator: &str) -> Option<f64> {
        self.weights.get(indicator).copied()
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Exponential-smoothing blend of one known indicator toward `target`.
    /// Unknown indicators are a no-op; the set is closed.
    pub fn blend(&mut self, indicator: &str, target: f64, alpha: f64) {
        if let Some(weight) = self.weights.get_mut(indicator) {
            *weight = *weight * (1.0 - alpha) + target * alpha;
        }
    }

    /// Clamps every weight into `[WEIGHT_MIN, WEIGHT_MAX]`. Applied after
    /// every blend pass, including to indicators the pass never touched.
    pub fn clamp_all(&mut self) {
        for weight in self.weights.values_mut() {
            *weight = weight.clamp(WEIGHT_MIN, WEIGHT_MAX);
        }
    }

    /// Applies a manual full or partial override. Validates every entry
    /// before touching anything: one bad entry rejects the whole request.
    pub fn apply_manual(&mut self, updates: &BTreeMap<String, f64>) -> Result<(), RetrainError> {
        for (indicator, &value) in updates {
            if !self.weights.contains_key(indicator) {
                return Err(RetrainError::UnknownIndicator {
                    indicator: indicator.clone(),
                });
            }
            if !value.is_finite() || !(WEIGHT_MIN..=WEIGHT_MAX).contains(&value) {
                return Err(RetrainError::InvalidWeight {
                    indicator: indicator.clone(),
                    value,
                });
            }
        }
        for (indicator, &value) in updates {
            self.weights.insert(indicator.clone(), value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let weights = IndicatorWeights::default();
        assert_eq!(weights.get("RSI"), Some(1.0));
        assert_eq!(weights.get("MACD"), Some(1.2));
        assert_eq!(weights.get("VOLUME"), Some(0.7));
        assert_eq!(weights.as_map().len(), 8);
    }

    #[test]
    fn test_clamp_is_idempotent_on_in_range_vector() {
        let mut weights = IndicatorWeights::default();
        let before = weights.clone();
        weights.clamp_all();
        assert_eq!(weights, before);
    }

    #[test]
    fn test_blend_ignores_unknown_indicator() {
        let mut weights = IndicatorWeights::default();
        let before = weights.clone();
        weights.blend("SUPERTREND", 5.0, 0.1);
        assert_eq!(weights, before);
    }

    #[test]
    fn test_manual_update_rejects_out_of_range_without_mutation() {
        let mut weights = IndicatorWeights::default();
        let before = weights.clone();

        let mut updates = BTreeMap::new();
        updates.insert("RSI".to_string(), 1.5);
        updates.insert("MACD".to_string(), 2.5);

        let err = weights.apply_manual(&updates).unwrap_err();
        assert!(matches!(err, RetrainError::InvalidWeight { .. }));
        assert_eq!(weights, before);
    }

    #[test]
    fn test_manual_update_rejects_unknown_indicator() {
        let mut weights = IndicatorWeights::default();
        let mut updates = BTreeMap::new();
        updates.insert("CCI".to_string(), 1.0);

        let err = weights.apply_manual(&updates).unwrap_err();
        assert!(matches!(err, RetrainError::UnknownIndicator { .. }));
    }

    #[test]
    fn test_manual_partial_update_applies() {
        let mut weights = IndicatorWeights::default();
        let mut updates = BTreeMap::new();
        updates.insert("EMA".to_string(), 1.4);

        weights.apply_manual(&updates).unwrap();
        assert_eq!(weights.get("EMA"), Some(1.4));
        assert_eq!(weights.get("RSI"), Some(1.0));
    }
}
