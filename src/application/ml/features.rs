//! Turns raw outcome rows into a labeled feature matrix.
//!
//! Feature columns are the union over the whole batch: six fixed scalars
//! plus one `indicator_<name>` column per indicator observed in any record.
//! Rows missing a column get 0 there. The sorted column order is computed
//! once per batch and travels with the matrix so that training and
//! importance extraction can never disagree on alignment.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;
use tracing::warn;

use crate::domain::outcomes::{Direction, OutcomeRecord, RawOutcomeRow};

/// Prefix of the per-indicator feature columns.
pub const INDICATOR_FEATURE_PREFIX: &str = "indicator_";

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Feature matrix, labels, and the column order both were built with.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
    pub feature_names: Vec<String>,
}

impl TrainingSet {
    pub fn rows(&self) -> usize {
        self.features.nrows()
    }
}

pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Builds the training set from raw rows. Malformed rows are skipped
    /// with a warning; `None` means nothing parsed and the caller decides
    /// whether that is fatal.
    pub fn build(rows: &[RawOutcomeRow]) -> Option<TrainingSet> {
        let mut row_features: Vec<BTreeMap<String, f64>> = Vec::with_capacity(rows.len());
        let mut labels: Vec<u8> = Vec::with_capacity(rows.len());

        for row in rows {
            let record = match OutcomeRecord::parse(row) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed outcome record {}: {}", row.id, e);
                    continue;
                }
            };
            labels.push(record.success() as u8);
            row_features.push(Self::featurize(&record));
        }

        if row_features.is_empty() {
            return None;
        }

        // Column union across the batch, in one pass, sorted for stability.
        let names: BTreeSet<&str> = row_features
            .iter()
            .flat_map(|f| f.keys().map(String::as_str))
            .collect();
        let feature_names: Vec<String> = names.into_iter().map(str::to_string).collect();

        let mut features = Array2::<f64>::zeros((row_features.len(), feature_names.len()));
        for (i, row) in row_features.iter().enumerate() {
            for (j, name) in feature_names.iter().enumerate() {
                if let Some(&value) = row.get(name) {
                    features[[i, j]] = value;
                }
            }
        }

        Some(TrainingSet {
            features,
            labels,
            feature_names,
        })
    }

    fn featurize(record: &OutcomeRecord) -> BTreeMap<String, f64> {
        let mut features = BTreeMap::new();
        features.insert("score".to_string(), record.score);
        features.insert("confidence".to_string(), record.confidence);
        features.insert("indicator_count".to_string(), record.indicator_count as f64);
        features.insert("card_count".to_string(), record.card_count as f64);
        features.insert(
            "direction_long".to_string(),
            if record.direction == Direction::Long { 1.0 } else { 0.0 },
        );
        features.insert(
            "estimated_run_hours".to_string(),
            record.estimated_run_ms as f64 / MS_PER_HOUR,
        );

        for (name, &hit) in &record.indicators_hit {
            features.insert(format!("{INDICATOR_FEATURE_PREFIX}{name}"), hit);
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, direction: &str, indicators_hit: &str, pnl: f64) -> RawOutcomeRow {
        RawOutcomeRow {
            id: id.to_string(),
            symbol: "ETHUSDT".to_string(),
            direction: direction.to_string(),
            score: 5.0,
            indicator_count: 3,
            confidence: 0.6,
            estimated_run_ms: 1_800_000,
            indicators_hit: indicators_hit.to_string(),
            card_count: 1,
            pnl_percent: pnl,
            created_at: 1_700_000_000_000,
            closed_at: 1_700_003_600_000,
        }
    }

    fn column(set: &TrainingSet, name: &str) -> usize {
        set.feature_names
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("missing column {name}"))
    }

    #[test]
    fn test_column_union_with_zero_fill() {
        let rows = vec![
            row("a", "long", r#"{"RSI": 1.0}"#, 2.0),
            row("b", "short", r#"{"MACD": 1.0}"#, -1.0),
        ];
        let set = FeatureBuilder::build(&rows).unwrap();

        let rsi = column(&set, "indicator_RSI");
        let macd = column(&set, "indicator_MACD");

        assert_eq!(set.features[[0, rsi]], 1.0);
        assert_eq!(set.features[[0, macd]], 0.0);
        assert_eq!(set.features[[1, rsi]], 0.0);
        assert_eq!(set.features[[1, macd]], 1.0);
    }

    #[test]
    fn test_scalar_features_present_and_derived() {
        let rows = vec![row("a", "long", r#"{"RSI": 1.0}"#, 2.0)];
        let set = FeatureBuilder::build(&rows).unwrap();

        assert_eq!(set.features[[0, column(&set, "direction_long")]], 1.0);
        assert_eq!(set.features[[0, column(&set, "estimated_run_hours")]], 0.5);
        assert_eq!(set.features[[0, column(&set, "score")]], 5.0);
        assert_eq!(set.features[[0, column(&set, "card_count")]], 1.0);
    }

    #[test]
    fn test_malformed_rows_skipped_not_fatal() {
        let rows = vec![
            row("a", "long", r#"{"RSI": 1.0}"#, 2.0),
            row("b", "long", "not json", 1.0),
            row("c", "sideways", r#"{"RSI": 1.0}"#, 1.0),
            row("d", "short", r#"{"MACD": 0.5}"#, -0.5),
        ];
        let set = FeatureBuilder::build(&rows).unwrap();
        assert_eq!(set.rows(), 2);
        assert_eq!(set.labels, vec![1, 0]);
    }

    #[test]
    fn test_all_malformed_yields_none() {
        let rows = vec![row("a", "up", r#"{"RSI": 1.0}"#, 2.0)];
        assert!(FeatureBuilder::build(&rows).is_none());
    }

    #[test]
    fn test_feature_order_is_sorted_and_stable() {
        let rows = vec![
            row("a", "long", r#"{"STOCH": 1.0, "ADX": 0.3}"#, 2.0),
            row("b", "short", r#"{"BB": 0.9}"#, -1.0),
        ];
        let set = FeatureBuilder::build(&rows).unwrap();
        let mut sorted = set.feature_names.clone();
        sorted.sort();
        assert_eq!(set.feature_names, sorted);
        assert_eq!(set.feature_names.len(), 9);
    }
}
