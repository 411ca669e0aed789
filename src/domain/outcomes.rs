//! Closed prediction outcomes as delivered by the read side.
//!
//! `RawOutcomeRow` mirrors the join of `predictions` and
//! `prediction_outcomes` one-to-one; `OutcomeRecord` is the validated form
//! the pipeline works with. Validation can fail per row (bad direction,
//! unparsable indicator map) and those rows are skipped, never fatal alone.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::domain::errors::MalformedRecord;

/// Trade direction of the original prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl FromStr for Direction {
    type Err = MalformedRecord;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(MalformedRecord::InvalidDirection {
                value: other.to_string(),
            }),
        }
    }
}

/// One row of the outcome join, untyped where the store is untyped.
///
/// `indicators_hit` is kept as raw JSON text; decoding it is part of
/// per-record validation, not of loading.
#[derive(Debug, Clone)]
pub struct RawOutcomeRow {
    pub id: String,
    pub symbol: String,
    pub direction: String,
    pub score: f64,
    pub indicator_count: i64,
    pub confidence: f64,
    pub estimated_run_ms: i64,
    pub indicators_hit: String,
    pub card_count: i64,
    pub pnl_percent: f64,
    pub created_at: i64,
    pub closed_at: i64,
}

/// A closed prediction with its realized outcome, validated and immutable.
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub id: String,
    pub symbol: String,
    pub direction: Direction,
    pub score: f64,
    pub indicator_count: u32,
    pub confidence: f64,
    pub estimated_run_ms: u64,
    pub indicators_hit: BTreeMap<String, f64>,
    pub card_count: u32,
    pub pnl_percent: f64,
    pub created_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl OutcomeRecord {
    /// Success label. A zero-PnL close counts as failure.
    pub fn success(&self) -> bool {
        self.pnl_percent > 0.0
    }

    /// Validates one raw row. The indicator map must be a JSON object with
    /// finite numeric values; anything else makes the whole row malformed.
    pub fn parse(row: &RawOutcomeRow) -> Result<Self, MalformedRecord> {
        let direction = Direction::from_str(&row.direction)?;

        let value: serde_json::Value = serde_json::from_str(&row.indicators_hit)
            .map_err(|e| MalformedRecord::NotAMapping {
                reason: e.to_string(),
            })?;
        let object = value.as_object().ok_or_else(|| MalformedRecord::NotAMapping {
            reason: format!("expected object, got {}", json_kind(&value)),
        })?;

        let mut indicators_hit = BTreeMap::new();
        for (name, v) in object {
            let hit = v
                .as_f64()
                .filter(|h| h.is_finite())
                .ok_or_else(|| MalformedRecord::NonNumericIndicator { name: name.clone() })?;
            indicators_hit.insert(name.clone(), hit);
        }

        for (field, v) in [
            ("score", row.score),
            ("confidence", row.confidence),
            ("pnl_percent", row.pnl_percent),
        ] {
            if !v.is_finite() {
                return Err(MalformedRecord::NonFiniteField {
                    field: field.to_string(),
                });
            }
        }

        let created_at = DateTime::from_timestamp_millis(row.created_at)
            .ok_or(MalformedRecord::InvalidTimestamp {
                value: row.created_at,
            })?;
        let closed_at = DateTime::from_timestamp_millis(row.closed_at)
            .ok_or(MalformedRecord::InvalidTimestamp {
                value: row.closed_at,
            })?;

        Ok(Self {
            id: row.id.clone(),
            symbol: row.symbol.clone(),
            direction,
            score: row.score,
            indicator_count: row.indicator_count.max(0) as u32,
            confidence: row.confidence,
            estimated_run_ms: row.estimated_run_ms.max(0) as u64,
            indicators_hit,
            card_count: row.card_count.max(0) as u32,
            pnl_percent: row.pnl_percent,
            created_at,
            closed_at,
        })
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row(indicators_hit: &str) -> RawOutcomeRow {
        RawOutcomeRow {
            id: "p-1".to_string(),
            symbol: "BTCUSDT".to_string(),
            direction: "long".to_string(),
            score: 7.5,
            indicator_count: 4,
            confidence: 0.72,
            estimated_run_ms: 7_200_000,
            indicators_hit: indicators_hit.to_string(),
            card_count: 2,
            pnl_percent: 1.8,
            created_at: 1_700_000_000_000,
            closed_at: 1_700_007_200_000,
        }
    }

    #[test]
    fn test_parse_valid_row() {
        let record = OutcomeRecord::parse(&raw_row(r#"{"RSI": 1.0, "MACD": 0.5}"#)).unwrap();
        assert_eq!(record.direction, Direction::Long);
        assert_eq!(record.indicators_hit.len(), 2);
        assert_eq!(record.indicators_hit["RSI"], 1.0);
        assert!(record.success());
    }

    #[test]
    fn test_zero_pnl_is_failure() {
        let mut row = raw_row(r#"{"RSI": 1.0}"#);
        row.pnl_percent = 0.0;
        let record = OutcomeRecord::parse(&row).unwrap();
        assert!(!record.success());
    }

    #[test]
    fn test_non_mapping_indicators_rejected() {
        let err = OutcomeRecord::parse(&raw_row("[1, 2, 3]")).unwrap_err();
        assert!(matches!(err, MalformedRecord::NotAMapping { .. }));
    }

    #[test]
    fn test_non_numeric_indicator_rejected() {
        let err = OutcomeRecord::parse(&raw_row(r#"{"RSI": "high"}"#)).unwrap_err();
        assert!(matches!(
            err,
            MalformedRecord::NonNumericIndicator { name } if name == "RSI"
        ));
    }

    #[test]
    fn test_bad_direction_rejected() {
        let mut row = raw_row(r#"{"RSI": 1.0}"#);
        row.direction = "sideways".to_string();
        let err = OutcomeRecord::parse(&row).unwrap_err();
        assert!(matches!(err, MalformedRecord::InvalidDirection { .. }));
    }
}
