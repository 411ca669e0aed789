//! Sequences one full retraining cycle.
//!
//! load outcomes → build features → train → extract importance → adapt
//! weights. Every failure path returns before the adapt step, so a failed
//! cycle never moves the weight vector.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::application::ml::adapter::WeightAdapter;
use crate::application::ml::features::FeatureBuilder;
use crate::application::ml::importance::{ImportanceExtractor, ImportanceMap};
use crate::application::ml::trainer::{ClassifierTrainer, PerformanceReport};
use crate::domain::errors::RetrainError;
use crate::domain::repositories::OutcomeRepository;
use crate::domain::weights::IndicatorWeights;

/// The full observable output of one retraining cycle.
///
/// `training_samples` counts rows at the source level; the rows the model
/// actually saw (malformed records skipped) are reported separately through
/// `model_performance.samples_train + samples_test`.
#[derive(Debug, Clone, Serialize)]
pub struct WeightUpdateResult {
    pub indicator_weights: IndicatorWeights,
    pub feature_importance: ImportanceMap,
    pub model_performance: PerformanceReport,
    pub training_samples: usize,
}

pub struct RetrainPipeline {
    source: Arc<dyn OutcomeRepository>,
    trainer: ClassifierTrainer,
    adapter: WeightAdapter,
}

impl RetrainPipeline {
    pub fn new(source: Arc<dyn OutcomeRepository>) -> Self {
        Self {
            source,
            trainer: ClassifierTrainer::default(),
            adapter: WeightAdapter::new(),
        }
    }

    /// Runs one retraining cycle. Idempotent to re-invoke; no retry inside.
    pub async fn retrain(&self, min_samples: usize) -> Result<WeightUpdateResult, RetrainError> {
        let rows = self.source.load_closed_outcomes().await?;
        if rows.is_empty() {
            return Err(RetrainError::NoData);
        }
        if rows.len() < min_samples {
            return Err(RetrainError::InsufficientSamples {
                have: rows.len(),
                need: min_samples,
            });
        }
        info!("Loaded {} closed outcomes", rows.len());

        let set = FeatureBuilder::build(&rows).ok_or(RetrainError::FeatureBuildFailed {
            total: rows.len(),
        })?;
        if set.rows() < rows.len() {
            warn!(
                "Skipped {} malformed outcome records",
                rows.len() - set.rows()
            );
        }

        let (model, performance) = self.trainer.train(&set)?;
        let importance = ImportanceExtractor::extract(&model);
        let weights = self.adapter.update(&importance).await;

        info!(
            training_samples = rows.len(),
            accuracy = performance.accuracy,
            "Retraining cycle complete"
        );

        Ok(WeightUpdateResult {
            indicator_weights: weights,
            feature_importance: importance,
            model_performance: performance,
            training_samples: rows.len(),
        })
    }

    /// Consistent snapshot of the current weights.
    pub async fn current_weights(&self) -> IndicatorWeights {
        self.adapter.current().await
    }

    /// Manual weight override; rejects without mutating on any bad entry.
    pub async fn set_weights(
        &self,
        updates: &BTreeMap<String, f64>,
    ) -> Result<IndicatorWeights, RetrainError> {
        let weights = self.adapter.set_manual(updates).await?;
        info!(?updates, "Indicator weights updated manually");
        Ok(weights)
    }
}
