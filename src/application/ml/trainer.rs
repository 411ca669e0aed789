//! Fits the success classifier on a training set with a held-out split.
//!
//! The 80/20 split is stratified per class and seeded, so the same input
//! ordering always produces the same partitions and the success/failure
//! ratio is preserved on both sides.

use ndarray::{Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

use crate::application::ml::features::TrainingSet;
use crate::application::ml::gbm::{GradientBoostParameters, GradientBoostedClassifier};
use crate::domain::errors::{MIN_TRAINING_ROWS, RetrainError};

const SPLIT_SEED: u64 = 42;
const EVAL_FRACTION: f64 = 0.2;
const PREDICTION_THRESHOLD: f64 = 0.5;

/// Evaluation-partition metrics for one training run. Observational only:
/// nothing feeds back from here into the model or the weights.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub samples_train: usize,
    pub samples_test: usize,
}

/// A fitted classifier plus the exact feature order it was trained on.
/// Importance extraction aligns against this order, never the caller's.
#[derive(Debug)]
pub struct TrainedModel {
    pub(crate) model: GradientBoostedClassifier,
    pub feature_names: Vec<String>,
}

pub struct ClassifierTrainer {
    params: GradientBoostParameters,
}

impl Default for ClassifierTrainer {
    fn default() -> Self {
        Self {
            params: GradientBoostParameters::default(),
        }
    }
}

impl ClassifierTrainer {
    pub fn train(
        &self,
        set: &TrainingSet,
    ) -> Result<(TrainedModel, PerformanceReport), RetrainError> {
        let rows = set.rows();
        if rows < MIN_TRAINING_ROWS {
            return Err(RetrainError::InsufficientData { rows });
        }

        let (train_idx, test_idx) = stratified_split(&set.labels);
        let x_train = set.features.select(Axis(0), &train_idx);
        let x_test = set.features.select(Axis(0), &test_idx);
        let y_train: Vec<u8> = train_idx.iter().map(|&i| set.labels[i]).collect();
        let y_test: Vec<u8> = test_idx.iter().map(|&i| set.labels[i]).collect();

        let model = GradientBoostedClassifier::fit(
            &x_train,
            &y_train,
            &x_test,
            &y_test,
            self.params.clone(),
        );

        let report = evaluate(&model, &x_test, &y_test, y_train.len());
        info!(
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            samples_train = report.samples_train,
            samples_test = report.samples_test,
            rounds = model.rounds(),
            "Model trained"
        );

        Ok((
            TrainedModel {
                model,
                feature_names: set.feature_names.clone(),
            },
            report,
        ))
    }
}

/// Seeded stratified split. Each class contributes ~20% of its members to
/// the evaluation partition; classes too small to spare a row stay fully in
/// training.
fn stratified_split(labels: &[u8]) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(SPLIT_SEED);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == class)
            .map(|(i, _)| i)
            .collect();
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64 * EVAL_FRACTION).round() as usize)
            .min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }

    (train, test)
}

fn evaluate(
    model: &GradientBoostedClassifier,
    x_test: &Array2<f64>,
    y_test: &[u8],
    samples_train: usize,
) -> PerformanceReport {
    let proba = model.predict_proba(x_test);

    let mut tp = 0usize;
    let mut tn = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (&p, &label) in proba.iter().zip(y_test) {
        let predicted = p > PREDICTION_THRESHOLD;
        match (predicted, label == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }

    let total = y_test.len();
    PerformanceReport {
        accuracy: if total == 0 {
            0.0
        } else {
            (tp + tn) as f64 / total as f64
        },
        precision: ratio_or_zero(tp, tp + fp),
        recall: ratio_or_zero(tp, tp + fn_),
        samples_train,
        samples_test: total,
    }
}

fn ratio_or_zero(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
