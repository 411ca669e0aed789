//! Normalized per-feature gain importance from a fitted model.

use std::collections::BTreeMap;

use crate::application::ml::trainer::TrainedModel;

/// Feature name to normalized contribution. Sums to 1 unless the model
/// reports no gain anywhere, in which case every entry is 0.
pub type ImportanceMap = BTreeMap<String, f64>;

pub struct ImportanceExtractor;

impl ImportanceExtractor {
    /// Pure read of the model. Alignment uses the feature order stored on
    /// the model at training time, so a caller holding a different column
    /// order cannot silently shift scores.
    pub fn extract(model: &TrainedModel) -> ImportanceMap {
        let gain = model.model.feature_gain();
        let total: f64 = gain.iter().sum();

        model
            .feature_names
            .iter()
            .zip(gain)
            .map(|(name, &g)| {
                let score = if total > 0.0 { g / total } else { 0.0 };
                (name.clone(), score)
            })
            .collect()
    }
}
