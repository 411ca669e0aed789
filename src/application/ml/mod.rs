// Feature construction from outcome records
pub mod features;

// Gradient-boosted classifier core
pub mod gbm;

// Training with held-out evaluation
pub mod trainer;

// Gain importance extraction
pub mod importance;

// Importance -> indicator weight mapping
pub mod adapter;
