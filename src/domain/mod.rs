// Error taxonomy for the retraining pipeline
pub mod errors;

// Closed prediction outcomes (raw and validated forms)
pub mod outcomes;

// Repository traits
pub mod repositories;

// Indicator weight vector and its bounds
pub mod weights;
