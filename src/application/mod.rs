// Weight-adaptation ML pipeline components
pub mod ml;

// End-to-end retraining orchestration
pub mod retrainer;
