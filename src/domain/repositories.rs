//! Repository abstraction over the prediction outcome store.
//!
//! The pipeline only ever reads: closed predictions joined with their
//! realized outcome. Writing predictions and outcomes belongs to the signal
//! generator, not to this service.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::outcomes::RawOutcomeRow;

/// Read-only source of closed prediction outcomes.
#[async_trait]
pub trait OutcomeRepository: Send + Sync {
    /// Fetch every closed prediction with a non-null realized PnL,
    /// most recent first.
    async fn load_closed_outcomes(&self) -> Result<Vec<RawOutcomeRow>>;
}
