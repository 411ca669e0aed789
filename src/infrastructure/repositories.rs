//! In-memory outcome source.
//!
//! Thread-safe via `Arc<RwLock>`. Used by the test suite and by
//! `DATA_MODE=mock` runs; data is lost on restart.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::outcomes::RawOutcomeRow;
use crate::domain::repositories::OutcomeRepository;

pub struct InMemoryOutcomeRepository {
    rows: Arc<RwLock<Vec<RawOutcomeRow>>>,
}

impl InMemoryOutcomeRepository {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn with_rows(rows: Vec<RawOutcomeRow>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(rows)),
        }
    }

    pub async fn push(&self, row: RawOutcomeRow) {
        self.rows.write().await.push(row);
    }
}

impl Default for InMemoryOutcomeRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutcomeRepository for InMemoryOutcomeRepository {
    async fn load_closed_outcomes(&self) -> Result<Vec<RawOutcomeRow>> {
        Ok(self.rows.read().await.clone())
    }
}
