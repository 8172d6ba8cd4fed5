//! Automatic daily reset sweep.
//!
//! Finds every child whose last reset is older than the configured window
//! and restores each one's balance to its daily allowance. Each child is
//! reset in its own transaction, attributed to that child's own parent, and
//! one child's failure never aborts the rest of the sweep.

use chrono::{Duration, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::db::Store;
use crate::entities::children;

pub const AUTO_RESET_REASON: &str = "Automatic daily reset";

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for SweepError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SweepStats {
    /// Children successfully reset
    pub count: usize,
    /// Children skipped because their reset failed
    pub failed: usize,
}

#[derive(Clone)]
pub struct SweepService {
    store: Store,
    reset_after_hours: u32,
}

impl SweepService {
    #[must_use]
    pub const fn new(store: Store, reset_after_hours: u32) -> Self {
        Self {
            store,
            reset_after_hours,
        }
    }

    /// Run one sweep. Only the eligibility query is fatal; per-child reset
    /// failures are logged and excluded from the count.
    pub async fn run(&self) -> Result<SweepStats, SweepError> {
        let now = Utc::now();
        let cutoff = (now - Duration::hours(i64::from(self.reset_after_hours))).to_rfc3339();
        let now_str = now.to_rfc3339();

        let due = self.store.children_due_for_reset(&cutoff).await?;

        if due.is_empty() {
            return Ok(SweepStats::default());
        }

        let stats = self.reset_batch(due, &now_str).await;

        info!(
            "Sweep complete: {} reset, {} failed",
            stats.count, stats.failed
        );
        Ok(stats)
    }

    /// Reset each child in its own transaction. A failed reset is logged and
    /// counted; the rest of the batch still runs.
    pub async fn reset_batch(&self, due: Vec<children::Model>, now: &str) -> SweepStats {
        let mut stats = SweepStats::default();

        for child in due {
            match self
                .store
                .reset_child(child.id, child.parent_id, AUTO_RESET_REASON, now)
                .await
            {
                Ok(Some(_)) => stats.count += 1,
                Ok(None) => {
                    // Deleted between the eligibility query and the reset
                    warn!("Child {} disappeared during sweep", child.id);
                    stats.failed += 1;
                }
                Err(e) => {
                    warn!("Failed to reset child {}: {}", child.id, e);
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}
