//! Periodic pruning of stale rate limiter state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::LIMITER_PRUNE_INTERVAL_SECS;
use crate::rate_limit::RateLimits;

/// Spawns the limiter prune task so idle client entries do not accumulate.
pub fn spawn_background_tasks(limits: Arc<RateLimits>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(LIMITER_PRUNE_INTERVAL_SECS));
        loop {
            interval.tick().await;
            limits.upload.prune().await;
            limits.listing.prune().await;
        }
    });
}
