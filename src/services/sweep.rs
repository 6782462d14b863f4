//! Background purge of revocation entries whose tokens have expired anyway.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::repositories::RevocationStore;

/// Spawn the periodic sweep. It runs independently of request handling; a
/// failed pass is logged and retried on the next tick.
pub fn spawn_revocation_sweep(
    store: Arc<dyn RevocationStore>,
    interval: Duration,
) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "starting revocation sweep");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match store.purge_expired(Utc::now()).await {
                Ok(0) => debug!("revocation sweep: nothing to purge"),
                Ok(removed) => info!(removed, "purged expired revocations"),
                Err(e) => warn!(error = %e, "revocation sweep failed"),
            }
        }
    })
}
