use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::config::{FeedSource, RetryPolicy};
use crate::fetcher::{FetchError, Fetcher};
use crate::models::{NewsItem, Snapshot};

/// Fetch a source, retrying up to the policy's budget. Returns the last error
/// once every attempt has failed.
pub async fn try_fetch_with_retry(
    fetcher: &Fetcher,
    source: &FeedSource,
    policy: RetryPolicy,
) -> Result<Vec<NewsItem>, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetcher.fetch(source).await {
            Ok(items) => return Ok(items),
            Err(err) => {
                let remaining = max_attempts - attempt;
                warn!(
                    source = %source.name,
                    attempt,
                    remaining,
                    kind = err.kind(),
                    error = %err,
                    "Feed fetch failed"
                );

                if remaining == 0 {
                    error!(
                        source = %source.name,
                        "Giving up on source after {} attempts", max_attempts
                    );
                    return Err(err);
                }

                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff * attempt).await;
                }
                attempt += 1;
            }
        }
    }
}

/// Like [`try_fetch_with_retry`], but an exhausted budget yields no items.
pub async fn fetch_with_retry(
    fetcher: &Fetcher,
    source: &FeedSource,
    policy: RetryPolicy,
) -> Vec<NewsItem> {
    try_fetch_with_retry(fetcher, source, policy)
        .await
        .unwrap_or_default()
}

/// Fans a fetch out to every source and merges the results.
pub struct Aggregator {
    fetcher: Arc<Fetcher>,
    policy: RetryPolicy,
    permits: Arc<Semaphore>,
}

impl Aggregator {
    pub fn new(fetcher: Arc<Fetcher>, policy: RetryPolicy, max_concurrent: usize) -> Self {
        Self {
            fetcher,
            policy,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Every source runs as its own task with its own retry budget. All tasks
    /// are spawned before any is awaited, and every one is awaited to the end.
    /// The merged items are stably sorted newest first, so ties keep source order.
    pub async fn aggregate(&self, sources: &[FeedSource]) -> Snapshot {
        info!("Aggregating {} sources", sources.len());

        let handles: Vec<_> = sources
            .iter()
            .cloned()
            .map(|source| {
                let fetcher = self.fetcher.clone();
                let permits = self.permits.clone();
                let policy = self.policy;
                tokio::spawn(async move {
                    // The semaphore is never closed, so acquiring only waits.
                    let _permit = permits.acquire_owned().await.ok();
                    try_fetch_with_retry(&fetcher, &source, policy).await
                })
            })
            .collect();

        let mut items = Vec::new();
        let mut unavailable = Vec::new();

        for (source, handle) in sources.iter().zip(handles) {
            match handle.await {
                Ok(Ok(batch)) => items.extend(batch),
                Ok(Err(_)) => unavailable.push(source.name.clone()),
                Err(err) => {
                    error!(source = %source.name, error = %err, "Fetch task failed");
                    unavailable.push(source.name.clone());
                }
            }
        }

        items.sort_by(NewsItem::newest_first);

        info!(
            items = items.len(),
            unavailable = unavailable.len(),
            "Aggregation complete"
        );

        Snapshot {
            items,
            unavailable,
            source_count: sources.len(),
        }
    }
}
