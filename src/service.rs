use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::aggregator::Aggregator;
use crate::cache::ResultCache;
use crate::config::{Config, FeedSource};
use crate::fetcher::Fetcher;
use crate::likes::{LikeError, LikeStatus, LikeStore};
use crate::models::{NewsItem, NewsPage, Snapshot};
use crate::suggest::suggest;
use crate::views::{distinct_categories, filter_by_category, paginate};

/// Cache key for the full aggregated stream.
pub const NEWS_CACHE_KEY: &str = "allNews";

/// The news stream and likes behind the API.
pub struct NewsService {
    sources: Arc<[FeedSource]>,
    aggregator: Arc<Aggregator>,
    cache: ResultCache<Arc<Snapshot>>,
    likes: LikeStore,
}

impl NewsService {
    pub fn new(sources: Vec<FeedSource>, aggregator: Aggregator, cache_ttl: Duration) -> Self {
        Self {
            sources: sources.into(),
            aggregator: Arc::new(aggregator),
            cache: ResultCache::new(cache_ttl),
            likes: LikeStore::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let fetcher = Arc::new(Fetcher::new(config.request_timeout())?);
        let aggregator = Aggregator::new(
            fetcher,
            config.retry_policy(),
            config.max_concurrent_fetches,
        );
        Ok(Self::new(config.feeds.clone(), aggregator, config.cache_ttl()))
    }

    /// The current aggregated snapshot, fetching every source if the cached
    /// one has expired. Concurrent callers share a single fetch, which runs to
    /// completion even if the caller that started it is cancelled.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        let aggregator = self.aggregator.clone();
        let sources = self.sources.clone();
        let result = self
            .cache
            .get_or_compute(NEWS_CACHE_KEY, move || async move {
                Arc::new(aggregator.aggregate(&sources).await)
            })
            .await;

        match result {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(error = %err, "Aggregation task failed");
                Arc::new(Snapshot {
                    items: Vec::new(),
                    unavailable: self.sources.iter().map(|s| s.name.clone()).collect(),
                    source_count: self.sources.len(),
                })
            }
        }
    }

    pub async fn get_news(&self, page: usize, limit: usize, category: &str) -> NewsPage {
        let snapshot = self.snapshot().await;
        let filtered = filter_by_category(&snapshot.items, category);
        let page = paginate(&filtered, page, limit);

        NewsPage {
            items: page.items.into_iter().cloned().collect(),
            has_more: page.has_more,
            total_items: page.total_items,
            current_page: page.current_page,
            total_pages: page.total_pages,
            categories: distinct_categories(&snapshot.items),
            status: snapshot.status_message(),
        }
    }

    pub async fn get_categories(&self) -> Vec<String> {
        distinct_categories(&self.snapshot().await.items)
    }

    pub async fn toggle_like(
        &self,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<LikeStatus, LikeError> {
        self.likes.toggle_like(id, title, description).await
    }

    pub async fn get_suggestions(&self) -> Vec<NewsItem> {
        let snapshot = self.snapshot().await;
        suggest(&snapshot.items, &self.likes).await
    }
}

/// Keep the cached snapshot warm so requests rarely wait on a full fetch.
pub async fn start_background_refresh(service: Arc<NewsService>, interval: Duration) {
    info!("Starting initial feed fetch");
    let snapshot = service.snapshot().await;
    info!(items = snapshot.items.len(), "Initial feed fetch complete");

    loop {
        tokio::time::sleep(interval).await;
        let snapshot = service.snapshot().await;
        info!(items = snapshot.items.len(), "Scheduled refresh complete");
    }
}
