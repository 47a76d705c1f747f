use std::time::Duration;

use feed_rs::model::{Entry, FeedType};
use feed_rs::parser;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::FeedSource;
use crate::models::{NewsItem, DEFAULT_CATEGORY};

/// Several upstream hosts reject requests that don't look like a browser.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const FEED_ACCEPT: &str = "application/xml, text/xml, */*; q=0.01";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: {0}")]
    Status(StatusCode),
    #[error("feed parsing error: {0}")]
    Parse(#[from] parser::ParseFeedError),
    #[error("invalid feed structure: {0}")]
    Structure(String),
}

impl FetchError {
    /// Short tag for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Status(_) => "status",
            FetchError::Parse(_) => "parse",
            FetchError::Structure(_) => "structure",
        }
    }
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch one source and normalize its items. A single attempt, no retries.
    pub async fn fetch(&self, source: &FeedSource) -> Result<Vec<NewsItem>, FetchError> {
        debug!(source = %source.name, url = %source.url, "Fetching feed");

        let response = self
            .client
            .get(&source.url)
            .header(REFERER, source.url.as_str())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let bytes = response.bytes().await?;
        let items = parse_items(&bytes, source)?;

        info!(source = %source.name, count = items.len(), "Fetched feed");
        Ok(items)
    }
}

/// Parse an RSS document into normalized items, in document order.
///
/// Anything that isn't an RSS channel with at least one item is a structural
/// failure rather than an empty result.
pub fn parse_items(body: &[u8], source: &FeedSource) -> Result<Vec<NewsItem>, FetchError> {
    let feed = parser::parse(body)?;

    match feed.feed_type {
        FeedType::RSS0 | FeedType::RSS2 => {}
        other => {
            return Err(FetchError::Structure(format!(
                "expected an RSS channel, found {:?}",
                other
            )))
        }
    }

    if feed.entries.is_empty() {
        return Err(FetchError::Structure("channel has no items".to_string()));
    }

    let items = feed
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| normalize_entry(entry, index, source))
        .collect();

    Ok(items)
}

fn normalize_entry(entry: &Entry, index: usize, source: &FeedSource) -> NewsItem {
    let title = entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default();

    let link = entry
        .links
        .first()
        .map(|l| l.href.trim().to_string())
        .unwrap_or_default();

    let description = entry
        .summary
        .as_ref()
        .map(|s| s.content.trim().to_string())
        .unwrap_or_default();

    let categories: Vec<String> = entry
        .categories
        .iter()
        .map(|c| c.term.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    let category = if categories.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        categories.join(", ")
    };

    NewsItem {
        id: format!("{}-{}", source.name, index),
        title,
        link,
        description,
        published: entry.published,
        category,
        source: source.name.clone(),
    }
}
