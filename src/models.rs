use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Category assigned to items that carry none of their own.
pub const DEFAULT_CATEGORY: &str = "general";

/// A normalized article.
///
/// `id` is `"{source}-{index}"` and is only unique within one aggregated
/// snapshot. `published` is `None` when the feed had no parseable date; such
/// items sort after every dated item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
    pub category: String,
    pub source: String,
}

impl NewsItem {
    /// Newest first, undated items last. Use with a stable sort.
    pub fn newest_first(a: &NewsItem, b: &NewsItem) -> Ordering {
        b.published.cmp(&a.published)
    }
}

/// The result of one fan-out over every configured source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Sorted newest first.
    pub items: Vec<NewsItem>,
    /// Sources that yielded nothing after exhausting their retries.
    pub unavailable: Vec<String>,
    pub source_count: usize,
}

impl Snapshot {
    /// Informational text for callers when some sources could not be loaded.
    pub fn status_message(&self) -> Option<String> {
        if self.unavailable.is_empty() {
            return None;
        }
        if self.unavailable.len() == self.source_count {
            return Some("No news sources could be loaded.".to_string());
        }
        Some(format!(
            "{} of {} sources failed to load: {}",
            self.unavailable.len(),
            self.source_count,
            self.unavailable.join(", ")
        ))
    }
}

/// One page of the aggregated stream, as returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPage {
    pub items: Vec<NewsItem>,
    pub has_more: bool,
    pub total_items: usize,
    pub current_page: usize,
    pub total_pages: usize,
    /// Every category in the unfiltered snapshot, "all" first.
    pub categories: Vec<String>,
    /// Set when some sources could not be loaded.
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, published: Option<DateTime<Utc>>) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: String::new(),
            link: String::new(),
            description: String::new(),
            published,
            category: DEFAULT_CATEGORY.to_string(),
            source: "Test".to_string(),
        }
    }

    #[test]
    fn test_newest_first_puts_undated_last() {
        let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let mut items = vec![
            item("undated", None),
            item("older", Some(older)),
            item("newer", Some(newer)),
        ];
        items.sort_by(NewsItem::newest_first);

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older", "undated"]);
    }

    #[test]
    fn test_newest_first_is_stable_for_ties() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut items = vec![item("a", Some(at)), item("b", Some(at)), item("c", None), item("d", None)];
        items.sort_by(NewsItem::newest_first);

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_status_message() {
        let healthy = Snapshot {
            items: vec![],
            unavailable: vec![],
            source_count: 3,
        };
        assert_eq!(healthy.status_message(), None);

        let partial = Snapshot {
            items: vec![],
            unavailable: vec!["BBC".to_string()],
            source_count: 3,
        };
        assert_eq!(
            partial.status_message().as_deref(),
            Some("1 of 3 sources failed to load: BBC")
        );

        let total = Snapshot {
            items: vec![],
            unavailable: vec!["A".to_string(), "B".to_string()],
            source_count: 2,
        };
        assert_eq!(
            total.status_message().as_deref(),
            Some("No news sources could be loaded.")
        );
    }

    #[test]
    fn test_published_serializes_as_null_when_missing() {
        let json = serde_json::to_value(item("x", None)).unwrap();
        assert!(json["published"].is_null());
        assert_eq!(json["category"], "general");
    }
}
