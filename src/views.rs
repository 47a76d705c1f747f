use std::collections::HashSet;

use crate::models::NewsItem;

/// Category name that disables filtering.
pub const ALL_CATEGORIES: &str = "all";

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 20;

/// Keep items whose category string contains `category`.
///
/// This is substring containment on the lowercased category list, so
/// "sports" also matches "e-sports". An empty category or "all" keeps everything.
pub fn filter_by_category<'a>(items: &'a [NewsItem], category: &str) -> Vec<&'a NewsItem> {
    let category = category.trim().to_lowercase();
    if category.is_empty() || category == ALL_CATEGORIES {
        return items.iter().collect();
    }
    items
        .iter()
        .filter(|item| item.category.contains(&category))
        .collect()
}

/// "all" followed by every distinct category in order of first appearance.
pub fn distinct_categories(items: &[NewsItem]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut categories = vec![ALL_CATEGORIES.to_string()];
    for item in items {
        if seen.insert(item.category.as_str()) {
            categories.push(item.category.clone());
        }
    }
    categories
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub total_items: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Slice `[(page - 1) * limit, page * limit)` out of `items`.
///
/// `page` and `limit` below 1 are clamped to 1. Pages past the end are empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, limit: usize) -> Page<T> {
    let page = page.max(1);
    let limit = limit.max(1);
    let total_items = items.len();

    let start = (page - 1).saturating_mul(limit).min(total_items);
    let end = start.saturating_add(limit).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        has_more: page.saturating_mul(limit) < total_items,
        total_items,
        current_page: page,
        total_pages: total_items.div_ceil(limit),
    }
}
