use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::likes::LikeStore;
use crate::models::NewsItem;

/// What suggestions are matched against.
///
/// `categories` narrows matches to items in one of the listed categories.
/// Likes don't track categories yet, so a filter built from a [`LikeStore`]
/// always leaves it empty and it has no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionFilter {
    pub keywords: Vec<String>,
    pub categories: Vec<String>,
}

impl SuggestionFilter {
    pub async fn from_likes(likes: &LikeStore) -> Self {
        Self {
            keywords: likes.liked_keywords().await.into_iter().collect(),
            categories: Vec::new(),
        }
    }

    /// One case-insensitive alternation over every keyword.
    fn keyword_pattern(&self) -> Option<Regex> {
        if self.keywords.is_empty() {
            return None;
        }
        let pattern = self
            .keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(error = %err, "Failed to build keyword pattern");
                None
            }
        }
    }

    /// Items whose title or description contains any keyword, newest first.
    /// No keywords means no suggestions.
    pub fn apply(&self, items: &[NewsItem]) -> Vec<NewsItem> {
        let Some(pattern) = self.keyword_pattern() else {
            return Vec::new();
        };

        let mut matches: Vec<NewsItem> = items
            .iter()
            .filter(|item| pattern.is_match(&item.title) || pattern.is_match(&item.description))
            .filter(|item| self.categories.is_empty() || self.categories.contains(&item.category))
            .cloned()
            .collect();

        matches.sort_by(NewsItem::newest_first);
        matches
    }
}

/// Items from `items` related to what has been liked in `likes`.
pub async fn suggest(items: &[NewsItem], likes: &LikeStore) -> Vec<NewsItem> {
    SuggestionFilter::from_likes(likes).await.apply(items)
}
