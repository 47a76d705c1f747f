use std::collections::{BTreeSet, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

/// Keywords kept per liked item.
pub const MAX_KEYWORDS: usize = 5;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LikeError {
    #[error("Post ID is required")]
    MissingId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRecord {
    pub liked: bool,
    pub keywords: Vec<String>,
}

/// Lowercased words of `title` and `description`, deduplicated in first-seen
/// order, capped at [`MAX_KEYWORDS`].
pub fn extract_keywords(title: &str, description: &str) -> Vec<String> {
    let text = format!("{} {}", title, description).to_lowercase();
    let mut seen = HashSet::new();
    WORD.find_iter(&text)
        .map(|m| m.as_str())
        .filter(|word| seen.insert(*word))
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// In-memory record of which items have been liked. Nothing survives a restart.
#[derive(Default)]
pub struct LikeStore {
    records: RwLock<HashMap<String, LikeRecord>>,
}

impl LikeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the like state of `id`.
    ///
    /// Keywords are extracted when a record is created. Unliking keeps the
    /// record and its keywords, and liking it again reuses them.
    pub async fn toggle_like(
        &self,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<LikeStatus, LikeError> {
        if id.trim().is_empty() {
            return Err(LikeError::MissingId);
        }

        let mut records = self.records.write().await;
        let status = match records.get_mut(id) {
            Some(record) if record.liked => {
                record.liked = false;
                LikeStatus::Unliked
            }
            Some(record) => {
                record.liked = true;
                LikeStatus::Liked
            }
            None => {
                records.insert(
                    id.to_string(),
                    LikeRecord {
                        liked: true,
                        keywords: extract_keywords(title, description),
                    },
                );
                LikeStatus::Liked
            }
        };

        info!(post_id = %id, status = ?status, "Toggled like");
        Ok(status)
    }

    #[cfg(test)]
    pub async fn get(&self, id: &str) -> Option<LikeRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Union of keywords across every currently liked record.
    pub async fn liked_keywords(&self) -> BTreeSet<String> {
        self.records
            .read()
            .await
            .values()
            .filter(|record| record.liked)
            .flat_map(|record| record.keywords.iter().cloned())
            .collect()
    }
}
