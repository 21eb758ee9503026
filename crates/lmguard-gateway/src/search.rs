//! Library search collaborator.
//!
//! The gateway only validates the query and shapes the results; finding
//! items is delegated to a [`LibrarySearch`] implementation.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Results returned per query.
pub const MAX_RESULTS: usize = 20;
/// Abstracts are cut to this many characters.
pub const ABSTRACT_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("library unavailable: {0}")]
    Unavailable(String),
}

/// A stored library item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryItem {
    pub key: String,
    pub title: String,
    pub item_type: String,
    pub date: String,
    pub abstract_note: String,
    pub notes: Vec<String>,
}

/// What the search endpoint returns per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    pub item_type: String,
    pub date: String,
    #[serde(rename = "abstract")]
    pub abstract_preview: String,
}

impl From<&LibraryItem> for SearchHit {
    fn from(item: &LibraryItem) -> Self {
        Self {
            key: item.key.clone(),
            title: item.title.clone(),
            item_type: item.item_type.clone(),
            date: item.date.clone(),
            abstract_preview: item
                .abstract_note
                .chars()
                .take(ABSTRACT_PREVIEW_CHARS)
                .collect(),
        }
    }
}

#[async_trait]
pub trait LibrarySearch: Send + Sync {
    /// Items whose title, abstract or notes contain `query`, best first.
    async fn search(&self, query: &str) -> Result<Vec<LibraryItem>, SearchError>;
}

/// Case-insensitive substring search over an in-memory item list.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    items: RwLock<Vec<LibraryItem>>,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = LibraryItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
        }
    }

    pub fn insert(&self, item: LibraryItem) {
        self.items.write().push(item);
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl LibrarySearch for InMemoryLibrary {
    async fn search(&self, query: &str) -> Result<Vec<LibraryItem>, SearchError> {
        let needle = query.trim().to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);
        Ok(self
            .items
            .read()
            .iter()
            .filter(|item| {
                contains(&item.title)
                    || contains(&item.abstract_note)
                    || item.notes.iter().any(|n| contains(n))
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, title: &str, abstract_note: &str) -> LibraryItem {
        LibraryItem {
            key: key.into(),
            title: title.into(),
            abstract_note: abstract_note.into(),
            ..LibraryItem::default()
        }
    }

    #[tokio::test]
    async fn matches_title_abstract_or_notes() {
        let library = InMemoryLibrary::with_items([
            item("A", "Attention Is All You Need", ""),
            item("B", "Other", "a survey of ATTENTION mechanisms"),
            item("C", "Unrelated", ""),
        ]);
        library.insert(LibraryItem {
            key: "D".into(),
            notes: vec!["my attention note".into()],
            ..LibraryItem::default()
        });

        let keys: Vec<_> = library
            .search("attention")
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.key)
            .collect();
        assert_eq!(keys, vec!["A", "B", "D"]);
    }

    #[test]
    fn hit_truncates_abstract_by_characters() {
        let long = "é".repeat(250);
        let hit = SearchHit::from(&item("K", "T", &long));
        assert_eq!(hit.abstract_preview.chars().count(), ABSTRACT_PREVIEW_CHARS);
        let json = serde_json::to_value(&hit).unwrap();
        assert!(json.get("abstract").is_some());
        assert!(json.get("itemType").is_some());
    }
}
