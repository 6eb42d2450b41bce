//! Saved transformations, newest first.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::{get_typed, keys, set_typed, Storage};
use crate::domain::HistoryItem;
use crate::error::Result;

pub const DEFAULT_MAX_HISTORY: usize = 25;

/// Capped history list; the oldest entries are evicted first
#[derive(Clone)]
pub struct HistoryStore {
    storage: Arc<dyn Storage>,
    max_items: usize,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_items: DEFAULT_MAX_HISTORY,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// All entries, newest first
    pub async fn list(&self) -> Result<Vec<HistoryItem>> {
        Ok(get_typed(self.storage.as_ref(), keys::HISTORY)
            .await?
            .unwrap_or_default())
    }

    /// Prepend an entry, dropping the oldest beyond the cap
    pub async fn save(&self, item: HistoryItem) -> Result<()> {
        let mut items = self.list().await?;
        items.insert(0, item);
        if items.len() > self.max_items {
            debug!(evicted = items.len() - self.max_items, "Evicting old history");
            items.truncate(self.max_items);
        }
        set_typed(self.storage.as_ref(), keys::HISTORY, &items).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<HistoryItem>> {
        Ok(self.list().await?.into_iter().find(|item| item.id == id))
    }

    /// Remove one entry; returns whether it existed
    pub async fn remove(&self, id: Uuid) -> Result<bool> {
        let mut items = self.list().await?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Ok(false);
        }
        set_typed(self.storage.as_ref(), keys::HISTORY, &items).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(&[keys::HISTORY]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenerationOptions;
    use crate::store::MemoryStorage;

    fn item(n: usize) -> HistoryItem {
        HistoryItem::new(
            format!("rhyme {}", n),
            format!("Page {}", n),
            format!("https://example.com/{}", n),
            GenerationOptions::default(),
            100,
        )
    }

    fn store(max: usize) -> HistoryStore {
        HistoryStore::new(Arc::new(MemoryStorage::new())).with_max_items(max)
    }

    #[tokio::test]
    async fn test_newest_first() {
        let history = store(DEFAULT_MAX_HISTORY);
        history.save(item(1)).await.unwrap();
        history.save(item(2)).await.unwrap();

        let items = history.list().await.unwrap();
        assert_eq!(items[0].title, "Page 2");
        assert_eq!(items[1].title, "Page 1");
    }

    #[tokio::test]
    async fn test_cap_evicts_oldest() {
        let history = store(3);
        for n in 1..=5 {
            history.save(item(n)).await.unwrap();
        }

        let titles: Vec<String> = history
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["Page 5", "Page 4", "Page 3"]);
    }

    #[tokio::test]
    async fn test_get_remove_clear() {
        let history = store(DEFAULT_MAX_HISTORY);
        let first = item(1);
        let id = first.id;
        history.save(first).await.unwrap();
        history.save(item(2)).await.unwrap();

        assert_eq!(history.get(id).await.unwrap().unwrap().title, "Page 1");
        assert!(history.remove(id).await.unwrap());
        assert!(!history.remove(id).await.unwrap());
        assert!(history.get(id).await.unwrap().is_none());

        history.clear().await.unwrap();
        assert!(history.list().await.unwrap().is_empty());
    }
}
