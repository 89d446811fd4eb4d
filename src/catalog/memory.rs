//! In-memory catalog implementation.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::ItemCatalog;
use crate::catalog::item::{CatalogRecord, Item};
use crate::error::{LibrisError, Result};

/// A catalog held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    items: RwLock<HashMap<String, Item>>,
    favorites: RwLock<HashMap<String, HashSet<String>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON Lines catalog, one [`CatalogRecord`] per line.
    ///
    /// Blank lines are skipped; a malformed line fails the whole load.
    pub fn from_jsonl_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_jsonl_reader(BufReader::new(file))
    }

    pub fn from_jsonl_reader<R: BufRead>(reader: R) -> Result<Self> {
        let catalog = Self::new();
        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CatalogRecord = serde_json::from_str(&line).map_err(|e| {
                LibrisError::invalid_argument(format!(
                    "catalog line {}: {e}",
                    line_num + 1
                ))
            })?;
            catalog.add_record(record);
        }
        debug!(items = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn add_record(&self, record: CatalogRecord) {
        for user in record.favorited_by {
            self.add_favorite(user, record.item.work_key.clone());
        }
        self.add_item(record.item);
    }

    /// Insert or replace an item.
    pub fn add_item(&self, item: Item) {
        self.items.write().insert(item.work_key.clone(), item);
    }

    pub fn add_favorite<U: Into<String>, I: Into<String>>(&self, user_id: U, item_id: I) {
        self.favorites
            .write()
            .entry(user_id.into())
            .or_default()
            .insert(item_id.into());
    }

    /// Returns whether the favorite existed.
    pub fn remove_favorite(&self, user_id: &str, item_id: &str) -> bool {
        self.favorites
            .write()
            .get_mut(user_id)
            .is_some_and(|set| set.remove(item_id))
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl ItemCatalog for MemoryCatalog {
    async fn get(&self, item_id: &str) -> Result<Option<Item>> {
        Ok(self.items.read().get(item_id).cloned())
    }

    async fn get_favorites(&self, user_id: &str) -> Result<HashSet<String>> {
        Ok(self
            .favorites
            .read()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn item_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.items.read().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
