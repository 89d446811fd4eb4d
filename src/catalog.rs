//! Read access to the book catalog and users' favorites.
//!
//! The catalog itself (CRUD, ratings, comments) lives outside this crate; the
//! recommendation engine only needs to look items up and list favorites, which
//! is what [`ItemCatalog`] captures.

pub mod item;
pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;

pub use self::item::{CatalogRecord, Item, ItemSummary};
pub use self::memory::MemoryCatalog;

/// Catalog lookups used by the recommendation service.
#[async_trait]
pub trait ItemCatalog: Send + Sync {
    /// Look up an item by its work key.
    async fn get(&self, item_id: &str) -> Result<Option<Item>>;

    /// Work keys of every item the user has favorited.
    async fn get_favorites(&self, user_id: &str) -> Result<HashSet<String>>;

    /// Work keys of every item in the catalog, for bulk embedding.
    async fn item_ids(&self) -> Result<Vec<String>>;
}
