// ============================================================================
// WardrobeDb - Embedded Database (redb)
// ============================================================================
// Persistent local storage for the clothing catalog and saved outfits.
// Records are JSON so the two collections export as-is.
// Default path: ~/.wardrobe/wardrobe.redb (see WardrobeConfig)
// ============================================================================

pub mod types;

pub use types::{DbStats, ItemUpdate};

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition, TableHandle};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::WardrobeError;
use crate::types::{ClothingCategory, ClothingItem, Outfit};

type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

// Table definitions
const ITEMS: RecordTable = TableDefinition::new("items");
const OUTFITS: RecordTable = TableDefinition::new("outfits");

/// Read/write access to the catalog and outfit history.
///
/// Anything that can produce a catalog, accept new items and keep saved
/// outfits can stand in for `WardrobeDb`.
pub trait CatalogStore {
    fn load_items(&self) -> Result<Vec<ClothingItem>>;

    /// Add an item to the catalog, overwriting one with the same id
    fn persist_item(&self, item: &ClothingItem) -> Result<()>;

    fn load_outfit_history(&self) -> Result<Vec<Outfit>>;

    /// Save an outfit. Saving the same outfit again overwrites it.
    fn persist_outfit(&self, outfit: &Outfit) -> Result<()>;
}

/// Embedded database for the wardrobe
pub struct WardrobeDb {
    db: Database,
    path: PathBuf,
}

impl WardrobeDb {
    /// Open (or create) the database at the given path, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
        }

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn.open_table(ITEMS).map_err(|e| anyhow!("Failed to create items table: {}", e))?;
            let _ = write_txn.open_table(OUTFITS).map_err(|e| anyhow!("Failed to create outfits table: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit init: {}", e))?;

        info!("Database ready");

        Ok(Self { db, path: db_path })
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Record helpers
    // ========================================================================

    fn put<T: Serialize>(&self, table: RecordTable, key: &str, record: &T) -> Result<()> {
        let value = serde_json::to_vec(record)
            .map_err(|e| anyhow!("Failed to serialize {} record: {}", table.name(), e))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut records = write_txn.open_table(table)
                .map_err(|e| anyhow!("Failed to open {} table: {}", table.name(), e))?;
            records.insert(key, value.as_slice())
                .map_err(|e| anyhow!("Failed to insert into {}: {}", table.name(), e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, table: RecordTable, key: &str) -> Result<Option<T>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let records = read_txn.open_table(table)
            .map_err(|e| anyhow!("Failed to open {} table: {}", table.name(), e))?;

        let record = match records.get(key).map_err(|e| anyhow!("Failed to get {}: {}", key, e))? {
            Some(value) => Some(
                serde_json::from_slice(value.value())
                    .map_err(|e| anyhow!("Failed to deserialize {}: {}", key, e))?,
            ),
            None => None,
        };
        Ok(record)
    }

    fn scan<T: DeserializeOwned>(&self, table: RecordTable) -> Result<Vec<T>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let records = read_txn.open_table(table)
            .map_err(|e| anyhow!("Failed to open {} table: {}", table.name(), e))?;

        let mut results = Vec::new();
        let iter = records.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate {}: {}", table.name(), e))?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            let record: T = serde_json::from_slice(value.value())
                .map_err(|e| anyhow!("Failed to deserialize {}: {}", key.value(), e))?;
            results.push(record);
        }
        Ok(results)
    }

    fn take<T: DeserializeOwned>(&self, table: RecordTable, key: &str) -> Result<Option<T>> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed: Option<T>;
        {
            let mut records = write_txn.open_table(table)
                .map_err(|e| anyhow!("Failed to open {} table: {}", table.name(), e))?;
            removed = match records.remove(key).map_err(|e| anyhow!("Failed to remove {}: {}", key, e))? {
                Some(value) => Some(
                    serde_json::from_slice(value.value())
                        .map_err(|e| anyhow!("Failed to deserialize {}: {}", key, e))?,
                ),
                None => None,
            };
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;
        Ok(removed)
    }

    // ========================================================================
    // Clothing Item Operations
    // ========================================================================

    /// Insert an item, replacing any stored item with the same id
    pub fn add_item(&self, item: &ClothingItem) -> Result<()> {
        self.put(ITEMS, &item_key(&item.id), item)?;
        debug!("Stored item: {} ({})", item.id, item.category);
        Ok(())
    }

    pub fn get_item(&self, item_id: &str) -> Result<Option<ClothingItem>> {
        self.fetch(ITEMS, &item_key(item_id))
    }

    /// All items, oldest first
    pub fn list_items(&self) -> Result<Vec<ClothingItem>> {
        let mut items: Vec<ClothingItem> = self.scan(ITEMS)?;
        items.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    pub fn list_items_by_category(&self, category: ClothingCategory) -> Result<Vec<ClothingItem>> {
        Ok(self
            .list_items()?
            .into_iter()
            .filter(|item| item.category == category)
            .collect())
    }

    pub fn update_item(&self, item_id: &str, update: ItemUpdate) -> Result<ClothingItem> {
        let mut item = self
            .get_item(item_id)?
            .ok_or_else(|| WardrobeError::ItemNotFound(item_id.to_string()))?;

        update.apply(&mut item);
        self.add_item(&item)?;
        debug!("Updated item {}", item_id);
        Ok(item)
    }

    /// Remove an item from the catalog and return it so its image files can
    /// be cleaned up. Saved outfits keep their own copy.
    pub fn delete_item(&self, item_id: &str) -> Result<Option<ClothingItem>> {
        let removed: Option<ClothingItem> = self.take(ITEMS, &item_key(item_id))?;
        if removed.is_some() {
            debug!("Deleted item: {}", item_id);
        }
        Ok(removed)
    }

    // ========================================================================
    // Outfit Operations
    // ========================================================================

    pub fn add_outfit(&self, outfit: &Outfit) -> Result<()> {
        self.put(OUTFITS, &outfit_key(&outfit.id), outfit)?;
        debug!("Stored outfit: {} ({} items)", outfit.id, outfit.items.len());
        Ok(())
    }

    pub fn get_outfit(&self, outfit_id: &str) -> Result<Option<Outfit>> {
        self.fetch(OUTFITS, &outfit_key(outfit_id))
    }

    /// All saved outfits, oldest first
    pub fn list_outfits(&self) -> Result<Vec<Outfit>> {
        let mut outfits: Vec<Outfit> = self.scan(OUTFITS)?;
        outfits.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(outfits)
    }

    pub fn list_favorite_outfits(&self) -> Result<Vec<Outfit>> {
        Ok(self
            .list_outfits()?
            .into_iter()
            .filter(|outfit| outfit.is_favorite)
            .collect())
    }

    pub fn delete_outfit(&self, outfit_id: &str) -> Result<bool> {
        let removed: Option<Outfit> = self.take(OUTFITS, &outfit_key(outfit_id))?;
        if removed.is_some() {
            debug!("Deleted outfit: {}", outfit_id);
        }
        Ok(removed.is_some())
    }

    /// Flip the favorite flag and return the new value
    pub fn toggle_outfit_favorite(&self, outfit_id: &str) -> Result<bool> {
        let mut outfit = self
            .get_outfit(outfit_id)?
            .ok_or_else(|| WardrobeError::OutfitNotFound(outfit_id.to_string()))?;

        outfit.is_favorite = !outfit.is_favorite;
        self.add_outfit(&outfit)?;
        debug!("Outfit {} favorite: {}", outfit_id, outfit.is_favorite);
        Ok(outfit.is_favorite)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn stats(&self) -> Result<DbStats> {
        let items = self.list_items()?;
        let outfits = self.list_outfits()?;

        let mut item_counts = BTreeMap::new();
        for item in &items {
            *item_counts.entry(item.category).or_insert(0usize) += 1;
        }

        Ok(DbStats {
            total_items: items.len(),
            item_counts,
            total_outfits: outfits.len(),
            favorite_outfits: outfits.iter().filter(|o| o.is_favorite).count(),
        })
    }
}

impl CatalogStore for WardrobeDb {
    fn load_items(&self) -> Result<Vec<ClothingItem>> {
        self.list_items()
    }

    fn persist_item(&self, item: &ClothingItem) -> Result<()> {
        self.add_item(item)
    }

    fn load_outfit_history(&self) -> Result<Vec<Outfit>> {
        self.list_outfits()
    }

    fn persist_outfit(&self, outfit: &Outfit) -> Result<()> {
        self.add_outfit(outfit)
    }
}

fn item_key(item_id: &str) -> String {
    format!("items:{}", item_id)
}

fn outfit_key(outfit_id: &str) -> String {
    format!("outfits:{}", outfit_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outfit::OutfitComposer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn item(id: &str, category: ClothingCategory, added_at: i64) -> ClothingItem {
        ClothingItem {
            id: id.to_string(),
            image_uri: format!("/media/images/{}.jpg", id),
            thumbnail_uri: format!("/media/thumbs/{}.jpg", id),
            category,
            added_at,
        }
    }

    fn outfit(id: &str, items: Vec<ClothingItem>, created_at: i64) -> Outfit {
        Outfit {
            id: id.to_string(),
            items,
            created_at,
            is_favorite: false,
        }
    }

    #[test]
    fn test_items_roundtrip_in_added_order() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();

        db.add_item(&item("b", ClothingCategory::Pants, 20)).unwrap();
        db.add_item(&item("a", ClothingCategory::Top, 10)).unwrap();
        db.add_item(&item("c", ClothingCategory::Top, 30)).unwrap();

        let ids: Vec<String> = db.list_items().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let tops = db.list_items_by_category(ClothingCategory::Top).unwrap();
        assert_eq!(tops.len(), 2);
        assert_eq!(db.get_item("b").unwrap().unwrap().category, ClothingCategory::Pants);
        assert!(db.get_item("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_item() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        db.add_item(&item("a", ClothingCategory::Pants, 1)).unwrap();

        let updated = db
            .update_item("a", ItemUpdate::category(ClothingCategory::LongSkirt))
            .unwrap();
        assert_eq!(updated.category, ClothingCategory::LongSkirt);
        assert_eq!(updated.image_uri, "/media/images/a.jpg");
        assert_eq!(db.get_item("a").unwrap().unwrap().category, ClothingCategory::LongSkirt);

        let err = db.update_item("nope", ItemUpdate::default()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<WardrobeError>(),
            Some(&WardrobeError::ItemNotFound("nope".into()))
        );
    }

    #[test]
    fn test_delete_item_keeps_saved_outfits() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        let top = item("t", ClothingCategory::Top, 1);
        let pants = item("p", ClothingCategory::Pants, 2);
        db.add_item(&top).unwrap();
        db.add_item(&pants).unwrap();
        db.add_outfit(&outfit("o1", vec![top.clone(), pants.clone()], 5)).unwrap();

        let removed = db.delete_item("t").unwrap();
        assert_eq!(removed, Some(top.clone()));
        assert!(db.delete_item("t").unwrap().is_none());

        let saved = db.get_outfit("o1").unwrap().unwrap();
        assert_eq!(saved.items[0], top);
    }

    #[test]
    fn test_outfit_favorites_and_delete() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        let items = vec![item("t", ClothingCategory::Top, 1), item("p", ClothingCategory::Pants, 2)];
        db.add_outfit(&outfit("late", items.clone(), 200)).unwrap();
        db.add_outfit(&outfit("early", items.clone(), 100)).unwrap();

        let ids: Vec<String> = db.list_outfits().unwrap().into_iter().map(|o| o.id).collect();
        assert_eq!(ids, vec!["early", "late"]);

        assert!(db.toggle_outfit_favorite("late").unwrap());
        assert_eq!(db.list_favorite_outfits().unwrap().len(), 1);
        assert!(!db.toggle_outfit_favorite("late").unwrap());
        assert!(db.list_favorite_outfits().unwrap().is_empty());
        assert!(db.toggle_outfit_favorite("ghost").is_err());

        assert!(db.delete_outfit("early").unwrap());
        assert!(!db.delete_outfit("early").unwrap());
        assert_eq!(db.list_outfits().unwrap().len(), 1);
    }

    #[test]
    fn test_persist_outfit_is_idempotent() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        let o = outfit("o", vec![item("t", ClothingCategory::Top, 1)], 1);

        db.persist_outfit(&o).unwrap();
        db.persist_outfit(&o).unwrap();
        assert_eq!(db.load_outfit_history().unwrap(), vec![o]);
    }

    #[test]
    fn test_stats() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        db.add_item(&item("t1", ClothingCategory::Top, 1)).unwrap();
        db.add_item(&item("t2", ClothingCategory::Top, 2)).unwrap();
        db.add_item(&item("s", ClothingCategory::Shoes, 3)).unwrap();
        let mut fav = outfit("o", vec![], 1);
        fav.is_favorite = true;
        db.add_outfit(&fav).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_items, 3);
        assert_eq!(stats.item_counts.get(&ClothingCategory::Top), Some(&2));
        assert_eq!(stats.item_counts.get(&ClothingCategory::Coat), None);
        assert_eq!(stats.total_outfits, 1);
        assert_eq!(stats.favorite_outfits, 1);
    }

    #[test]
    fn test_reopen_preserves_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("wardrobe.redb");
        {
            let db = WardrobeDb::open(&path).unwrap();
            db.add_item(&item("t", ClothingCategory::Top, 1)).unwrap();
        }
        let db = WardrobeDb::open(&path).unwrap();
        assert_eq!(db.load_items().unwrap().len(), 1);
        assert_eq!(db.path(), path.as_path());
    }

    #[test]
    fn test_compose_from_store() {
        let dir = tempdir().unwrap();
        let db = WardrobeDb::open(dir.path().join("wardrobe.redb")).unwrap();
        db.add_item(&item("A", ClothingCategory::Top, 1)).unwrap();
        db.add_item(&item("B", ClothingCategory::Pants, 2)).unwrap();

        let mut composer = OutfitComposer::with_rng(StdRng::seed_from_u64(1));
        let catalog = db.load_items().unwrap();
        let history = db.load_outfit_history().unwrap();
        let suggested = composer.compose(&catalog, &history).unwrap();
        db.persist_outfit(&suggested).unwrap();

        let history = db.load_outfit_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].item_ids(), vec!["A", "B"]);
    }
}
