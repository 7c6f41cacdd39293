// ============================================================================
// CompDb — Embedded Database (redb)
// ============================================================================
// Persistent local storage for compositions and the item catalog.
// Default path: ~/.comp-builder/comps.redb (override via COMP_DB_PATH env var)
// ============================================================================

pub mod types;

pub use types::DbStats;

use anyhow::{anyhow, Result};
use redb::{Database, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::{Composition, Item};

// Table definitions
const COMPOSITIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("compositions");
const ITEMS: TableDefinition<&str, &[u8]> = TableDefinition::new("items");

/// Environment variable overriding the default database location
pub const DB_PATH_ENV: &str = "COMP_DB_PATH";

/// Embedded database for compositions and the catalog
pub struct CompDb {
    db: Database,
    path: PathBuf,
}

impl CompDb {
    /// Open (or create) the database at the given path.
    /// If `path` is None, uses COMP_DB_PATH env var or ~/.comp-builder/comps.redb
    pub fn open(path: Option<&str>) -> Result<Self> {
        let db_path = if let Some(p) = path {
            PathBuf::from(p)
        } else if let Ok(env_path) = std::env::var(DB_PATH_ENV) {
            PathBuf::from(env_path)
        } else {
            let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot determine home directory"))?;
            let data_dir = home.join(".comp-builder");
            std::fs::create_dir_all(&data_dir)
                .map_err(|e| anyhow!("Failed to create .comp-builder directory: {}", e))?;
            data_dir.join("comps.redb")
        };

        info!("Opening database at: {}", db_path.display());

        let db = Database::create(&db_path)
            .map_err(|e| anyhow!("Failed to open database: {}", e))?;

        // Ensure tables exist by doing a write transaction
        let write_txn = db
            .begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let _ = write_txn
                .open_table(COMPOSITIONS)
                .map_err(|e| anyhow!("Failed to create compositions table: {}", e))?;
            let _ = write_txn
                .open_table(ITEMS)
                .map_err(|e| anyhow!("Failed to create items table: {}", e))?;
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
    // Composition Operations
    // ========================================================================

    /// Write the whole record under its id. A later write of the same id
    /// replaces it entirely.
    pub fn store_composition(&self, comp: &Composition) -> Result<()> {
        if comp.id.is_empty() {
            return Err(anyhow!("Cannot store a composition without an id"));
        }
        let key = format!("comps:{}", comp.id);
        let value = serde_json::to_vec(comp)
            .map_err(|e| anyhow!("Failed to serialize composition: {}", e))?;

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        {
            let mut table = write_txn.open_table(COMPOSITIONS)
                .map_err(|e| anyhow!("Failed to open compositions table: {}", e))?;
            table.insert(key.as_str(), value.as_slice())
                .map_err(|e| anyhow!("Failed to insert composition: {}", e))?;
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit: {}", e))?;

        debug!("Stored composition: {}", comp.id);
        Ok(())
    }

    pub fn get_composition(&self, id: &str) -> Result<Option<Composition>> {
        let key = format!("comps:{}", id);

        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(COMPOSITIONS)
            .map_err(|e| anyhow!("Failed to open compositions table: {}", e))?;

        match table.get(key.as_str()).map_err(|e| anyhow!("Failed to get composition: {}", e))? {
            Some(value) => {
                let comp: Composition = serde_json::from_slice(value.value())
                    .map_err(|e| anyhow!("Failed to deserialize composition: {}", e))?;
                Ok(Some(comp))
            }
            None => Ok(None),
        }
    }

    /// All compositions, newest first
    pub fn list_compositions(&self) -> Result<Vec<Composition>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(COMPOSITIONS)
            .map_err(|e| anyhow!("Failed to open compositions table: {}", e))?;

        let mut results = Vec::new();
        let iter = table.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate compositions: {}", e))?;
        for entry in iter {
            let (_key, value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            let comp: Composition = serde_json::from_slice(value.value())
                .map_err(|e| anyhow!("Failed to deserialize composition: {}", e))?;
            results.push(comp);
        }

        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    pub fn delete_composition(&self, id: &str) -> Result<bool> {
        let key = format!("comps:{}", id);

        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        let removed;
        {
            let mut table = write_txn.open_table(COMPOSITIONS)
                .map_err(|e| anyhow!("Failed to open compositions table: {}", e))?;
            removed = table.remove(key.as_str())
                .map_err(|e| anyhow!("Failed to remove composition: {}", e))?
                .is_some();
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit delete: {}", e))?;

        if removed {
            debug!("Deleted composition: {}", id);
        }
        Ok(removed)
    }

    // ========================================================================
    // Catalog Operations
    // ========================================================================

    /// Swap the whole catalog for `items` in one transaction.
    /// Returns the number of items written.
    pub fn replace_items(&self, items: &[Item]) -> Result<usize> {
        let write_txn = self.db.begin_write()
            .map_err(|e| anyhow!("Failed to begin write: {}", e))?;
        write_txn.delete_table(ITEMS)
            .map_err(|e| anyhow!("Failed to clear items table: {}", e))?;
        {
            let mut table = write_txn.open_table(ITEMS)
                .map_err(|e| anyhow!("Failed to open items table: {}", e))?;
            for item in items {
                let key = format!("items:{}", item.id);
                let value = serde_json::to_vec(item)
                    .map_err(|e| anyhow!("Failed to serialize item: {}", e))?;
                table.insert(key.as_str(), value.as_slice())
                    .map_err(|e| anyhow!("Failed to insert item: {}", e))?;
            }
        }
        write_txn.commit().map_err(|e| anyhow!("Failed to commit catalog: {}", e))?;

        info!("Catalog replaced: {} items", items.len());
        Ok(items.len())
    }

    pub fn list_items(&self) -> Result<Vec<Item>> {
        let read_txn = self.db.begin_read()
            .map_err(|e| anyhow!("Failed to begin read: {}", e))?;
        let table = read_txn.open_table(ITEMS)
            .map_err(|e| anyhow!("Failed to open items table: {}", e))?;

        let mut results = Vec::new();
        let iter = table.range::<&str>(..)
            .map_err(|e| anyhow!("Failed to iterate items: {}", e))?;
        for entry in iter {
            let (_key, value) = entry.map_err(|e| anyhow!("Failed to read entry: {}", e))?;
            let item: Item = serde_json::from_slice(value.value())
                .map_err(|e| anyhow!("Failed to deserialize item: {}", e))?;
            results.push(item);
        }
        Ok(results)
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    pub fn stats(&self) -> Result<DbStats> {
        let comps = self.list_compositions()?;
        let items = self.list_items()?;

        let mut items_by_category = std::collections::BTreeMap::new();
        for item in &items {
            *items_by_category
                .entry(item.category.as_str().to_string())
                .or_insert(0usize) += 1;
        }

        Ok(DbStats {
            total_compositions: comps.len(),
            edit_locked: comps
                .iter()
                .filter(|c| crate::access::has_password(c.password.as_deref()))
                .count(),
            view_locked: comps
                .iter()
                .filter(|c| crate::access::is_view_locked(&c.viewer_password, c.is_public))
                .count(),
            total_slots: comps.iter().map(|c| c.slots.len()).sum(),
            total_items: items.len(),
            items_by_category,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemCategory, Player};

    fn temp_db() -> (CompDb, PathBuf) {
        let path = std::env::temp_dir().join(format!("comp-db-test-{}.redb", uuid::Uuid::new_v4()));
        let db = CompDb::open(path.to_str()).unwrap();
        (db, path)
    }

    fn comp(id: &str, created_at: i64) -> Composition {
        Composition {
            id: id.into(),
            title: format!("Comp {}", id),
            rally_point: "Martlock".into(),
            event_time: "19:00".into(),
            created_at,
            slots: vec![Player::new(1), Player::new(2)],
            ..Composition::default()
        }
    }

    #[test]
    fn test_store_get_delete() {
        let (db, path) = temp_db();
        let c = comp("a1", 10);
        db.store_composition(&c).unwrap();

        let loaded = db.get_composition("a1").unwrap().unwrap();
        assert_eq!(loaded, c);
        assert!(db.get_composition("missing").unwrap().is_none());

        assert!(db.delete_composition("a1").unwrap());
        assert!(!db.delete_composition("a1").unwrap());
        assert!(db.get_composition("a1").unwrap().is_none());

        drop(db);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_store_replaces_whole_record() {
        let (db, path) = temp_db();
        let mut c = comp("a1", 10);
        c.password = Some("pw".into());
        db.store_composition(&c).unwrap();

        c.password = None;
        c.slots.clear();
        db.store_composition(&c).unwrap();

        let loaded = db.get_composition("a1").unwrap().unwrap();
        assert_eq!(loaded.password, None);
        assert!(loaded.slots.is_empty());

        drop(db);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_store_requires_id() {
        let (db, path) = temp_db();
        assert!(db.store_composition(&Composition::default()).is_err());
        drop(db);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_list_newest_first() {
        let (db, path) = temp_db();
        db.store_composition(&comp("old", 100)).unwrap();
        db.store_composition(&comp("new", 300)).unwrap();
        db.store_composition(&comp("mid", 200)).unwrap();

        let ids: Vec<String> = db.list_compositions().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);

        drop(db);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_replace_items_and_stats() {
        let (db, path) = temp_db();
        db.replace_items(&[
            Item::new("T8_MAIN_SWORD", "Broadsword", ItemCategory::MainHand),
            Item::new("T8_MAIN_AXE", "Battleaxe", ItemCategory::MainHand),
        ])
        .unwrap();
        let written = db
            .replace_items(&[Item::new("T8_MEAL_STEW", "Beef Stew", ItemCategory::Food)])
            .unwrap();
        assert_eq!(written, 1);

        let items = db.list_items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Beef Stew");

        let mut locked = comp("x", 1);
        locked.password = Some("pw".into());
        locked.is_public = false;
        locked.viewer_password = "view".into();
        db.store_composition(&locked).unwrap();
        db.store_composition(&comp("y", 2)).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_compositions, 2);
        assert_eq!(stats.edit_locked, 1);
        assert_eq!(stats.view_locked, 1);
        assert_eq!(stats.total_slots, 4);
        assert_eq!(stats.total_items, 1);
        assert_eq!(stats.items_by_category.get("food"), Some(&1));

        drop(db);
        let _ = std::fs::remove_file(path);
    }
}
