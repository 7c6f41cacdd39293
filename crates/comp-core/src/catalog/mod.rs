//! ============================================================================
//! Item Catalog - Read-only item lookup for builds
//! ============================================================================
//! The catalog is loaded once (from the database or an import) and then only
//! read. Items are indexed by category; each category list is kept sorted by
//! sub-category then name, which is the order every listing uses.
//!
//! - `picker`: merges tier variants into the grouped list a build editor shows
//! - `import`: turns the public game-data item dump into catalog records
//! ============================================================================

pub mod import;
pub mod picker;

use std::collections::BTreeMap;

use tracing::debug;

use crate::item_id;
use crate::types::{Item, ItemCategory};

pub use import::{import_items, RawItem, DEFAULT_CATALOG_URL};
pub use picker::{PickerEntry, PickerGroup, OTHER_GROUP};

/// Items indexed by category
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_category: BTreeMap<ItemCategory, Vec<Item>>,
}

impl Catalog {
    /// Index a flat item list. Items are normalized on the way in.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut by_category: BTreeMap<ItemCategory, Vec<Item>> = BTreeMap::new();
        for item in items {
            let item = item.normalized();
            by_category.entry(item.category).or_default().push(item);
        }
        for list in by_category.values_mut() {
            list.sort_by(|a, b| {
                a.sub_category
                    .cmp(&b.sub_category)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }

        let catalog = Self { by_category };
        debug!("Catalog indexed: {} items", catalog.len());
        catalog
    }

    /// Items of one category, empty when the category has none
    pub fn category(&self, category: ItemCategory) -> &[Item] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every item, categories in their fixed display order
    pub fn flat(&self) -> impl Iterator<Item = &Item> {
        ItemCategory::ALL
            .into_iter()
            .flat_map(move |category| self.category(category).iter())
    }

    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter by category and case-insensitive name substring. Either filter
    /// may be omitted; a blank search matches everything.
    pub fn search(&self, category: Option<ItemCategory>, text: Option<&str>) -> Vec<&Item> {
        let needle = text
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let matches = |item: &&Item| match &needle {
            Some(n) => item.name.to_lowercase().contains(n.as_str()),
            None => true,
        };

        match category {
            Some(cat) => self.category(cat).iter().filter(matches).collect(),
            None => self.flat().filter(matches).collect(),
        }
    }

    /// Display name of an identifier, searched over the whole catalog
    pub fn display_name(&self, identifier: &str) -> String {
        item_id::display_name(identifier, self.flat())
    }

    /// Catalog item an identifier is a variant of, looked up within its slot
    pub fn resolve(&self, slot: ItemCategory, identifier: &str) -> Option<&Item> {
        item_id::resolve_base_item(identifier, self.category(slot))
    }
}
