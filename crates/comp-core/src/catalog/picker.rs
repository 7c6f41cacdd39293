//! Item picker: the grouped, tier-filtered list shown when choosing an item
//! for one build slot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::item_id::{self, Variant};
use crate::types::{Item, ItemCategory};

/// Group label for items without a sub-category
pub const OTHER_GROUP: &str = "Other";

/// One selectable item, with the identifier a click would store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerEntry {
    pub item: Item,
    pub variant_id: String,
    pub tier: u32,
    pub enchant: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerGroup {
    pub name: String,
    pub items: Vec<PickerEntry>,
}

/// Identity of an item across its tier variants: the id with tier token and
/// enchant stripped, plus the sub-category
fn merge_key(item: &Item) -> (String, Option<String>) {
    let without_enchant = item.id.split('@').next().unwrap_or("");
    let base = match strip_tier_token(without_enchant) {
        Some(rest) => rest,
        None => without_enchant,
    };
    (base.to_string(), item.sub_category.clone())
}

fn strip_tier_token(id: &str) -> Option<&str> {
    let rest = id.strip_prefix('T')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    rest[digits..].strip_prefix('_')
}

/// Collapse tier variants of the same item into one record. Valid tiers are
/// unioned and the id of the highest-tier variant is kept. First-seen order
/// is preserved.
pub fn merge_variants<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Item> {
    let mut order: Vec<(String, Option<String>)> = Vec::new();
    let mut merged: BTreeMap<(String, Option<String>), Item> = BTreeMap::new();

    for item in items {
        let key = merge_key(item);
        let tiers: Vec<u32> = if item.valid_tiers.is_empty() {
            vec![item.tier]
        } else {
            item.valid_tiers.clone()
        };

        match merged.get_mut(&key) {
            Some(existing) => {
                existing.valid_tiers.extend(tiers);
                existing.valid_tiers.sort_unstable();
                existing.valid_tiers.dedup();
                if item.tier > existing.tier {
                    existing.id = item.id.clone();
                    existing.tier = item.tier;
                }
            }
            None => {
                let mut first = item.clone();
                first.valid_tiers = tiers;
                first.valid_tiers.sort_unstable();
                first.valid_tiers.dedup();
                order.push(key.clone());
                merged.insert(key, first);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| merged.remove(&key))
        .collect()
}

/// Build the picker list for one slot.
///
/// `items` are the slot's catalog items (already narrowed by any search).
/// Equipment slots only show items that exist at `selected_tier`; mounts and
/// consumables show everything at their highest tier. Groups come out in
/// name order.
pub fn build_picker<'a>(
    slot: ItemCategory,
    items: impl IntoIterator<Item = &'a Item>,
    selected_tier: u32,
    selected_enchant: u32,
) -> Vec<PickerGroup> {
    let mut groups: BTreeMap<String, Vec<PickerEntry>> = BTreeMap::new();

    for item in merge_variants(items) {
        if !slot.is_special() && !item.valid_tiers.contains(&selected_tier) {
            continue;
        }
        let Variant { id, tier, enchant } =
            item_id::select_variant(&item, selected_tier, selected_enchant);
        let group = item
            .sub_category
            .clone()
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| OTHER_GROUP.to_string());

        groups.entry(group).or_default().push(PickerEntry {
            item,
            variant_id: id,
            tier,
            enchant,
        });
    }

    groups
        .into_iter()
        .map(|(name, items)| PickerGroup { name, items })
        .collect()
}
