//! ============================================================================
//! Catalog Import - Game data dump to catalog records
//! ============================================================================
//! Reads the community-maintained `formatted/items.json` dump, keeps the
//! items a composition sheet can use, and collapses every tier of an item
//! into one record:
//!
//! 1. Categorize by identifier pattern (unknown patterns are skipped)
//! 2. Drop blacklisted identifiers (bags, tools, skins, tokens, ...)
//! 3. Strip tier titles ("Elder's", ...) and potion sizes from the name
//! 4. Group by cleaned name, collecting tiers, keeping the highest-tier id
//! ============================================================================

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::types::{Item, ItemCategory, DEFAULT_TIER};

/// Public item dump
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/ao-data/ao-bin-dumps/master/formatted/items.json";

const TIER_TITLES: &[&str] = &[
    "Elder's",
    "Grandmaster's",
    "Master's",
    "Expert's",
    "Adept's",
    "Journeyman's",
    "Novice's",
    "Beginner's",
];

const POTION_SIZES: &[&str] = &[
    "Major", "Minor", "Gigantic", "Powerful", "Small", "Medium", "Large",
];

/// Mount families kept at any tier
const MOUNT_FAMILIES: &[&str] = &[
    "BATTLE",
    "MAMMOTH",
    "EAGLE",
    "BEETLE",
    "BASILISK",
    "BALLISTA",
    "JUGGERNAUT",
    "TOWER_CHARIOT",
    "ENT",
    "GOLIATH",
    "RINO",
    "BASTION",
];

/// Mount families kept from tier 5 up
const HIGH_TIER_MOUNT_FAMILIES: &[&str] = &[
    "NIGHTMARE",
    "RAGECLAW",
    "HUSKY",
    "TERRORBIRD",
    "FROSTRAM",
    "SWIFTCLAW",
    "DIREWOLF",
    "BEAR",
    "BOAR",
];

const BLACKLIST: &[&str] = &[
    "_BAG",
    "_SATCHEL",
    "_TOOL_",
    "DEMOLITIONHAMMER",
    "SKIN",
    "COSTUME",
    "VANITY",
    "UNLOCK",
    "_CAPE_",
    "XMAS",
    "LEGENDARY",
    "FOUNDER",
    "STARTERPACK",
    "BATRIDER",
    "ARTIFACT",
    "ARTEFACT",
    "TOKEN",
    "QUEST",
    "TRASH",
    "FARM",
    "RECIPE",
    "GATHERER",
    "FISH",
    "ROYALE",
    "NONTRADABLE",
    "@",
    "BP",
    "PVP",
];

/// One entry of the dump. Everything else in the record is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    #[serde(rename = "UniqueName", default)]
    pub unique_name: Option<String>,
    #[serde(rename = "LocalizedNames", default)]
    pub localized_names: Option<HashMap<String, String>>,
}

/// Download the dump
pub fn fetch_dump(url: &str) -> Result<Vec<RawItem>> {
    info!("Fetching item dump from {}", url);
    let response = reqwest::blocking::get(url)
        .map_err(|e| anyhow!("Failed to fetch item dump: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(anyhow!("Item dump request failed {}: {}", status, body));
    }

    response
        .json()
        .map_err(|e| anyhow!("Failed to parse item dump: {}", e))
}

/// Read the dump from a local file
pub fn load_dump_file(path: impl AsRef<Path>) -> Result<Vec<RawItem>> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read {}: {}", path.display(), e))?;
    parse_dump(&data)
}

pub fn parse_dump(json: &str) -> Result<Vec<RawItem>> {
    serde_json::from_str(json).map_err(|e| anyhow!("Failed to parse item dump: {}", e))
}

/// Slot an identifier belongs in, or None for anything a build can't hold
pub fn categorize(id: &str) -> Option<ItemCategory> {
    let has = |needle: &str| id.contains(needle);

    if has("_MOUNT_") {
        let any_tier = (has("ARMORED_HORSE") && id.starts_with("T5"))
            || MOUNT_FAMILIES.iter().any(|&f| has(f));
        let high_tier = HIGH_TIER_MOUNT_FAMILIES.iter().any(|&f| has(f))
            && !id.starts_with("T3")
            && !id.starts_with("T4");
        return (any_tier || high_tier).then_some(ItemCategory::Mount);
    }

    if has("_MEAL") {
        Some(ItemCategory::Food)
    } else if has("_POTION") {
        Some(ItemCategory::Potion)
    } else if has("_HEAD_") {
        Some(ItemCategory::Head)
    } else if has("_ARMOR_") {
        Some(ItemCategory::Armor)
    } else if has("_SHOES_") {
        Some(ItemCategory::Shoes)
    } else if has("_CAPE") {
        Some(ItemCategory::Cape)
    } else if has("_MAIN_") || has("_2H_") {
        Some(ItemCategory::MainHand)
    } else if has("_OFF_") {
        Some(ItemCategory::OffHand)
    } else {
        None
    }
}

pub fn is_blacklisted(id: &str) -> bool {
    BLACKLIST.iter().any(|needle| id.contains(needle))
}

/// Remove one leading word from `words` (case-insensitive) when it is
/// followed by whitespace
fn strip_leading_word<'a>(name: &'a str, words: &[&str]) -> &'a str {
    for word in words {
        let Some(head) = name.get(..word.len()) else {
            continue;
        };
        if !head.eq_ignore_ascii_case(word) {
            continue;
        }
        let rest = &name[word.len()..];
        if rest.starts_with(char::is_whitespace) {
            return rest.trim_start();
        }
    }
    name
}

/// Display name with tier titles (and, for potions, size words) removed
pub fn clean_name(raw: &str, category: ItemCategory) -> String {
    let name = strip_leading_word(raw, TIER_TITLES);
    let name = if category == ItemCategory::Potion {
        strip_leading_word(name, POTION_SIZES)
    } else {
        name
    };
    name.to_string()
}

fn id_tier(id: &str) -> Option<u32> {
    let rest = id.strip_prefix('T')?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || rest.as_bytes().get(digits) != Some(&b'_') {
        return None;
    }
    rest[..digits].parse().ok()
}

struct Group {
    id: String,
    name: String,
    category: ItemCategory,
    tiers: BTreeSet<u32>,
}

/// Turn dump entries into normalized catalog items, one per cleaned name,
/// in first-seen order
pub fn import_items(raw: &[RawItem]) -> Vec<Item> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for entry in raw {
        let (Some(id), Some(names)) = (&entry.unique_name, &entry.localized_names) else {
            skipped += 1;
            continue;
        };
        let Some(category) = categorize(id) else {
            skipped += 1;
            continue;
        };
        if is_blacklisted(id) {
            skipped += 1;
            continue;
        }

        let raw_name = names
            .get("EN-US")
            .or_else(|| names.get("EN"))
            .map(String::as_str)
            .unwrap_or(id.as_str());
        let name = clean_name(raw_name, category);
        let tier = id_tier(id).unwrap_or(DEFAULT_TIER);

        let slot = *index.entry(name.clone()).or_insert_with(|| {
            groups.push(Group {
                id: id.clone(),
                name: name.clone(),
                category,
                tiers: BTreeSet::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.tiers.insert(tier);
        if tier > id_tier(&group.id).unwrap_or(0) {
            group.id = id.clone();
        }
    }

    debug!("Import skipped {} dump entries", skipped);

    let items: Vec<Item> = groups
        .into_iter()
        .map(|g| {
            Item::new(g.id, g.name, g.category)
                .with_valid_tiers(g.tiers)
                .normalized()
        })
        .collect();

    info!("Imported {} catalog items from {} dump entries", items.len(), raw.len());
    items
}
