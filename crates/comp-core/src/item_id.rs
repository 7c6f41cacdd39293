//! ============================================================================
//! Item Identifier Codec
//! ============================================================================
//! Builds and takes apart identifiers of the form `T<tier>_<base>[@<enchant>]`.
//!
//! The base suffix (everything after the first `_`, before any `@`) is the
//! stable key for "which item"; the tier token and the enchant suffix name a
//! variant of it. Nothing in here fails: absence is `None` or a sentinel
//! string because these run on half-filled, never-saved slots all the time.
//! ============================================================================

use crate::types::{Item, DEFAULT_TIER};

/// Sentinel shown for an empty slot
pub const EMPTY_DISPLAY_NAME: &str = "None";

/// An identifier split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedId {
    pub tier: u32,
    pub enchant: u32,
    pub base_suffix: String,
}

/// Tier + enchant variant chosen for an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub id: String,
    pub tier: u32,
    pub enchant: u32,
}

/// Part after the first `_`, cut at the first `@`.
///
/// The first segment is dropped whether or not it is a tier token, so
/// `MAIN_SWORD` yields `SWORD` and an id without `_` yields "".
pub fn base_suffix(identifier: &str) -> &str {
    let rest = match identifier.split_once('_') {
        Some((_, rest)) => rest,
        None => "",
    };
    rest.split('@').next().unwrap_or("")
}

/// Build the identifier for `base_item` at `tier`/`enchant`.
///
/// Purely syntactic: callers clamp tier and enchant to the item's legal
/// ranges first (see [`select_variant`]). A zero enchant is never suffixed.
pub fn encode(base_item: Option<&Item>, tier: u32, enchant: u32) -> Option<String> {
    let item = base_item?;
    if item.id.is_empty() {
        return None;
    }

    let mut id = format!("T{}_{}", tier, base_suffix(&item.id));
    if enchant > 0 {
        id.push('@');
        id.push_str(&enchant.to_string());
    }
    Some(id)
}

/// Split an identifier into tier, enchant and base suffix. Total: anything
/// unparseable falls back to tier 8 and enchant 0.
pub fn decode(identifier: &str) -> DecodedId {
    DecodedId {
        tier: parse_tier(identifier).unwrap_or(DEFAULT_TIER),
        enchant: parse_enchant(identifier),
        base_suffix: base_suffix(identifier).to_string(),
    }
}

/// Leading `T<digits>_`
fn parse_tier(identifier: &str) -> Option<u32> {
    let rest = identifier.strip_prefix('T')?;
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 || rest.as_bytes().get(digits_len) != Some(&b'_') {
        return None;
    }
    rest[..digits_len].parse().ok()
}

/// Integer after the first `@`, reading leading digits only
fn parse_enchant(identifier: &str) -> u32 {
    let Some((_, tail)) = identifier.split_once('@') else {
        return 0;
    };
    let tail = tail.split('@').next().unwrap_or("").trim_start();
    let digits: String = tail.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Find the catalog item an identifier is a variant of.
///
/// Prefers an id containing `_<suffix>`, then one ending with the suffix.
/// First match wins in the caller's order. An empty suffix matches nothing.
pub fn resolve_base_item<'a>(identifier: &str, items: &'a [Item]) -> Option<&'a Item> {
    let suffix = base_suffix(identifier);
    if suffix.is_empty() {
        return None;
    }

    let needle = format!("_{}", suffix);
    items
        .iter()
        .find(|item| item.id.contains(&needle))
        .or_else(|| items.iter().find(|item| item.id.ends_with(suffix)))
}

/// Display name for an identifier, searched over a flat catalog.
///
/// "None" for an empty identifier; the identifier itself when nothing matches.
pub fn display_name<'a, I>(identifier: &str, flat_items: I) -> String
where
    I: IntoIterator<Item = &'a Item>,
{
    if identifier.is_empty() {
        return EMPTY_DISPLAY_NAME.to_string();
    }

    let suffix = base_suffix(identifier);
    if suffix.is_empty() {
        return identifier.to_string();
    }

    flat_items
        .into_iter()
        .find(|item| item.id.contains(suffix))
        .map(|item| item.name.clone())
        .unwrap_or_else(|| identifier.to_string())
}

/// Two-handed weapons carry `2H` in their identifier
pub fn is_two_handed(identifier: &str) -> bool {
    identifier.contains("2H")
}

/// Pick the tier/enchant variant of `item` for the user's current selection
/// and encode it.
///
/// Mounts and consumables always use their highest valid tier. Other items
/// use the selected tier when they exist at it, otherwise their highest.
/// Enchant is clamped into `[min_enchantment, category cap]`.
pub fn select_variant(item: &Item, selected_tier: u32, selected_enchant: u32) -> Variant {
    let tier = if item.category.is_special() || !item.valid_tiers.contains(&selected_tier) {
        item.max_tier()
    } else {
        selected_tier
    };

    let cap = item.category.max_enchantment();
    let enchant = selected_enchant.max(item.min_enchantment).min(cap);

    let id = encode(Some(item), tier, enchant).unwrap_or_else(|| item.id.clone());
    Variant { id, tier, enchant }
}
