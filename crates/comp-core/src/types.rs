//! ============================================================================
//! Core Types for Comp Builder
//! ============================================================================
//! Items, builds, player slots and compositions. These types are serialized
//! to JSON (camelCase) both on the wire and in the embedded database.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Default glyph for a slot without a chosen role icon
pub const DEFAULT_ROLE_ICON: &str = "👤";

/// Tier used for catalog storage when an id carries no tier token
pub const DEFAULT_TIER: u32 = 8;

// ============================================================================
// Item Catalog Types
// ============================================================================

/// Equipment slot / catalog category. Declaration order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemCategory {
    MainHand,
    OffHand,
    Head,
    Armor,
    Shoes,
    Cape,
    Mount,
    Food,
    Potion,
}

impl ItemCategory {
    pub const ALL: [ItemCategory; 9] = [
        ItemCategory::MainHand,
        ItemCategory::OffHand,
        ItemCategory::Head,
        ItemCategory::Armor,
        ItemCategory::Shoes,
        ItemCategory::Cape,
        ItemCategory::Mount,
        ItemCategory::Food,
        ItemCategory::Potion,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mainHand" => Some(Self::MainHand),
            "offHand" => Some(Self::OffHand),
            "head" => Some(Self::Head),
            "armor" => Some(Self::Armor),
            "shoes" => Some(Self::Shoes),
            "cape" => Some(Self::Cape),
            "mount" => Some(Self::Mount),
            "food" => Some(Self::Food),
            "potion" => Some(Self::Potion),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainHand => "mainHand",
            Self::OffHand => "offHand",
            Self::Head => "head",
            Self::Armor => "armor",
            Self::Shoes => "shoes",
            Self::Cape => "cape",
            Self::Mount => "mount",
            Self::Food => "food",
            Self::Potion => "potion",
        }
    }

    /// Human-readable slot label
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MainHand => "Main Hand",
            Self::OffHand => "Off Hand",
            Self::Head => "Head",
            Self::Armor => "Armor",
            Self::Shoes => "Shoes",
            Self::Cape => "Cape",
            Self::Mount => "Mount",
            Self::Food => "Food",
            Self::Potion => "Potion",
        }
    }

    /// Weapons and worn gear. These only exist from tier 4 upward.
    pub fn is_equipment(&self) -> bool {
        !self.is_special()
    }

    /// Mounts and consumables: the picker always uses their highest tier
    pub fn is_special(&self) -> bool {
        matches!(self, Self::Mount | Self::Food | Self::Potion)
    }

    /// Highest legal enchantment level for items in this category
    pub fn max_enchantment(&self) -> u32 {
        match self {
            Self::Mount => 0,
            Self::Food | Self::Potion => 3,
            _ => 4,
        }
    }

    /// Tiers an item of this category exists at when the catalog says nothing
    pub fn default_tiers(&self) -> Vec<u32> {
        if self.is_equipment() {
            (4..=8).collect()
        } else {
            (2..=8).collect()
        }
    }
}

/// A read-only catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Canonical identifier, e.g. "T8_MAIN_SWORD"
    pub id: String,
    /// Display name, e.g. "Broadsword"
    pub name: String,
    pub category: ItemCategory,
    #[serde(default)]
    pub sub_category: Option<String>,
    #[serde(default = "default_tier")]
    pub tier: u32,
    #[serde(default)]
    pub valid_tiers: Vec<u32>,
    #[serde(default)]
    pub min_enchantment: u32,
    #[serde(default)]
    pub max_enchantment: u32,
}

fn default_tier() -> u32 {
    DEFAULT_TIER
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ItemCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            sub_category: None,
            tier: DEFAULT_TIER,
            valid_tiers: Vec::new(),
            min_enchantment: 0,
            max_enchantment: category.max_enchantment(),
        }
    }

    pub fn with_valid_tiers(mut self, tiers: impl IntoIterator<Item = u32>) -> Self {
        self.valid_tiers = tiers.into_iter().collect();
        self
    }

    pub fn with_sub_category(mut self, sub_category: impl Into<String>) -> Self {
        self.sub_category = Some(sub_category.into());
        self
    }

    /// Apply the category rules for tiers and enchantment bounds.
    ///
    /// Equipment is always {4..8}; anything else with no recorded tiers gets
    /// {2..8}. The enchantment ceiling comes from the category and the floor
    /// is clamped under it.
    pub fn normalized(mut self) -> Self {
        if self.category.is_equipment() || self.valid_tiers.is_empty() {
            self.valid_tiers = self.category.default_tiers();
        } else {
            self.valid_tiers.sort_unstable();
            self.valid_tiers.dedup();
        }
        self.max_enchantment = self.category.max_enchantment();
        self.min_enchantment = self.min_enchantment.min(self.max_enchantment);
        self
    }

    /// Highest tier this item exists at
    pub fn max_tier(&self) -> u32 {
        self.valid_tiers.iter().copied().max().unwrap_or(self.tier)
    }
}

// ============================================================================
// Composition Types
// ============================================================================

/// Nine-slot equipment loadout. Each field is "" or an item identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Build {
    pub main_hand: String,
    pub off_hand: String,
    pub head: String,
    pub armor: String,
    pub shoes: String,
    pub cape: String,
    pub mount: String,
    pub food: String,
    pub potion: String,
}

impl Build {
    pub fn get(&self, slot: ItemCategory) -> &str {
        match slot {
            ItemCategory::MainHand => &self.main_hand,
            ItemCategory::OffHand => &self.off_hand,
            ItemCategory::Head => &self.head,
            ItemCategory::Armor => &self.armor,
            ItemCategory::Shoes => &self.shoes,
            ItemCategory::Cape => &self.cape,
            ItemCategory::Mount => &self.mount,
            ItemCategory::Food => &self.food,
            ItemCategory::Potion => &self.potion,
        }
    }

    fn slot_mut(&mut self, slot: ItemCategory) -> &mut String {
        match slot {
            ItemCategory::MainHand => &mut self.main_hand,
            ItemCategory::OffHand => &mut self.off_hand,
            ItemCategory::Head => &mut self.head,
            ItemCategory::Armor => &mut self.armor,
            ItemCategory::Shoes => &mut self.shoes,
            ItemCategory::Cape => &mut self.cape,
            ItemCategory::Mount => &mut self.mount,
            ItemCategory::Food => &mut self.food,
            ItemCategory::Potion => &mut self.potion,
        }
    }

    /// Set one slot. A two-handed main hand clears the off hand, and an off
    /// hand cannot be placed next to one.
    pub fn set(&mut self, slot: ItemCategory, item_id: impl Into<String>) {
        *self.slot_mut(slot) = item_id.into();
        self.enforce_two_handed();
    }

    /// Clear `offHand` when `mainHand` is two-handed. Returns true if it changed.
    pub fn enforce_two_handed(&mut self) -> bool {
        if crate::item_id::is_two_handed(&self.main_hand) && !self.off_hand.is_empty() {
            self.off_hand.clear();
            return true;
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        ItemCategory::ALL.iter().all(|slot| self.get(*slot).is_empty())
    }
}

/// One player slot in a composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Time-based unique id, the reorder/delete key. Never reused.
    pub id: i64,
    #[serde(default)]
    pub role: String,
    #[serde(default = "default_role_icon")]
    pub role_icon: String,
    /// Copy of `build.main_hand` for quick display
    #[serde(default)]
    pub weapon_id: String,
    #[serde(default)]
    pub build: Build,
    #[serde(default)]
    pub swap_build: Option<Build>,
    /// UI-only: whether the swap loadout is expanded
    #[serde(default)]
    pub is_swap_active: bool,
}

fn default_role_icon() -> String {
    DEFAULT_ROLE_ICON.to_string()
}

impl Player {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            role: String::new(),
            role_icon: default_role_icon(),
            weapon_id: String::new(),
            build: Build::default(),
            swap_build: None,
            is_swap_active: false,
        }
    }
}

/// The shareable top-level record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Composition {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rally_point: String,
    /// Stored as `swap` by older schema revisions
    #[serde(default, alias = "swap")]
    pub event_time: String,
    /// Admin/edit credential (plaintext). Absent or empty means no edit lock.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub viewer_password: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub slots: Vec<Player>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    /// Highest slot id handed out since load. Not persisted: once saved, the
    /// clock has moved past every id it issued.
    #[serde(skip)]
    pub last_player_id: i64,
}

fn default_true() -> bool {
    true
}

impl Default for Composition {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            rally_point: String::new(),
            event_time: String::new(),
            password: None,
            viewer_password: String::new(),
            is_public: true,
            slots: Vec::new(),
            created_at: 0,
            updated_at: 0,
            last_player_id: 0,
        }
    }
}

/// Composition as handed to clients: the admin password never leaves the
/// service, only whether one is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub rally_point: String,
    pub event_time: String,
    pub viewer_password: String,
    pub is_public: bool,
    pub slots: Vec<Player>,
    pub created_at: i64,
    pub updated_at: i64,
    pub has_admin_password: bool,
}

impl From<&Composition> for CompositionView {
    fn from(comp: &Composition) -> Self {
        Self {
            id: comp.id.clone(),
            title: comp.title.clone(),
            description: comp.description.clone(),
            rally_point: comp.rally_point.clone(),
            event_time: comp.event_time.clone(),
            viewer_password: comp.viewer_password.clone(),
            is_public: comp.is_public,
            slots: comp.slots.clone(),
            created_at: comp.created_at,
            updated_at: comp.updated_at,
            has_admin_password: crate::access::has_password(comp.password.as_deref()),
        }
    }
}

/// Listing row. Carries only a slot count and never the viewer password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompSummary {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub is_public: bool,
    pub is_view_locked: bool,
    pub slots: usize,
}

/// Body of a create/update request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rally_point: String,
    #[serde(default, alias = "swap")]
    pub event_time: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub viewer_password: String,
    /// Current admin password, used to authorize the write
    #[serde(default)]
    pub password: Option<String>,
    /// Replacement admin password. Present-but-empty removes the lock.
    #[serde(default)]
    pub next_password: Option<String>,
    #[serde(default)]
    pub slots: Vec<Player>,
}

// ============================================================================
// Errors
// ============================================================================

/// Error types for the composition service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CompError {
    #[error("Composition not found: {0}")]
    NotFound(String),

    #[error("Wrong password")]
    WrongPassword,

    #[error("Composition '{title}' requires a viewer password")]
    ViewLocked { title: String },

    #[error("Missing required fields: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for CompError {
    fn from(e: anyhow::Error) -> Self {
        CompError::Storage(format!("{:#}", e))
    }
}
