//! ============================================================================
//! Database Types - Summary records for the redb store
//! ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Database statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    pub total_compositions: usize,
    /// Compositions with an admin password set
    pub edit_locked: usize,
    /// Private compositions behind a viewer password
    pub view_locked: usize,
    pub total_slots: usize,
    pub total_items: usize,
    pub items_by_category: BTreeMap<String, usize>,
}
