//! ============================================================================
//! Composition Editing - Slot lifecycle and save preparation
//! ============================================================================
//! Everything a client does to a composition between load and save: add,
//! remove, duplicate and reorder slots, change roles and items. The record
//! is always persisted whole, so these only mutate the in-memory value.
//! ============================================================================

use std::collections::HashSet;

use tracing::debug;

use crate::types::{Build, Composition, ItemCategory, Player};

impl Composition {
    /// Fresh slot id: the current time in milliseconds, bumped past every id
    /// in use or issued since load so a deleted id never comes back.
    pub fn next_player_id(&mut self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let highest = self
            .slots
            .iter()
            .map(|p| p.id)
            .chain(std::iter::once(self.last_player_id))
            .max()
            .unwrap_or(0);
        let id = now.max(highest.saturating_add(1));
        self.last_player_id = id;
        id
    }

    /// Append an empty slot, returning its id
    pub fn add_player(&mut self) -> i64 {
        let id = self.next_player_id();
        self.slots.push(Player::new(id));
        debug!("Added slot {}", id);
        id
    }

    /// Remove a slot by id, keeping the order of the rest
    pub fn remove_player(&mut self, player_id: i64) -> bool {
        let before = self.slots.len();
        self.slots.retain(|p| p.id != player_id);
        before != self.slots.len()
    }

    /// Copy the slot at `index` into a new slot right after it
    pub fn duplicate_player(&mut self, index: usize) -> Option<i64> {
        let mut clone = self.slots.get(index)?.clone();
        clone.id = self.next_player_id();
        let id = clone.id;
        self.slots.insert(index + 1, clone);
        Some(id)
    }

    /// Move a slot from one position to another (drag and drop)
    pub fn move_player(&mut self, from: usize, to: usize) -> bool {
        if from >= self.slots.len() || to >= self.slots.len() {
            return false;
        }
        if from != to {
            let player = self.slots.remove(from);
            self.slots.insert(to, player);
        }
        true
    }

    pub fn player_mut(&mut self, player_id: i64) -> Option<&mut Player> {
        self.slots.iter_mut().find(|p| p.id == player_id)
    }

    /// Change a slot's role; the icon only changes when one is given
    pub fn update_role(&mut self, player_id: i64, role: &str, role_icon: Option<&str>) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            return false;
        };
        player.role = role.to_string();
        if let Some(icon) = role_icon.filter(|icon| !icon.is_empty()) {
            player.role_icon = icon.to_string();
        }
        true
    }

    /// Put an item into one slot of a player's main or swap build
    pub fn set_player_item(
        &mut self,
        player_id: i64,
        swap: bool,
        slot: ItemCategory,
        item_id: &str,
    ) -> bool {
        let Some(player) = self.player_mut(player_id) else {
            return false;
        };
        if swap {
            player
                .swap_build
                .get_or_insert_with(Build::default)
                .set(slot, item_id);
        } else {
            player.build.set(slot, item_id);
            if slot == ItemCategory::MainHand {
                player.weapon_id = item_id.to_string();
            }
        }
        true
    }

    /// Flip the UI-only swap display flag
    pub fn toggle_swap(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(player) => {
                player.is_swap_active = !player.is_swap_active;
                true
            }
            None => false,
        }
    }

    /// Enforce the build invariants before the record is written: no off hand
    /// next to a two-hander, and `weapon_id` mirrors the main hand.
    pub fn prepare_for_save(&mut self) {
        for player in &mut self.slots {
            if player.build.enforce_two_handed() {
                debug!("Cleared off hand under two-hander in slot {}", player.id);
            }
            if let Some(swap) = player.swap_build.as_mut() {
                swap.enforce_two_handed();
            }
            if player.weapon_id != player.build.main_hand {
                player.weapon_id = player.build.main_hand.clone();
            }
        }
    }

    /// Names of the required header fields that are blank
    pub fn validate(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title".to_string());
        }
        if self.rally_point.trim().is_empty() {
            missing.push("rallyPoint".to_string());
        }
        if self.event_time.trim().is_empty() {
            missing.push("eventTime".to_string());
        }
        missing
    }

    /// Slot ids used by more than one slot, each reported once
    pub fn duplicate_slot_ids(&self) -> Vec<i64> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for player in &self.slots {
            if !seen.insert(player.id) && !dupes.contains(&player.id) {
                dupes.push(player.id);
            }
        }
        dupes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp_with_slots(n: usize) -> Composition {
        let mut comp = Composition::default();
        for _ in 0..n {
            comp.add_player();
        }
        comp
    }

    #[test]
    fn test_add_player_ids_unique_and_increasing() {
        let comp = comp_with_slots(5);
        let ids: Vec<i64> = comp.slots.iter().map(|p| p.id).collect();
        for pair in ids.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!(comp.slots.iter().all(|p| p.build.is_empty()));
    }

    #[test]
    fn test_deleted_id_not_reused() {
        let mut comp = comp_with_slots(3);
        let last = comp.slots[2].id;
        assert!(comp.remove_player(last));
        let next = comp.add_player();
        assert!(next > last);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut comp = comp_with_slots(4);
        let ids: Vec<i64> = comp.slots.iter().map(|p| p.id).collect();
        assert!(comp.remove_player(ids[1]));
        let rest: Vec<i64> = comp.slots.iter().map(|p| p.id).collect();
        assert_eq!(rest, vec![ids[0], ids[2], ids[3]]);
        assert!(!comp.remove_player(ids[1]));
    }

    #[test]
    fn test_duplicate_inserts_after() {
        let mut comp = comp_with_slots(2);
        let first = comp.slots[0].id;
        comp.update_role(first, "Tank", Some("🛡️"));
        let new_id = comp.duplicate_player(0).unwrap();

        assert_eq!(comp.slots.len(), 3);
        assert_eq!(comp.slots[1].id, new_id);
        assert_eq!(comp.slots[1].role, "Tank");
        assert_ne!(new_id, first);
        assert!(comp.duplicate_player(10).is_none());
    }

    #[test]
    fn test_move_player() {
        let mut comp = comp_with_slots(3);
        let ids: Vec<i64> = comp.slots.iter().map(|p| p.id).collect();
        assert!(comp.move_player(0, 2));
        let moved: Vec<i64> = comp.slots.iter().map(|p| p.id).collect();
        assert_eq!(moved, vec![ids[1], ids[2], ids[0]]);
        assert!(!comp.move_player(0, 3));
    }

    #[test]
    fn test_update_role_keeps_icon_when_absent() {
        let mut comp = comp_with_slots(1);
        let id = comp.slots[0].id;
        comp.update_role(id, "Healer", Some("💊"));
        comp.update_role(id, "Main Healer", None);
        assert_eq!(comp.slots[0].role, "Main Healer");
        assert_eq!(comp.slots[0].role_icon, "💊");
        assert!(!comp.update_role(-1, "Ghost", None));
    }

    #[test]
    fn test_set_item_syncs_weapon_id() {
        let mut comp = comp_with_slots(1);
        let id = comp.slots[0].id;
        comp.set_player_item(id, false, ItemCategory::OffHand, "T8_OFF_SHIELD");
        comp.set_player_item(id, false, ItemCategory::MainHand, "T8_2H_CLAYMORE");

        let player = &comp.slots[0];
        assert_eq!(player.weapon_id, "T8_2H_CLAYMORE");
        assert_eq!(player.build.off_hand, "");
    }

    #[test]
    fn test_set_swap_item_creates_swap_build() {
        let mut comp = comp_with_slots(1);
        let id = comp.slots[0].id;
        assert!(comp.slots[0].swap_build.is_none());

        comp.set_player_item(id, true, ItemCategory::MainHand, "T6_MAIN_SPEAR@1");
        let player = &comp.slots[0];
        assert_eq!(player.swap_build.as_ref().unwrap().main_hand, "T6_MAIN_SPEAR@1");
        // Swap writes don't touch the quick-display weapon
        assert_eq!(player.weapon_id, "");
    }

    #[test]
    fn test_prepare_for_save_forces_two_handed_rule() {
        let mut comp = comp_with_slots(1);
        let player = &mut comp.slots[0];
        player.build.main_hand = "T8_2H_CLAYMORE".into();
        player.build.off_hand = "T8_OFF_TORCH".into();
        player.swap_build = Some(Build {
            main_hand: "T7_2H_HALBERD".into(),
            off_hand: "T7_OFF_SHIELD".into(),
            ..Build::default()
        });

        comp.prepare_for_save();
        let player = &comp.slots[0];
        assert_eq!(player.build.off_hand, "");
        assert_eq!(player.swap_build.as_ref().unwrap().off_hand, "");
        assert_eq!(player.weapon_id, "T8_2H_CLAYMORE");
    }

    #[test]
    fn test_toggle_swap() {
        let mut comp = comp_with_slots(1);
        assert!(comp.toggle_swap(0));
        assert!(comp.slots[0].is_swap_active);
        assert!(comp.toggle_swap(0));
        assert!(!comp.slots[0].is_swap_active);
        assert!(!comp.toggle_swap(4));
    }

    #[test]
    fn test_validate_required_fields() {
        let mut comp = Composition::default();
        assert_eq!(comp.validate(), vec!["title", "rallyPoint", "eventTime"]);
        comp.title = "ZvZ".into();
        comp.rally_point = "  ".into();
        comp.event_time = "20:00".into();
        assert_eq!(comp.validate(), vec!["rallyPoint"]);
    }

    #[test]
    fn test_duplicate_slot_ids() {
        let mut comp = comp_with_slots(2);
        assert!(comp.duplicate_slot_ids().is_empty());

        comp.slots = vec![Player::new(7), Player::new(7), Player::new(9), Player::new(7)];
        assert_eq!(comp.duplicate_slot_ids(), vec![7]);
    }
}
