//! Discord sign-up template for a composition.

use std::fmt::Write;

use crate::catalog::Catalog;
use crate::types::{Composition, DEFAULT_ROLE_ICON};

/// Link text for a composition that has not been saved yet
pub const NOT_SAVED: &str = "Not Saved";

/// Weapon label for a slot with nothing in its main hand
const ANY_WEAPON: &str = "Any";

/// Render the Markdown sign-up sheet players paste into a Discord channel.
///
/// `base_url` is the public origin the composition link points at.
pub fn discord_template(comp: &Composition, catalog: &Catalog, base_url: &str) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "# ⚔️ {} ⚔️", comp.title.to_uppercase());
    text.push_str("```\n");
    if !comp.rally_point.is_empty() {
        let _ = writeln!(text, "📍 RALLY: {}", comp.rally_point);
    }
    if !comp.event_time.is_empty() {
        let _ = writeln!(text, "⏰ TIME : {} UTC", comp.event_time);
    }
    text.push_str("```\n");

    let link = if comp.id.is_empty() {
        NOT_SAVED.to_string()
    } else {
        format!("{}/composition/{}", base_url.trim_end_matches('/'), comp.id)
    };
    let _ = writeln!(text, "🔗 **LINK:** {}", link);

    if !comp.viewer_password.is_empty() {
        let _ = writeln!(
            text,
            "🔑 **PASS:** `{}` (Case Sensitive)",
            comp.viewer_password
        );
    }

    text.push_str("\n**👥 Player List:**\n");
    for (index, slot) in comp.slots.iter().enumerate() {
        let icon = if slot.role_icon.is_empty() {
            DEFAULT_ROLE_ICON
        } else {
            slot.role_icon.as_str()
        };
        let main = if slot.weapon_id.is_empty() {
            ANY_WEAPON.to_string()
        } else {
            catalog.display_name(&slot.weapon_id)
        };

        let _ = write!(
            text,
            "`{:02}` {} **{}** - Main: {}",
            index + 1,
            icon,
            slot.role.to_uppercase(),
            main
        );
        if let Some(swap_main) = slot
            .swap_build
            .as_ref()
            .map(|b| b.main_hand.as_str())
            .filter(|id| !id.is_empty())
        {
            let _ = write!(text, " | 🔄 Swap: {}", catalog.display_name(swap_main));
        }
        text.push_str(" - @ Enter Player Name\n");
    }

    text
}
