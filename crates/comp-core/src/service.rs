//! ============================================================================
//! Composition Service - Create, share and guard compositions
//! ============================================================================
//! High-level API over the database and the catalog. Every operation the
//! HTTP layer exposes lives here, returning `CompError` so callers can map
//! failures to responses without looking inside storage errors.
//!
//! The admin password never leaves this module: reads hand out
//! `CompositionView`, listings hand out `CompSummary`.
//! ============================================================================

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::access::{self, EditLock, ViewerLock};
use crate::catalog::{self, Catalog, PickerGroup, RawItem};
use crate::db::CompDb;
use crate::export;
use crate::types::{
    CompError, CompSummary, Composition, CompositionView, Item, ItemCategory, SaveRequest,
};

pub type CompResult<T> = std::result::Result<T, CompError>;

/// Composition service combining the store and the catalog
pub struct CompService {
    db: CompDb,
    catalog: Catalog,
}

impl CompService {
    /// Create the service, loading the catalog from the database
    pub fn new(db: CompDb) -> CompResult<Self> {
        let catalog = Catalog::from_items(db.list_items()?);
        if catalog.is_empty() {
            warn!("Item catalog is empty; run `comp-db import-catalog` to populate it");
        } else {
            info!("Loaded catalog: {} items", catalog.len());
        }
        Ok(Self { db, catalog })
    }

    pub fn db(&self) -> &CompDb {
        &self.db
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace the stored catalog with an imported dump and reload it
    pub fn import_catalog(&mut self, raw: &[RawItem]) -> CompResult<usize> {
        let items = catalog::import_items(raw);
        let written = self.db.replace_items(&items)?;
        self.catalog = Catalog::from_items(items);
        Ok(written)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Save a new composition and return its id.
    ///
    /// The initial admin password is `nextPassword` when given, else
    /// `password`; empty means no lock.
    pub fn create(&self, req: SaveRequest) -> CompResult<String> {
        let now = chrono::Utc::now().timestamp();
        let password = req
            .next_password
            .clone()
            .or_else(|| req.password.clone())
            .filter(|p| !p.is_empty());

        let mut comp = Composition {
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            password,
            ..Composition::default()
        };
        apply_fields(&mut comp, req);
        save_checks(&mut comp)?;

        self.db.store_composition(&comp)?;
        info!("Created composition {} ({} slots)", comp.id, comp.slots.len());
        Ok(comp.id)
    }

    /// Overwrite an existing composition. The stored admin password must be
    /// presented; `nextPassword` then replaces or removes it.
    pub fn update(&self, req: SaveRequest) -> CompResult<CompositionView> {
        let id = req
            .id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CompError::BadRequest("Missing composition id".to_string()))?;
        let mut comp = self.load(&id)?;

        access::authorize_write(comp.password.as_deref(), req.password.as_deref())?;

        let next_password = req.next_password.clone();
        apply_fields(&mut comp, req);
        access::apply_password_change(&mut comp.password, next_password);
        comp.updated_at = chrono::Utc::now().timestamp();
        save_checks(&mut comp)?;

        self.db.store_composition(&comp)?;
        info!("Updated composition {}", comp.id);
        Ok(CompositionView::from(&comp))
    }

    /// Delete after checking the admin password
    pub fn delete(&self, id: &str, password: Option<&str>) -> CompResult<()> {
        let comp = self.load(id)?;
        access::authorize_write(comp.password.as_deref(), password)?;

        if !self.db.delete_composition(id)? {
            return Err(CompError::NotFound(id.to_string()));
        }
        info!("Deleted composition {}", id);
        Ok(())
    }

    // ========================================================================
    // Password checks
    // ========================================================================

    /// Would `password` open the edit lock? True when there is no lock.
    pub fn verify_edit(&self, id: &str, password: &str) -> CompResult<bool> {
        let comp = self.load(id)?;
        let mut lock = EditLock::new(comp.password.as_deref());
        Ok(lock.unlock(comp.password.as_deref(), password))
    }

    /// Would `password` open the viewer lock? True for public compositions.
    pub fn verify_viewer(&self, id: &str, password: &str) -> CompResult<bool> {
        let comp = self.load(id)?;
        let mut lock = ViewerLock::new(&comp.viewer_password, comp.is_public);
        Ok(lock.unlock(&comp.viewer_password, password))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fetch a composition for display. A private composition with a viewer
    /// password needs that password.
    pub fn get(&self, id: &str, viewer_password: Option<&str>) -> CompResult<CompositionView> {
        let comp = self.load(id)?;
        self.check_viewer(&comp, viewer_password)?;
        Ok(CompositionView::from(&comp))
    }

    /// Summaries, newest first
    pub fn list(&self) -> CompResult<Vec<CompSummary>> {
        let comps = self.db.list_compositions()?;
        Ok(comps
            .iter()
            .map(|c| CompSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at,
                is_public: c.is_public,
                is_view_locked: access::is_view_locked(&c.viewer_password, c.is_public),
                slots: c.slots.len(),
            })
            .collect())
    }

    /// Catalog listing filtered by category and name
    pub fn items(&self, category: Option<ItemCategory>, search: Option<&str>) -> Vec<Item> {
        self.catalog
            .search(category, search)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Grouped picker entries for one build slot
    pub fn picker(
        &self,
        category: ItemCategory,
        tier: u32,
        enchant: u32,
        search: Option<&str>,
    ) -> Vec<PickerGroup> {
        let items = self.catalog.search(Some(category), search);
        catalog::picker::build_picker(category, items, tier, enchant)
    }

    /// Discord sign-up template; subject to the viewer lock like `get`
    pub fn discord_template(
        &self,
        id: &str,
        viewer_password: Option<&str>,
        base_url: &str,
    ) -> CompResult<String> {
        let comp = self.load(id)?;
        self.check_viewer(&comp, viewer_password)?;
        Ok(export::discord_template(&comp, &self.catalog, base_url))
    }

    fn load(&self, id: &str) -> CompResult<Composition> {
        self.db
            .get_composition(id)?
            .ok_or_else(|| CompError::NotFound(id.to_string()))
    }

    fn check_viewer(&self, comp: &Composition, supplied: Option<&str>) -> CompResult<()> {
        let mut lock = ViewerLock::new(&comp.viewer_password, comp.is_public);
        let open = match supplied {
            Some(pw) => lock.unlock(&comp.viewer_password, pw),
            None => lock.has_access,
        };
        if open {
            Ok(())
        } else {
            debug!("Composition {} is view-locked", comp.id);
            Err(CompError::ViewLocked {
                title: comp.title.clone(),
            })
        }
    }
}

/// Copy the editable fields of a request onto a record
fn apply_fields(comp: &mut Composition, req: SaveRequest) {
    comp.title = req.title;
    comp.description = req.description;
    comp.rally_point = req.rally_point;
    comp.event_time = req.event_time;
    comp.is_public = req.is_public;
    // A public composition has no use for a viewer password
    comp.viewer_password = if req.is_public {
        String::new()
    } else {
        req.viewer_password
    };
    comp.slots = req.slots;
}

fn save_checks(comp: &mut Composition) -> CompResult<()> {
    let missing = comp.validate();
    if !missing.is_empty() {
        debug!("Rejected save, missing: {:?}", missing);
        return Err(CompError::Validation(missing));
    }
    if let Some(id) = comp.duplicate_slot_ids().first() {
        debug!("Rejected save, duplicate slot id {}", id);
        return Err(CompError::BadRequest(format!("Duplicate slot id {}", id)));
    }
    comp.prepare_for_save();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Build, Player};
    use std::path::PathBuf;

    fn temp_service() -> (CompService, PathBuf) {
        let path =
            std::env::temp_dir().join(format!("comp-service-test-{}.redb", Uuid::new_v4()));
        let db = CompDb::open(path.to_str()).unwrap();
        db.replace_items(&[
            Item::new("T8_2H_CLAYMORE", "Claymore", ItemCategory::MainHand)
                .with_sub_category("sword"),
            Item::new("T8_MAIN_SWORD", "Broadsword", ItemCategory::MainHand)
                .with_sub_category("sword"),
        ])
        .unwrap();
        (CompService::new(db).unwrap(), path)
    }

    fn cleanup(service: CompService, path: PathBuf) {
        drop(service);
        let _ = std::fs::remove_file(path);
    }

    fn request() -> SaveRequest {
        let mut tank = Player::new(1);
        tank.role = "Tank".into();
        tank.build = Build {
            main_hand: "T8_2H_CLAYMORE".into(),
            off_hand: "T8_OFF_SHIELD".into(),
            ..Build::default()
        };
        SaveRequest {
            title: "ZvZ Friday".into(),
            rally_point: "Bridgewatch".into(),
            event_time: "20:00".into(),
            is_public: true,
            slots: vec![tank],
            ..SaveRequest::default()
        }
    }

    #[test]
    fn test_create_then_get() {
        let (service, path) = temp_service();
        let id = service.create(request()).unwrap();
        let view = service.get(&id, None).unwrap();

        assert_eq!(view.title, "ZvZ Friday");
        assert!(!view.has_admin_password);
        // Saving enforces the two-handed rule and syncs the weapon
        assert_eq!(view.slots[0].build.off_hand, "");
        assert_eq!(view.slots[0].weapon_id, "T8_2H_CLAYMORE");
        assert!(view.created_at > 0);
        cleanup(service, path);
    }

    #[test]
    fn test_create_validation() {
        let (service, path) = temp_service();
        let req = SaveRequest {
            title: "  ".into(),
            ..request()
        };
        let err = service.create(req).unwrap_err();
        assert_eq!(err, CompError::Validation(vec!["title".to_string()]));
        assert!(service.list().unwrap().is_empty());
        cleanup(service, path);
    }

    #[test]
    fn test_create_password_preference() {
        let (service, path) = temp_service();
        let req = SaveRequest {
            password: Some("old".into()),
            next_password: Some("new".into()),
            ..request()
        };
        let id = service.create(req).unwrap();
        assert!(service.verify_edit(&id, "new").unwrap());
        assert!(!service.verify_edit(&id, "old").unwrap());

        let req = SaveRequest {
            password: Some(String::new()),
            ..request()
        };
        let open = service.create(req).unwrap();
        assert!(service.verify_edit(&open, "anything").unwrap());
        assert!(!service.get(&open, None).unwrap().has_admin_password);
        cleanup(service, path);
    }

    #[test]
    fn test_save_rejects_duplicate_slot_ids() {
        let (service, path) = temp_service();
        let mut healer = Player::new(7);
        healer.role = "Healer".into();
        let mut tank = Player::new(7);
        tank.role = "Tank".into();
        let req = SaveRequest {
            slots: vec![tank, healer],
            ..request()
        };

        let err = service.create(req.clone()).unwrap_err();
        assert_eq!(err, CompError::BadRequest("Duplicate slot id 7".to_string()));
        assert!(service.list().unwrap().is_empty());

        let id = service.create(request()).unwrap();
        let err = service
            .update(SaveRequest {
                id: Some(id.clone()),
                ..req
            })
            .unwrap_err();
        assert!(matches!(err, CompError::BadRequest(_)));
        assert_eq!(service.get(&id, None).unwrap().slots.len(), 1);
        cleanup(service, path);
    }

    #[test]
    fn test_public_drops_viewer_password() {
        let (service, path) = temp_service();
        let req = SaveRequest {
            viewer_password: "view".into(),
            ..request()
        };
        let id = service.create(req).unwrap();
        assert_eq!(service.get(&id, None).unwrap().viewer_password, "");
        cleanup(service, path);
    }

    #[test]
    fn test_update_requires_admin_password() {
        let (service, path) = temp_service();
        let id = service
            .create(SaveRequest {
                next_password: Some("A".into()),
                ..request()
            })
            .unwrap();

        let edit = |password: Option<&str>| SaveRequest {
            id: Some(id.clone()),
            title: "Renamed".into(),
            password: password.map(str::to_string),
            ..request()
        };

        assert_eq!(service.update(edit(None)).unwrap_err(), CompError::WrongPassword);
        assert_eq!(service.update(edit(Some("a"))).unwrap_err(), CompError::WrongPassword);
        assert_eq!(service.get(&id, None).unwrap().title, "ZvZ Friday");

        let view = service.update(edit(Some("A"))).unwrap();
        assert_eq!(view.title, "Renamed");
        assert!(view.has_admin_password);
        cleanup(service, path);
    }

    #[test]
    fn test_update_password_change() {
        let (service, path) = temp_service();
        let id = service
            .create(SaveRequest {
                next_password: Some("A".into()),
                ..request()
            })
            .unwrap();

        service
            .update(SaveRequest {
                id: Some(id.clone()),
                password: Some("A".into()),
                next_password: Some("B".into()),
                ..request()
            })
            .unwrap();
        assert!(!service.verify_edit(&id, "A").unwrap());
        assert!(service.verify_edit(&id, "B").unwrap());

        // Present-but-empty removes the lock
        let view = service
            .update(SaveRequest {
                id: Some(id.clone()),
                password: Some("B".into()),
                next_password: Some(String::new()),
                ..request()
            })
            .unwrap();
        assert!(!view.has_admin_password);
        service
            .update(SaveRequest {
                id: Some(id.clone()),
                ..request()
            })
            .unwrap();
        cleanup(service, path);
    }

    #[test]
    fn test_update_missing_id_or_record() {
        let (service, path) = temp_service();
        assert!(matches!(
            service.update(request()).unwrap_err(),
            CompError::BadRequest(_)
        ));
        let req = SaveRequest {
            id: Some("nope".into()),
            ..request()
        };
        assert_eq!(
            service.update(req).unwrap_err(),
            CompError::NotFound("nope".into())
        );
        cleanup(service, path);
    }

    #[test]
    fn test_viewer_lock() {
        let (service, path) = temp_service();
        let id = service
            .create(SaveRequest {
                is_public: false,
                viewer_password: "Xy".into(),
                ..request()
            })
            .unwrap();

        assert_eq!(
            service.get(&id, None).unwrap_err(),
            CompError::ViewLocked { title: "ZvZ Friday".into() }
        );
        assert!(service.get(&id, Some("xy")).is_err());
        assert!(service.get(&id, Some("Xy")).is_ok());
        assert!(!service.verify_viewer(&id, "xy").unwrap());
        assert!(service.verify_viewer(&id, "Xy").unwrap());

        let summary = &service.list().unwrap()[0];
        assert!(summary.is_view_locked);
        assert!(!summary.is_public);
        cleanup(service, path);
    }

    #[test]
    fn test_delete() {
        let (service, path) = temp_service();
        let id = service
            .create(SaveRequest {
                next_password: Some("pw".into()),
                ..request()
            })
            .unwrap();

        assert_eq!(service.delete(&id, Some("bad")).unwrap_err(), CompError::WrongPassword);
        service.delete(&id, Some("pw")).unwrap();
        assert_eq!(service.get(&id, None).unwrap_err(), CompError::NotFound(id.clone()));
        assert_eq!(service.delete(&id, Some("pw")).unwrap_err(), CompError::NotFound(id));
        cleanup(service, path);
    }

    #[test]
    fn test_items_picker_and_template() {
        let (service, path) = temp_service();
        assert_eq!(service.items(Some(ItemCategory::MainHand), Some("clay")).len(), 1);

        let groups = service.picker(ItemCategory::MainHand, 6, 2, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].items.len(), 2);
        assert!(groups[0]
            .items
            .iter()
            .any(|e| e.variant_id == "T6_2H_CLAYMORE@2"));

        let id = service.create(request()).unwrap();
        let text = service
            .discord_template(&id, None, "http://localhost:3000")
            .unwrap();
        assert!(text.contains(&format!("/composition/{}", id)));
        assert!(text.contains("**TANK** - Main: Claymore"));
        cleanup(service, path);
    }

    #[test]
    fn test_import_catalog_replaces_items() {
        let (mut service, path) = temp_service();
        let raw: Vec<RawItem> = catalog::import::parse_dump(
            r#"[{"UniqueName":"T6_MEAL_STEW","LocalizedNames":{"EN-US":"Beef Stew"}}]"#,
        )
        .unwrap();
        assert_eq!(service.import_catalog(&raw).unwrap(), 1);
        assert!(service.items(Some(ItemCategory::MainHand), None).is_empty());
        assert_eq!(service.db().list_items().unwrap().len(), 1);
        cleanup(service, path);
    }
}
