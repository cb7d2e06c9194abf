//! Name-to-window directory owned by the frame thread.
//!
//! Storage is an arena (`SlotMap`) that never frees entries, with two
//! indexes over it: a frame-side name-hash map for structural operations,
//! and an append-only concurrent `DashMap` publishing `Arc<WindowShared>`
//! handles to producer threads. Because the index is append-only and the
//! handles are `Arc`, a handle obtained under the transient lock stays
//! valid for the process lifetime.

use std::sync::Arc;

use dashmap::DashMap;
use slotmap::SlotMap;
use tracing::debug;

use crate::common::collections::HashMap;
use crate::layout_engine::{self, TileError, TileItem};
use crate::model::geometry::{Rect, Vec2};
use crate::model::window::{PendingLayout, WindowId, WindowShared};
use crate::toolkit::{ApplyCond, Toolkit};
use crate::view::WindowView;

slotmap::new_key_type! { pub struct WindowKey; }

pub const SIDE_PANEL_WIDTH: f32 = 200.0;
pub const DEFAULT_CATEGORY: &str = "Default";
const DEFAULT_PREFERRED_SIZE: Vec2 = Vec2::new(320.0, 240.0);
const DEFAULT_HELP: &str = "No help specified";

pub type PreRenderFn = Box<dyn FnMut(&mut dyn Toolkit) + Send>;
pub type ConcurrentIndex = DashMap<WindowId, Arc<WindowShared>>;

pub struct WindowRecord {
    pub shared: Arc<WindowShared>,
    pub category: String,
    pub preferred_size: Vec2,
    pub help_text: String,
    pub pending_layout: Option<PendingLayout>,
    /// Named callbacks run inside the window scope before the view renders.
    pub(crate) pre_render: Vec<(String, PreRenderFn)>,
    /// `None` until content is attached; such windows show up grayed out
    /// in the side panel and are never rendered.
    pub view: Option<WindowView>,
}

impl WindowRecord {
    pub fn has_content(&self) -> bool { self.view.is_some() }
}

pub struct Category {
    pub name: String,
    /// Insertion order; a window key appears in exactly one category.
    pub members: Vec<WindowKey>,
}

/// Tri-state summary of a category's visibility checkboxes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VisAggregate {
    AllVisible,
    NoneVisible,
    Mixed,
}

impl VisAggregate {
    pub fn is_mixed(self) -> bool { self == VisAggregate::Mixed }

    pub fn is_checked(self) -> bool { self == VisAggregate::AllVisible }

    /// The value a click on the aggregate control drives all members to.
    /// Mixed always resolves to visible, never to a silent hide.
    pub fn toggled(self) -> bool {
        match self {
            VisAggregate::AllVisible => false,
            VisAggregate::NoneVisible | VisAggregate::Mixed => true,
        }
    }
}

/// Look up a published handle from any thread. Short-lived sharded lock;
/// never blocks waiting for a window to appear.
pub(crate) fn concurrent_find(
    index: &ConcurrentIndex,
    name: &str,
) -> Option<Arc<WindowShared>> {
    let shared = index.get(&WindowId::of(name)).map(|entry| Arc::clone(entry.value()))?;
    // A hit for a different name means two names share a hash, which the
    // whole id scheme cannot tolerate.
    assert!(
        shared.name() == name,
        "window id collision: '{}' and '{}' share id {:?}",
        shared.name(),
        name,
        shared.id()
    );
    Some(shared)
}

pub struct WindowRegistry {
    windows: SlotMap<WindowKey, WindowRecord>,
    /// Creation order, used for rendering and settings serialization.
    order: Vec<WindowKey>,
    by_id: HashMap<WindowId, WindowKey>,
    index: Arc<ConcurrentIndex>,
    categories: Vec<Category>,
    settings_dirty: bool,
}

impl WindowRegistry {
    pub fn new(index: Arc<ConcurrentIndex>) -> Self {
        Self {
            windows: SlotMap::with_key(),
            order: Vec::new(),
            by_id: HashMap::default(),
            index,
            categories: Vec::new(),
            settings_dirty: false,
        }
    }

    pub fn len(&self) -> usize { self.windows.len() }

    pub fn is_empty(&self) -> bool { self.windows.is_empty() }

    pub fn creation_order(&self) -> &[WindowKey] { &self.order }

    pub fn categories(&self) -> &[Category] { &self.categories }

    pub fn get(&self, key: WindowKey) -> Option<&WindowRecord> { self.windows.get(key) }

    pub fn get_mut(&mut self, key: WindowKey) -> Option<&mut WindowRecord> {
        self.windows.get_mut(key)
    }

    pub fn key_of(&self, name: &str) -> Option<WindowKey> {
        self.by_id.get(&WindowId::of(name)).copied()
    }

    /// Idempotent: the first call allocates a record with defaults in the
    /// default category; every later call returns the same key.
    pub fn find_or_create(&mut self, name: &str) -> WindowKey {
        let id = WindowId::of(name);
        if let Some(&key) = self.by_id.get(&id) {
            let existing = self.windows[key].shared.name();
            assert!(
                existing == name,
                "window id collision: '{existing}' and '{name}' share id {id:?}"
            );
            return key;
        }

        debug!(window = name, "creating window record");
        let record = WindowRecord {
            shared: Arc::new(WindowShared::new(name)),
            category: DEFAULT_CATEGORY.to_owned(),
            preferred_size: DEFAULT_PREFERRED_SIZE,
            help_text: DEFAULT_HELP.to_owned(),
            pending_layout: None,
            pre_render: Vec::new(),
            view: None,
        };
        let key = self.windows.insert(record);
        self.order.push(key);
        self.by_id.insert(id, key);
        self.category_entry(DEFAULT_CATEGORY).members.push(key);
        self.settings_dirty = true;
        key
    }

    /// Attach content to a window, publishing its handle to producer
    /// threads and seeding an initial first-use placement. Idempotent: a
    /// window that already has content keeps it.
    pub fn attach_view(&mut self, name: &str, view: WindowView, display: Vec2) -> WindowKey {
        let key = self.find_or_create(name);
        let record = &mut self.windows[key];
        if record.view.is_some() {
            return key;
        }
        record.view = Some(view);
        record.pending_layout = Some(initial_placement(
            record.shared.id(),
            record.preferred_size,
            display,
        ));
        self.index.insert(record.shared.id(), Arc::clone(&record.shared));
        debug!(window = name, "window content attached");
        key
    }

    pub fn concurrent_find(&self, name: &str) -> Option<Arc<WindowShared>> {
        concurrent_find(&self.index, name)
    }

    /// Move a window to another category (creating it if needed). No-op if
    /// unchanged; otherwise the window leaves its old member list and goes
    /// to the back of the new one.
    pub fn set_category(&mut self, name: &str, new_category: &str) {
        let key = self.find_or_create(name);
        if self.windows[key].category == new_category {
            return;
        }
        let old = std::mem::replace(&mut self.windows[key].category, new_category.to_owned());
        let old_cat = self.category_entry(&old);
        let pos = old_cat
            .members
            .iter()
            .position(|&k| k == key)
            .expect("window missing from its own category");
        old_cat.members.remove(pos);
        self.category_entry(new_category).members.push(key);
        self.settings_dirty = true;
    }

    pub fn set_visibility(&mut self, name: &str, visible: bool) {
        let key = self.find_or_create(name);
        self.windows[key].shared.set_visible(visible);
        self.settings_dirty = true;
    }

    pub fn set_preferred_size(&mut self, name: &str, size: Vec2) {
        let key = self.find_or_create(name);
        self.windows[key].preferred_size = size;
        self.settings_dirty = true;
    }

    pub fn set_help_text(&mut self, name: &str, help: &str) {
        let key = self.find_or_create(name);
        self.windows[key].help_text = help.to_owned();
        self.settings_dirty = true;
    }

    /// Replace or remove (`None`) a named pre-render callback.
    pub fn set_pre_render_callback(
        &mut self,
        name: &str,
        callback_name: &str,
        callback: Option<PreRenderFn>,
    ) {
        let key = self.find_or_create(name);
        let slots = &mut self.windows[key].pre_render;
        let existing = slots.iter().position(|(n, _)| n == callback_name);
        match (existing, callback) {
            (Some(pos), Some(cb)) => slots[pos].1 = cb,
            (Some(pos), None) => {
                slots.remove(pos);
            }
            (None, Some(cb)) => slots.push((callback_name.to_owned(), cb)),
            (None, None) => {}
        }
    }

    pub fn category_visibility(&self, category: &Category) -> VisAggregate {
        let total = category.members.len();
        let visible = category
            .members
            .iter()
            .filter(|&&k| self.windows[k].shared.is_visible())
            .count();
        if visible == 0 {
            VisAggregate::NoneVisible
        } else if visible == total {
            VisAggregate::AllVisible
        } else {
            VisAggregate::Mixed
        }
    }

    pub fn set_category_visible(&mut self, category_index: usize, visible: bool) {
        let members = self.categories[category_index].members.clone();
        for key in members {
            self.windows[key].shared.set_visible(visible);
        }
        self.settings_dirty = true;
    }

    /// True when no content window is visible; drives the Show All button.
    pub fn all_content_hidden(&self) -> bool {
        !self
            .windows
            .values()
            .any(|record| record.has_content() && record.shared.is_visible())
    }

    pub fn set_all_visible(&mut self, visible: bool) {
        for record in self.windows.values_mut() {
            if record.has_content() {
                record.shared.set_visible(visible);
            }
        }
        self.settings_dirty = true;
    }

    /// Run the tile packer over the visible content windows and stage the
    /// result as pending layouts. Returns the placed window titles in
    /// placement order so the driver can request focus for them.
    pub fn auto_tile(&mut self, viewport: Rect) -> Result<Vec<String>, TileError> {
        let items: Vec<TileItem> = self
            .order
            .iter()
            .filter_map(|&key| {
                let record = &self.windows[key];
                (record.has_content() && record.shared.is_visible()).then(|| TileItem {
                    key,
                    name: record.shared.name().to_owned(),
                    preferred_size: record.preferred_size,
                })
            })
            .collect();

        let result = layout_engine::tile(viewport, &items)?;
        debug!(windows = result.placements.len(), scale = result.scale, "auto-tile applied");

        let mut focus = Vec::with_capacity(result.placements.len());
        for placement in &result.placements {
            let record = &mut self.windows[placement.key];
            record.pending_layout = Some(PendingLayout {
                pos: placement.frame.origin,
                size: placement.frame.size,
                cond: ApplyCond::Always,
            });
            focus.push(record.shared.name().to_owned());
        }
        Ok(focus)
    }

    pub fn settings_dirty(&self) -> bool { self.settings_dirty }

    pub fn mark_settings_dirty(&mut self) { self.settings_dirty = true; }

    pub fn take_settings_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.settings_dirty, false)
    }

    /// Visibility write that bypasses the dirty bit, for settings loads.
    pub(crate) fn restore_visibility(&mut self, name: &str, visible: bool) {
        let key = self.find_or_create(name);
        self.windows[key].shared.set_visible(visible);
    }

    fn category_entry(&mut self, name: &str) -> &mut Category {
        if let Some(pos) = self.categories.iter().position(|c| c.name == name) {
            return &mut self.categories[pos];
        }
        self.categories.push(Category { name: name.to_owned(), members: Vec::new() });
        self.categories.last_mut().unwrap()
    }
}

/// First-use placement for a fresh window: preferred size, positioned with
/// an id-derived jitter in the free area right of the side panel so stacks
/// of new windows do not all open at the same point.
fn initial_placement(id: WindowId, size: Vec2, display: Vec2) -> PendingLayout {
    let fx = ((id.0 >> 8) & 0xffff) as f32 / 65535.0;
    let fy = ((id.0 >> 24) & 0xffff) as f32 / 65535.0;
    let avail_w = (display.x - SIDE_PANEL_WIDTH - size.x).max(0.0);
    let avail_h = (display.y - size.y).max(0.0);
    PendingLayout {
        pos: Vec2::new(SIDE_PANEL_WIDTH + fx * avail_w, fy * avail_h),
        size,
        cond: ApplyCond::FirstUseEver,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::view::{ImageView, WindowView};

    fn registry() -> WindowRegistry { WindowRegistry::new(Arc::new(ConcurrentIndex::default())) }

    fn attach(reg: &mut WindowRegistry, name: &str) -> WindowKey {
        reg.attach_view(name, WindowView::Image(ImageView), Vec2::new(1280.0, 720.0))
    }

    #[test]
    fn find_or_create_is_idempotent() {
        let mut reg = registry();
        let first = reg.find_or_create("Video");
        for _ in 0..10 {
            assert_eq!(reg.find_or_create("Video"), first);
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn windows_live_in_exactly_one_category() {
        let mut reg = registry();
        let key = reg.find_or_create("Depth");
        reg.find_or_create("Other");

        let member_count = |reg: &WindowRegistry| {
            reg.categories().iter().flat_map(|c| &c.members).filter(|&&k| k == key).count()
        };
        assert_eq!(member_count(&reg), 1);

        reg.set_category("Depth", "Sensors");
        assert_eq!(member_count(&reg), 1);
        let sensors = reg.categories().iter().find(|c| c.name == "Sensors").unwrap();
        assert_eq!(sensors.members, vec![key]);

        // Moving back appends at the end of Default, after "Other".
        reg.set_category("Depth", DEFAULT_CATEGORY);
        assert_eq!(member_count(&reg), 1);
        let default = reg.categories().iter().find(|c| c.name == DEFAULT_CATEGORY).unwrap();
        assert_eq!(default.members.last(), Some(&key));
    }

    #[test]
    fn set_category_to_same_value_is_a_noop() {
        let mut reg = registry();
        reg.set_category("W", DEFAULT_CATEGORY);
        let default = reg.categories().iter().find(|c| c.name == DEFAULT_CATEGORY).unwrap();
        assert_eq!(default.members.len(), 1);
    }

    #[test]
    fn concurrent_find_only_sees_content_windows() {
        let mut reg = registry();
        reg.find_or_create("PropsOnly");
        assert!(reg.concurrent_find("PropsOnly").is_none());

        attach(&mut reg, "PropsOnly");
        let shared = reg.concurrent_find("PropsOnly").unwrap();
        assert_eq!(shared.name(), "PropsOnly");
    }

    #[test]
    fn handle_survives_structural_mutation() {
        let mut reg = registry();
        attach(&mut reg, "Stable");
        let before = reg.concurrent_find("Stable").unwrap();

        reg.set_category("Stable", "Elsewhere");
        reg.set_preferred_size("Stable", Vec2::new(64.0, 64.0));

        let after = reg.concurrent_find("Stable").unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(before.id(), after.id());
    }

    #[test]
    fn category_visibility_tristate() {
        let mut reg = registry();
        for name in ["a", "b", "c"] {
            attach(&mut reg, name);
            reg.set_category(name, "Cams");
            reg.set_visibility(name, false);
        }
        let cams_index =
            reg.categories().iter().position(|c| c.name == "Cams").unwrap();

        let aggregate = |reg: &WindowRegistry| reg.category_visibility(&reg.categories()[cams_index]);
        assert_eq!(aggregate(&reg), VisAggregate::NoneVisible);

        // Toggling "none" shows everything.
        let target = aggregate(&reg).toggled();
        assert!(target);
        reg.set_category_visible(cams_index, target);
        assert_eq!(aggregate(&reg), VisAggregate::AllVisible);

        reg.set_visibility("b", false);
        reg.set_visibility("c", false);
        assert_eq!(aggregate(&reg), VisAggregate::Mixed);
        // Mixed resolves to all-visible, never to a collapse-to-hidden.
        assert!(aggregate(&reg).toggled());
    }

    #[test]
    fn setters_mark_settings_dirty() {
        let mut reg = registry();
        assert!(!reg.take_settings_dirty());
        reg.set_help_text("W", "says hi");
        assert!(reg.take_settings_dirty());
        assert!(!reg.take_settings_dirty());
    }

    #[test]
    fn auto_tile_stages_pending_layouts() {
        let mut reg = registry();
        for name in ["a", "b"] {
            attach(&mut reg, name);
            // Clear the first-use placement so only auto-tile remains.
            let key = reg.key_of(name).unwrap();
            reg.get_mut(key).unwrap().pending_layout = None;
        }
        reg.set_visibility("b", false);

        let focus = reg.auto_tile(Rect::new(200.0, 0.0, 800.0, 800.0)).unwrap();
        assert_eq!(focus, vec!["a".to_owned()]);

        let a = reg.get(reg.key_of("a").unwrap()).unwrap();
        let staged = a.pending_layout.unwrap();
        assert_eq!(staged.cond, ApplyCond::Always);
        assert_eq!(staged.pos, Vec2::new(200.0, 0.0));

        // Hidden windows keep whatever layout they had.
        let b = reg.get(reg.key_of("b").unwrap()).unwrap();
        assert!(b.pending_layout.is_none());
    }
}
