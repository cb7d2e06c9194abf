//! Frame driver and producer surface.
//!
//! [`Overlay`] is the explicit context object: it owns the registry and
//! lives with the frame-owner thread that drives `render` once per frame.
//! [`OverlayHandle`] is the cheap clonable surface handed to producer
//! threads; everything it does is either a lock-protected payload write or
//! a deferred task that runs at the start of the next frame.

use std::sync::Arc;

use tracing::warn;

use crate::model::geometry::{Rect, Vec2};
use crate::model::window::{ImageBuffer, WindowProps, WindowShared};
use crate::registry::{
    self, ConcurrentIndex, PreRenderFn, SIDE_PANEL_WIDTH, WindowKey, WindowRegistry,
};
use crate::settings;
use crate::tasks::DeferredTaskQueue;
use crate::toolkit::{ApplyCond, Toolkit};
use crate::view::{CustomView, ImageView, PlotView, WindowRender, WindowView};

pub const PANEL_TITLE: &str = "Window List";

struct SharedState {
    tasks: DeferredTaskQueue,
    index: Arc<ConcurrentIndex>,
}

pub struct Overlay {
    registry: WindowRegistry,
    shared: Arc<SharedState>,
    last_display: Vec2,
    initialized: bool,
}

impl Default for Overlay {
    fn default() -> Self { Self::new() }
}

impl Overlay {
    pub fn new() -> Self {
        let index = Arc::new(ConcurrentIndex::default());
        Self {
            registry: WindowRegistry::new(Arc::clone(&index)),
            shared: Arc::new(SharedState { tasks: DeferredTaskQueue::new(), index }),
            last_display: Vec2::new(1280.0, 720.0),
            initialized: false,
        }
    }

    /// The producer-thread surface. Clone freely; all clones feed this
    /// overlay instance.
    pub fn handle(&self) -> OverlayHandle {
        OverlayHandle { shared: Arc::clone(&self.shared) }
    }

    /// One-time setup on the frame-owner thread: applies the persisted
    /// settings text, if the host has one.
    pub fn initialize(&mut self, persisted: Option<&str>) {
        if let Some(text) = persisted {
            settings::load(&mut self.registry, text);
        }
        // Loading settings creates records; that alone should not force an
        // immediate rewrite of what we just read.
        self.registry.take_settings_dirty();
        self.initialized = true;
    }

    pub fn registry(&self) -> &WindowRegistry { &self.registry }

    pub fn registry_mut(&mut self) -> &mut WindowRegistry { &mut self.registry }

    /// Serialized settings text when anything changed since the last call.
    pub fn save_settings(&mut self) -> Option<String> {
        self.registry.take_settings_dirty().then(|| settings::serialize(&self.registry))
    }

    /// Register a window whose body is drawn by `render_fn`. Frame-owner
    /// thread only; producers reach custom windows via tasks.
    pub fn find_or_create_custom(
        &mut self,
        name: &str,
        render_fn: Box<dyn FnMut(&mut dyn Toolkit) + Send>,
    ) -> WindowKey {
        self.registry.attach_view(
            name,
            WindowView::Custom(CustomView::new(render_fn)),
            self.last_display,
        )
    }

    /// Drive one frame. Strict order: deferred tasks first (so windows
    /// created by them show up this frame), then the side panel, then each
    /// window with its pending layout applied before its body renders.
    pub fn render(&mut self, ui: &mut dyn Toolkit) {
        debug_assert!(self.initialized, "Overlay::initialize must run before the first frame");
        self.last_display = ui.display_size();

        self.shared.tasks.drain_and_run(&mut self.registry, ui);
        self.render_side_panel(ui);
        self.render_windows(ui);
    }

    fn render_side_panel(&mut self, ui: &mut dyn Toolkit) {
        let display = self.last_display;
        ui.set_next_window_pos(Vec2::new(0.0, 0.0), ApplyCond::Always);
        ui.set_next_window_size(Vec2::new(SIDE_PANEL_WIDTH, display.y), ApplyCond::Always);
        if ui.begin_window(PANEL_TITLE, None) {
            if self.registry.all_content_hidden() {
                if ui.button("Show All") {
                    self.registry.set_all_visible(true);
                    ui.mark_settings_dirty();
                }
            } else if ui.button("Hide All") {
                self.registry.set_all_visible(false);
                ui.mark_settings_dirty();
            }
            ui.same_line();
            if ui.button("Auto-Tile") {
                let viewport = Rect::new(
                    SIDE_PANEL_WIDTH,
                    0.0,
                    display.x - SIDE_PANEL_WIDTH,
                    display.y,
                );
                match self.registry.auto_tile(viewport) {
                    Ok(titles) => {
                        for title in &titles {
                            ui.focus_window(title);
                        }
                    }
                    Err(err) => warn!("auto-tile skipped: {err}"),
                }
            }

            for cat_index in 0..self.registry.categories().len() {
                let (cat_name, aggregate, members) = {
                    let cat = &self.registry.categories()[cat_index];
                    (cat.name.clone(), self.registry.category_visibility(cat), cat.members.clone())
                };

                let open = ui.collapsing_header(&cat_name);
                ui.same_line();
                let clicked = ui
                    .checkbox(
                        &format!("##{cat_name}"),
                        aggregate.is_checked(),
                        aggregate.is_mixed(),
                        true,
                    )
                    .is_some();
                if clicked {
                    // The aggregate rule decides the target, not the raw
                    // checkbox value: mixed always resolves to visible.
                    self.registry.set_category_visible(cat_index, aggregate.toggled());
                    ui.mark_settings_dirty();
                }
                if !open {
                    continue;
                }

                for key in members {
                    let (name, help, visible, has_content) = {
                        let record = self.registry.get(key).expect("member keys are live");
                        (
                            record.shared.name().to_owned(),
                            record.help_text.clone(),
                            record.shared.is_visible(),
                            record.has_content(),
                        )
                    };
                    if let Some(value) = ui.checkbox(&name, visible, false, has_content) {
                        self.registry.set_visibility(&name, value);
                        ui.mark_settings_dirty();
                    }
                    ui.item_tooltip(&format!("{name}\n{help}"));
                }
            }
        }
        ui.end_window();
    }

    fn render_windows(&mut self, ui: &mut dyn Toolkit) {
        let order: Vec<WindowKey> = self.registry.creation_order().to_vec();
        for key in order {
            let (title, help, pending) = {
                let record = self.registry.get_mut(key).expect("creation order holds live keys");
                if !record.has_content() || !record.shared.is_visible() {
                    continue;
                }
                (
                    record.shared.name().to_owned(),
                    record.help_text.clone(),
                    record.pending_layout.take(),
                )
            };

            if let Some(layout) = pending {
                ui.set_next_window_pos(layout.pos, layout.cond);
                ui.set_next_window_size(layout.size, layout.cond);
                ui.set_next_window_collapsed(false, layout.cond);
                ui.mark_settings_dirty();
                self.registry.mark_settings_dirty();
            }

            let mut open = true;
            let expanded = ui.begin_window(&title, Some(&mut open));
            ui.item_tooltip(&help);
            if expanded {
                let record = self.registry.get_mut(key).expect("key is live");
                let shared = Arc::clone(&record.shared);
                for (_, callback) in record.pre_render.iter_mut() {
                    callback(ui);
                }
                if let Some(view) = record.view.as_mut() {
                    view.render(&shared, ui);
                }
            }
            ui.end_window();

            if !open {
                self.registry.set_visibility(&title, false);
                ui.mark_settings_dirty();
            }
        }
    }
}

/// Producer-thread surface. All methods are callable from any thread and
/// never block behind the frame loop; structural effects land at the start
/// of the next frame.
#[derive(Clone)]
pub struct OverlayHandle {
    shared: Arc<SharedState>,
}

impl OverlayHandle {
    /// Run `f` on the frame thread during the next drain.
    pub fn run_on_frame_thread(
        &self,
        f: impl FnOnce(&mut WindowRegistry, &mut dyn Toolkit) + Send + 'static,
    ) {
        self.shared.tasks.enqueue_once(f);
    }

    /// Install (or replace) a callback that runs every frame until removed.
    pub fn set_per_frame_callback(
        &self,
        name: &str,
        callback: impl Fn(&mut WindowRegistry, &mut dyn Toolkit) + Send + Sync + 'static,
    ) {
        self.shared.tasks.set_repeating(name, Some(Arc::new(callback)));
    }

    pub fn clear_per_frame_callback(&self, name: &str) {
        self.shared.tasks.set_repeating(name, None);
    }

    /// Fire-and-forget property update; `None` fields are left unchanged.
    /// Effective next frame.
    pub fn set_window_properties(&self, name: &str, props: WindowProps) {
        let name = name.to_owned();
        self.shared.tasks.enqueue_once(move |registry, _| {
            registry.find_or_create(&name);
            if let Some(category) = &props.category {
                registry.set_category(&name, category);
            }
            if let Some(help) = &props.help_text {
                registry.set_help_text(&name, help);
            }
            if let Some(size) = props.preferred_size {
                registry.set_preferred_size(&name, size);
            }
        });
    }

    /// Install (`Some`) or remove (`None`) a named callback drawn inside
    /// the window before its view each frame.
    pub fn set_pre_render_callback(
        &self,
        window: &str,
        callback_name: &str,
        callback: Option<PreRenderFn>,
    ) {
        let window = window.to_owned();
        let callback_name = callback_name.to_owned();
        self.shared.tasks.enqueue_once(move |registry, _| {
            registry.set_pre_render_callback(&window, &callback_name, callback);
        });
    }

    /// Existence check and cross-thread handle; `None` until the window
    /// gains content on the frame thread.
    pub fn find_window(&self, name: &str) -> Option<Arc<WindowShared>> {
        registry::concurrent_find(&self.shared.index, name)
    }

    pub fn window_is_visible(&self, name: &str) -> bool {
        self.find_window(name).is_some_and(|shared| shared.is_visible())
    }

    /// Replace the image shown by `name`, creating the window on the next
    /// frame if needed. The fast path is a single payload-lock write.
    pub fn update_image(&self, name: &str, image: Arc<ImageBuffer>) {
        if let Some(shared) = self.find_window(name) {
            shared.update_image(image);
            return;
        }
        let name = name.to_owned();
        self.shared.tasks.enqueue_once(move |registry, ui| {
            let key =
                registry.attach_view(&name, WindowView::Image(ImageView), ui.display_size());
            registry.get(key).expect("just attached").shared.update_image(image);
        });
    }

    /// Append a plot sample to `series_name` in window `name`, creating the
    /// window on the next frame if needed. `style` is `#RRGGBBAA`.
    pub fn add_plot_sample(
        &self,
        name: &str,
        series_name: &str,
        x: f64,
        y: f64,
        style: Option<&str>,
    ) {
        if let Some(shared) = self.find_window(name) {
            shared.add_plot_sample(series_name, x, y, style);
            return;
        }
        let name = name.to_owned();
        let series_name = series_name.to_owned();
        let style = style.map(str::to_owned);
        self.shared.tasks.enqueue_once(move |registry, ui| {
            let key =
                registry.attach_view(&name, WindowView::Plot(PlotView::new()), ui.display_size());
            registry.get(key).expect("just attached").shared.add_plot_sample(
                &series_name,
                x,
                y,
                style.as_deref(),
            );
        });
    }
}
