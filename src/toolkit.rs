//! Interface to the external immediate-mode rendering toolkit.
//!
//! Everything visual — widget drawing, input, texture upload, plot
//! primitives — lives behind [`Toolkit`]. The overlay core only sequences
//! calls into it, so any immediate-mode backend (or a headless stub) can
//! host the overlay.

use crate::model::geometry::Vec2;
use crate::model::window::ImageBuffer;

/// When a position/size hint takes effect, mirroring immediate-mode
/// "condition" flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyCond {
    /// Apply on the next frame unconditionally.
    Always,
    /// Apply only if the toolkit has never seen this window before.
    FirstUseEver,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Borrowed view of one plot series handed to the toolkit for drawing.
pub struct PlotSeriesRef<'a> {
    pub name: &'a str,
    /// RGBA in 0..=1, when the producer supplied a style.
    pub color: Option<[f32; 4]>,
    pub xs: &'a [f64],
    pub ys: &'a [f64],
}

pub trait Toolkit {
    fn display_size(&self) -> Vec2;

    fn set_next_window_pos(&mut self, pos: Vec2, cond: ApplyCond);
    fn set_next_window_size(&mut self, size: Vec2, cond: ApplyCond);
    fn set_next_window_collapsed(&mut self, collapsed: bool, cond: ApplyCond);

    /// Open a window scope. `open` wires a close box to a flag. Returns
    /// whether the window body should be drawn (false while collapsed).
    /// [`Toolkit::end_window`] must be called either way.
    fn begin_window(&mut self, title: &str, open: Option<&mut bool>) -> bool;
    fn end_window(&mut self);

    fn button(&mut self, label: &str) -> bool;
    fn same_line(&mut self);
    fn collapsing_header(&mut self, label: &str) -> bool;

    /// Draw a checkbox; `mixed` renders the indeterminate state, `enabled`
    /// false renders it grayed out. Returns `Some(new_value)` when the user
    /// toggled it this frame.
    fn checkbox(&mut self, label: &str, checked: bool, mixed: bool, enabled: bool)
    -> Option<bool>;

    /// Attach a hover tooltip to the most recently drawn item.
    fn item_tooltip(&mut self, text: &str);

    /// Best-effort input focus request for a titled window.
    fn focus_window(&mut self, title: &str);

    /// Tell the host that persisted state changed and should be rewritten.
    fn mark_settings_dirty(&mut self);

    fn draw_image(&mut self, image: &ImageBuffer);
    fn draw_plot(&mut self, series: &[PlotSeriesRef<'_>], limits: Option<PlotBounds>);
}

/// A toolkit that draws nothing. Used by tests and headless hosts; records
/// a coarse call log and lets interactions be scripted per frame.
#[derive(Default)]
pub struct HeadlessToolkit {
    pub display: Vec2,
    /// Button labels to report as clicked on the next frame.
    pub pressed_buttons: Vec<String>,
    /// Checkbox labels mapped to the value the "user" toggles them to.
    pub checkbox_toggles: crate::common::collections::HashMap<String, bool>,
    /// Window titles whose close box is clicked on the next frame.
    pub close_requests: Vec<String>,
    pub calls: Vec<String>,
    pub settings_dirty: bool,
}

impl HeadlessToolkit {
    pub fn new(display: Vec2) -> Self {
        Self { display, ..Default::default() }
    }

    pub fn press(&mut self, label: &str) { self.pressed_buttons.push(label.to_owned()); }

    pub fn toggle(&mut self, label: &str, to: bool) {
        self.checkbox_toggles.insert(label.to_owned(), to);
    }

    fn log(&mut self, entry: String) { self.calls.push(entry); }
}

impl Toolkit for HeadlessToolkit {
    fn display_size(&self) -> Vec2 { self.display }

    fn set_next_window_pos(&mut self, pos: Vec2, cond: ApplyCond) {
        self.log(format!("next_pos({},{},{:?})", pos.x, pos.y, cond));
    }

    fn set_next_window_size(&mut self, size: Vec2, cond: ApplyCond) {
        self.log(format!("next_size({},{},{:?})", size.x, size.y, cond));
    }

    fn set_next_window_collapsed(&mut self, collapsed: bool, cond: ApplyCond) {
        self.log(format!("next_collapsed({collapsed},{cond:?})"));
    }

    fn begin_window(&mut self, title: &str, open: Option<&mut bool>) -> bool {
        self.log(format!("begin({title})"));
        if let Some(open) = open {
            if let Some(pos) = self.close_requests.iter().position(|t| t == title) {
                self.close_requests.remove(pos);
                *open = false;
            }
        }
        true
    }

    fn end_window(&mut self) { self.log("end".to_owned()); }

    fn button(&mut self, label: &str) -> bool {
        self.log(format!("button({label})"));
        if let Some(pos) = self.pressed_buttons.iter().position(|l| l == label) {
            self.pressed_buttons.remove(pos);
            return true;
        }
        false
    }

    fn same_line(&mut self) {}

    fn collapsing_header(&mut self, label: &str) -> bool {
        self.log(format!("header({label})"));
        true
    }

    fn checkbox(
        &mut self,
        label: &str,
        checked: bool,
        mixed: bool,
        enabled: bool,
    ) -> Option<bool> {
        self.log(format!("checkbox({label},{checked},{mixed},{enabled})"));
        if !enabled {
            return None;
        }
        self.checkbox_toggles.remove(label)
    }

    fn item_tooltip(&mut self, _text: &str) {}

    fn focus_window(&mut self, title: &str) { self.log(format!("focus({title})")); }

    fn mark_settings_dirty(&mut self) { self.settings_dirty = true; }

    fn draw_image(&mut self, image: &ImageBuffer) {
        self.log(format!("image({}x{})", image.width, image.height));
    }

    fn draw_plot(&mut self, series: &[PlotSeriesRef<'_>], _limits: Option<PlotBounds>) {
        self.log(format!("plot({} series)", series.len()));
    }
}
