use std::hash::Hasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::common::collections::HashSet;
use crate::model::geometry::Vec2;
use crate::toolkit::ApplyCond;

/// Stable identity of a window, derived from its name. Two distinct names
/// hashing to the same id is a fatal condition caught at registration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn of(name: &str) -> Self { Self(stable_hash(name)) }
}

/// Seed-free hash so ids are reproducible across runs; used for window and
/// plot-series identities.
pub fn stable_hash(name: &str) -> u64 {
    let mut hasher = rustc_hash::FxHasher::default();
    hasher.write(name.as_bytes());
    hasher.finish()
}

/// Property update applied on the frame thread; `None` fields are unchanged.
#[derive(Clone, Debug, Default)]
pub struct WindowProps {
    pub category: Option<String>,
    pub help_text: Option<String>,
    pub preferred_size: Option<Vec2>,
}

/// One-shot placement instruction consumed on the next frame the window is
/// rendered.
#[derive(Clone, Copy, Debug)]
pub struct PendingLayout {
    pub pos: Vec2,
    pub size: Vec2,
    pub cond: ApplyCond,
}

#[derive(Clone, Debug)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    /// Tightly packed rows; interpretation (channels, format) is up to the
    /// toolkit that uploads it.
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotSample {
    pub series: u64,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SeriesDef {
    pub id: u64,
    pub name: String,
    pub style: Option<String>,
}

/// Producer-facing payload inbox. The kind is claimed by the first typed
/// write; a mismatched write afterwards is a caller contract violation.
#[derive(Default)]
pub(crate) enum PayloadInbox {
    #[default]
    Untyped,
    Image {
        latest: Option<Arc<ImageBuffer>>,
    },
    Plot {
        samples: Vec<PlotSample>,
        new_series: Vec<SeriesDef>,
        known_series: HashSet<u64>,
    },
}

impl PayloadInbox {
    fn kind_name(&self) -> &'static str {
        match self {
            PayloadInbox::Untyped => "untyped",
            PayloadInbox::Image { .. } => "image",
            PayloadInbox::Plot { .. } => "plot",
        }
    }
}

/// The cross-thread half of a window. Handed out behind `Arc` from the
/// concurrent index, so a handle obtained by a producer stays valid for the
/// process lifetime regardless of structural changes on the frame thread.
///
/// Only `visible` and the payload inbox are touched off the frame thread;
/// everything structural lives in the registry.
pub struct WindowShared {
    id: WindowId,
    name: String,
    visible: AtomicBool,
    inbox: Mutex<PayloadInbox>,
}

impl WindowShared {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            id: WindowId::of(name),
            name: name.to_owned(),
            visible: AtomicBool::new(true),
            inbox: Mutex::new(PayloadInbox::Untyped),
        }
    }

    pub fn id(&self) -> WindowId { self.id }

    pub fn name(&self) -> &str { &self.name }

    pub fn is_visible(&self) -> bool { self.visible.load(Ordering::Acquire) }

    pub(crate) fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Release);
    }

    /// Replace the displayed image. Dropped while the window is hidden so
    /// high-frequency producers cost nothing for panels nobody is watching.
    ///
    /// Panics if this window already carries non-image data.
    pub fn update_image(&self, image: Arc<ImageBuffer>) {
        if !self.is_visible() {
            return;
        }
        let mut inbox = self.inbox.lock();
        match &mut *inbox {
            slot @ PayloadInbox::Untyped => *slot = PayloadInbox::Image { latest: Some(image) },
            PayloadInbox::Image { latest } => *latest = Some(image),
            other => panic!(
                "window '{}' holds {} data, cannot update it with an image",
                self.name,
                other.kind_name()
            ),
        }
    }

    /// Append one `(x, y)` sample to the named series. `style` is an
    /// optional `#RRGGBBAA` line color, honored when the series first
    /// appears. Dropped while the window is hidden.
    ///
    /// Panics if this window already carries non-plot data.
    pub fn add_plot_sample(&self, series_name: &str, x: f64, y: f64, style: Option<&str>) {
        if !self.is_visible() {
            return;
        }
        let series = stable_hash(series_name);
        let mut inbox = self.inbox.lock();
        if let PayloadInbox::Untyped = &*inbox {
            *inbox = PayloadInbox::Plot {
                samples: Vec::new(),
                new_series: Vec::new(),
                known_series: HashSet::default(),
            };
        }
        match &mut *inbox {
            PayloadInbox::Plot { samples, new_series, known_series } => {
                samples.push(PlotSample { series, x, y });
                if known_series.insert(series) {
                    new_series.push(SeriesDef {
                        id: series,
                        name: series_name.to_owned(),
                        style: style.map(str::to_owned),
                    });
                }
            }
            other => panic!(
                "window '{}' holds {} data, cannot append a plot sample",
                self.name,
                other.kind_name()
            ),
        }
    }

    /// Frame-thread read of the latest image; may be one write stale if it
    /// races with a producer, which is the documented trade-off.
    pub(crate) fn latest_image(&self) -> Option<Arc<ImageBuffer>> {
        match &*self.inbox.lock() {
            PayloadInbox::Image { latest } => latest.clone(),
            _ => None,
        }
    }

    /// Frame-thread drain of samples accumulated since the last frame. The
    /// vectors are swapped out under the lock so producers keep appending
    /// to fresh ones without waiting on the merge.
    pub(crate) fn drain_plot(&self) -> (Vec<PlotSample>, Vec<SeriesDef>) {
        match &mut *self.inbox.lock() {
            PayloadInbox::Plot { samples, new_series, .. } => {
                (std::mem::take(samples), std::mem::take(new_series))
            }
            _ => (Vec::new(), Vec::new()),
        }
    }
}
