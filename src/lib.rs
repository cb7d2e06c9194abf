pub mod common;
pub mod layout_engine;
pub mod model;
pub mod overlay;
pub mod registry;
pub mod settings;
pub mod tasks;
pub mod toolkit;
pub mod view;

pub use model::geometry::{Rect, Vec2};
pub use model::window::{ImageBuffer, PlotSample, WindowId, WindowProps};
pub use overlay::{Overlay, OverlayHandle};
pub use toolkit::{ApplyCond, Toolkit};
