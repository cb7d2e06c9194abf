pub mod geometry;
pub mod window;

pub use geometry::{Rect, Vec2};
pub use window::{
    ImageBuffer, PendingLayout, PlotSample, SeriesDef, WindowId, WindowProps, WindowShared,
};
