use enum_dispatch::enum_dispatch;

use crate::model::window::WindowShared;
use crate::toolkit::Toolkit;

/// Frame-side render state of one window kind. Invoked inside the window's
/// begin/end scope; all drawing is delegated to the toolkit.
#[enum_dispatch]
pub trait WindowRender {
    fn render(&mut self, shared: &WindowShared, ui: &mut dyn Toolkit);
}

mod custom;
mod image;
mod plot;

pub use custom::CustomView;
pub use image::ImageView;
pub use plot::PlotView;

#[enum_dispatch(WindowRender)]
pub enum WindowView {
    Image(ImageView),
    Plot(PlotView),
    Custom(CustomView),
}
