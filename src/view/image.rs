use crate::model::window::WindowShared;
use crate::toolkit::Toolkit;
use crate::view::WindowRender;

/// Shows the most recently pushed image buffer. Scaling to the window's
/// content region (and any texture caching) is the toolkit's business.
#[derive(Default)]
pub struct ImageView;

impl WindowRender for ImageView {
    fn render(&mut self, shared: &WindowShared, ui: &mut dyn Toolkit) {
        if let Some(image) = shared.latest_image() {
            ui.draw_image(&image);
        }
    }
}
