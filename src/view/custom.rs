use crate::model::window::WindowShared;
use crate::toolkit::Toolkit;
use crate::view::WindowRender;

pub type RenderFn = Box<dyn FnMut(&mut dyn Toolkit) + Send>;

/// Escape hatch for window kinds the crate does not know about: the owner
/// supplies a closure that draws the body through the toolkit.
pub struct CustomView {
    render_fn: RenderFn,
}

impl CustomView {
    pub fn new(render_fn: RenderFn) -> Self { Self { render_fn } }
}

impl WindowRender for CustomView {
    fn render(&mut self, _shared: &WindowShared, ui: &mut dyn Toolkit) {
        (self.render_fn)(ui);
    }
}
