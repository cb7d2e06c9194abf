/// Minimal 2D vector used for sizes and positions, in logical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self { Self { x, y } }

    pub fn scaled(self, factor: f32) -> Self { Self::new(self.x * factor, self.y * factor) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn max_x(&self) -> f32 { self.origin.x + self.size.x }

    pub fn max_y(&self) -> f32 { self.origin.y + self.size.y }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        // Tolerance absorbs the float error accumulated by repeated scaling.
        const EPS: f32 = 1e-3;
        other.origin.x >= self.origin.x - EPS
            && other.origin.y >= self.origin.y - EPS
            && other.max_x() <= self.max_x() + EPS
            && other.max_y() <= self.max_y() + EPS
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.origin.x < other.max_x()
            && other.origin.x < self.max_x()
            && self.origin.y < other.max_y()
            && other.origin.y < self.max_y()
    }
}
