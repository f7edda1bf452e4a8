/// Continuous 2D vector. Used for world-pixel positions handed around by the camera.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Raw pointer position in physical pixels, origin at the bottom-left of the window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Position in world space measured in tiles: `(2.5, 0.5)` is the middle of the
/// bottom edge of tile `(2, 0)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer grid cell. Values handed out by the coordinate transformer are always
/// inside the model extents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in tile units, anchored at its bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub origin: WorldPoint,
    pub width: f32,
    pub height: f32,
}

impl WorldRect {
    /// Half-open containment: the left and bottom edges are inside, the right and
    /// top edges are not.
    pub fn contains(&self, point: WorldPoint) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.width
            && point.y < self.origin.y + self.height
    }

    /// Strict containment: points on any edge are outside.
    pub fn contains_interior(&self, point: WorldPoint) -> bool {
        point.x > self.origin.x
            && point.y > self.origin.y
            && point.x < self.origin.x + self.width
            && point.y < self.origin.y + self.height
    }
}
