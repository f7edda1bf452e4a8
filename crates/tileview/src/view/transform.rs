use crate::camera::CameraController;
use crate::geometry::{ScreenPoint, TileCoord, Vec2, WorldPoint};

/// Screen -> world -> tile pipeline shared by every input handler.
///
/// Nothing here is cached: the camera can move between two events, so each
/// event goes through the current inverse projection again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    tile_length: f32,
    grid_width: u32,
    grid_height: u32,
}

impl CoordinateTransformer {
    pub fn new(tile_length: f32, grid_width: u32, grid_height: u32) -> Self {
        Self {
            tile_length,
            grid_width,
            grid_height,
        }
    }

    pub fn tile_length(&self) -> f32 {
        self.tile_length
    }

    pub fn to_world(&self, camera: &dyn CameraController, point: ScreenPoint) -> WorldPoint {
        let world_px = camera.unproject(point);
        WorldPoint {
            x: world_px.x / self.tile_length,
            y: world_px.y / self.tile_length,
        }
    }

    pub fn to_tile(&self, camera: &dyn CameraController, point: ScreenPoint) -> Option<TileCoord> {
        self.world_to_tile(self.to_world(camera, point))
    }

    /// Truncates to the containing cell. Anything left of or below the grid,
    /// including the `(-1, 0)` band that plain truncation would fold onto row or
    /// column zero, is rejected.
    pub fn world_to_tile(&self, world: WorldPoint) -> Option<TileCoord> {
        if !world.x.is_finite() || !world.y.is_finite() || world.x < 0.0 || world.y < 0.0 {
            return None;
        }
        let x = world.x as u64;
        let y = world.y as u64;
        if x >= u64::from(self.grid_width) || y >= u64::from(self.grid_height) {
            return None;
        }
        Some(TileCoord::new(x as u32, y as u32))
    }

    /// World-pixel position of the bottom-left corner of `coord`.
    pub fn tile_origin_px(&self, coord: TileCoord) -> Vec2 {
        Vec2 {
            x: coord.x as f32 * self.tile_length,
            y: coord.y as f32 * self.tile_length,
        }
    }

    pub fn world_to_px(&self, world: WorldPoint) -> Vec2 {
        Vec2 {
            x: world.x * self.tile_length,
            y: world.y * self.tile_length,
        }
    }
}
