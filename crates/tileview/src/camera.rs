//! Camera controller seam plus the desktop pan camera used by the sandbox.
//!
//! The view only talks to [`CameraController`]; which concrete controller it
//! receives is decided by whoever builds it.

use tracing::trace;

use crate::geometry::{ScreenPoint, Vec2};
use crate::view::PointerButton;

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 3.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Snapshot of the camera transform for one frame. Screen space has its origin
/// at the bottom-left, world space is measured in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// World position shown at the centre of the viewport.
    pub center: Vec2,
    pub zoom: f32,
    pub viewport: Viewport,
}

impl Projection {
    pub fn scale(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn world_to_screen(&self, world: Vec2) -> ScreenPoint {
        let scale = self.scale();
        ScreenPoint {
            x: (world.x - self.center.x) * scale + self.viewport.width as f32 * 0.5,
            y: (world.y - self.center.y) * scale + self.viewport.height as f32 * 0.5,
        }
    }

    pub fn screen_to_world(&self, screen: ScreenPoint) -> Vec2 {
        let scale = self.scale();
        Vec2 {
            x: (screen.x - self.viewport.width as f32 * 0.5) / scale + self.center.x,
            y: (screen.y - self.viewport.height as f32 * 0.5) / scale + self.center.y,
        }
    }
}

/// Pan/zoom controller injected into the view.
///
/// Pointer events are offered here first; returning `true` claims the event for
/// a camera gesture and keeps it away from tile and entity handling.
pub trait CameraController {
    fn try_claim_pointer_down(&mut self, point: ScreenPoint, button: PointerButton) -> bool;
    fn try_claim_pointer_up(&mut self, point: ScreenPoint, button: PointerButton) -> bool;
    fn try_claim_pointer_dragged(&mut self, point: ScreenPoint, button: PointerButton) -> bool;
    /// Inverse projection into world pixels.
    fn unproject(&self, point: ScreenPoint) -> Vec2 {
        self.projection().screen_to_world(point)
    }
    fn pan(&mut self, dx: f32, dy: f32);
    fn zoom(&mut self, _steps: i32) {}
    fn resize(&mut self, width: u32, height: u32);
    fn projection(&self) -> Projection;
    /// Per-frame hook for controllers with inertia or easing.
    fn advance(&mut self, _dt_seconds: f32) {}
}

/// Area the camera centre may travel over, in world pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl PanBounds {
    /// Grid extents grown by `margin_tiles` on every side.
    pub fn around_grid(width: u32, height: u32, tile_length: f32, margin_tiles: u32) -> Self {
        let margin = margin_tiles as f32 * tile_length;
        Self {
            min: Vec2::new(-margin, -margin),
            max: Vec2::new(
                width as f32 * tile_length + margin,
                height as f32 * tile_length + margin,
            ),
        }
    }

    fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2 {
            x: point.x.clamp(self.min.x, self.max.x.max(self.min.x)),
            y: point.y.clamp(self.min.y, self.max.y.max(self.min.y)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    last: ScreenPoint,
}

/// Mouse-driven camera: drag with the pan button, zoom in fixed steps.
#[derive(Debug, Clone)]
pub struct PanCamera {
    center: Vec2,
    zoom: f32,
    viewport: Viewport,
    bounds: PanBounds,
    pan_button: PointerButton,
    drag: Option<DragState>,
}

impl PanCamera {
    pub fn new(viewport: Viewport, bounds: PanBounds, pan_button: PointerButton) -> Self {
        let center = Vec2 {
            x: (bounds.min.x + bounds.max.x) * 0.5,
            y: (bounds.min.y + bounds.max.y) * 0.5,
        };
        Self {
            center,
            zoom: CAMERA_ZOOM_DEFAULT,
            viewport,
            bounds,
            pan_button,
            drag: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn zoom_level(&self) -> f32 {
        clamp_camera_zoom(self.zoom)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    fn set_center_clamped(&mut self, center: Vec2) {
        self.center = self.bounds.clamp(center);
    }
}

impl CameraController for PanCamera {
    fn try_claim_pointer_down(&mut self, point: ScreenPoint, button: PointerButton) -> bool {
        if button != self.pan_button {
            return false;
        }
        self.drag = Some(DragState { last: point });
        trace!(x = point.x, y = point.y, "camera_drag_started");
        true
    }

    fn try_claim_pointer_up(&mut self, point: ScreenPoint, button: PointerButton) -> bool {
        if button != self.pan_button || self.drag.is_none() {
            return false;
        }
        self.drag = None;
        trace!(x = point.x, y = point.y, "camera_drag_finished");
        true
    }

    fn try_claim_pointer_dragged(&mut self, point: ScreenPoint, button: PointerButton) -> bool {
        if button != self.pan_button {
            return false;
        }
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let scale = clamp_camera_zoom(self.zoom);
        let dx = (drag.last.x - point.x) / scale;
        let dy = (drag.last.y - point.y) / scale;
        drag.last = point;
        self.pan(dx, dy);
        true
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.set_center_clamped(Vec2 {
            x: self.center.x + dx,
            y: self.center.y + dy,
        });
    }

    fn zoom(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        self.zoom = clamp_camera_zoom(self.zoom + steps as f32 * CAMERA_ZOOM_STEP);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport { width, height };
    }

    fn projection(&self) -> Projection {
        Projection {
            center: self.center,
            zoom: self.zoom,
            viewport: self.viewport,
        }
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}
