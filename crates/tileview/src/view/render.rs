//! Software rasterizer for one frame of the world view.
//!
//! Layers are drawn back to front: tiles, the hovered tile again with the
//! interaction tint, entity sprites, then the tooltip. Nothing here mutates the
//! model, the registry or the tile grid.

use crate::assets::{AssetProvider, Drawable};
use crate::camera::Projection;
use crate::geometry::{Vec2, WorldPoint};
use crate::model::WorldModel;
use crate::view::interaction::InteractionState;
use crate::view::sprites::{SpriteProxy, SpriteRegistry};
use crate::view::text::{draw_text_clipped, text_width_px, TEXT_HEIGHT};
use crate::view::tiles::TileImageResolver;
use crate::view::transform::CoordinateTransformer;

pub const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const SELECTED_OUTLINE_COLOR: [u8; 4] = [80, 220, 255, 255];
const TOOLTIP_TEXT_COLOR: [u8; 4] = [90, 255, 90, 255];

/// Per-channel multiplier applied while drawing. Never stored on a drawable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Tint {
    pub const NEUTRAL: Tint = Tint::new(1.0, 1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn apply(self, color: [u8; 4]) -> [u8; 4] {
        [
            scale_channel(color[0], self.r),
            scale_channel(color[1], self.g),
            scale_channel(color[2], self.b),
            scale_channel(color[3], self.a),
        ]
    }
}

fn scale_channel(value: u8, factor: f32) -> u8 {
    (value as f32 * factor.clamp(0.0, 1.0)).round() as u8
}

/// Frame-pixel rectangle, top-left inclusive, bottom-right exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl FrameRect {
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

/// Read-only inputs for one frame.
pub struct RenderScene<'a> {
    pub model: &'a dyn WorldModel,
    pub assets: &'a dyn AssetProvider,
    pub projection: Projection,
    pub transformer: &'a CoordinateTransformer,
    pub tiles: &'a TileImageResolver,
    pub sprites: &'a SpriteRegistry,
    pub interaction: &'a InteractionState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRenderer {
    tooltip_offset_px: f32,
    tooltip_line_height_px: f32,
}

impl FrameRenderer {
    pub fn new(tooltip_offset_px: f32, tooltip_line_height_px: f32) -> Self {
        Self {
            tooltip_offset_px,
            tooltip_line_height_px,
        }
    }

    pub fn render(&self, frame: &mut [u8], width: u32, height: u32, scene: &RenderScene<'_>) {
        clear(frame, CLEAR_COLOR);
        if width == 0 || height == 0 {
            return;
        }
        draw_tiles(frame, width, height, scene);
        draw_hover(frame, width, height, scene);
        draw_sprites(frame, width, height, scene);
        self.draw_tooltip(frame, width, height, scene);
    }

    fn draw_tooltip(&self, frame: &mut [u8], width: u32, height: u32, scene: &RenderScene<'_>) {
        let Some(anchor) = scene.interaction.tooltip_anchor() else {
            return;
        };
        let Some(lines) = tooltip_lines(scene.model, scene.sprites, anchor) else {
            return;
        };
        let anchor_screen = scene
            .projection
            .world_to_screen(scene.transformer.world_to_px(anchor));
        // Shift left so the widest line stays inside the frame.
        let widest = lines.iter().map(|line| text_width_px(line)).max().unwrap_or(0);
        let x = ((anchor_screen.x + self.tooltip_offset_px).round() as i32)
            .min(width as i32 - widest)
            .max(0);
        for (index, line) in lines.iter().enumerate() {
            let rise = self.tooltip_line_height_px * index as f32;
            let baseline = anchor_screen.y + self.tooltip_offset_px + rise;
            let top = height as i32 - baseline.round() as i32 - TEXT_HEIGHT;
            draw_text_clipped(frame, width, height, x, top, line, TOOLTIP_TEXT_COLOR);
        }
    }
}

/// `key: value` lines for the first entity whose footprint strictly contains
/// `anchor`, in metadata order.
pub fn tooltip_lines(
    model: &dyn WorldModel,
    sprites: &SpriteRegistry,
    anchor: WorldPoint,
) -> Option<Vec<String>> {
    let entity = sprites.hit_test(model, anchor)?;
    let lines = model
        .metadata(entity)
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    Some(lines)
}

fn draw_tiles(frame: &mut [u8], width: u32, height: u32, scene: &RenderScene<'_>) {
    for (coord, _) in scene.tiles.grid().iter() {
        let Some(drawable) = scene
            .tiles
            .drawable_at(coord)
            .and_then(|id| scene.assets.drawable(id))
        else {
            continue;
        };
        let origin = scene.transformer.tile_origin_px(coord);
        let rect = drawable_frame_rect(&scene.projection, height, origin, drawable);
        blit_drawable(frame, width, height, rect, drawable, Tint::NEUTRAL);
    }
}

fn draw_hover(frame: &mut [u8], width: u32, height: u32, scene: &RenderScene<'_>) {
    let Some(cell) = scene.interaction.hovered_cell() else {
        return;
    };
    let Some(drawable) = scene
        .tiles
        .drawable_at(cell)
        .and_then(|id| scene.assets.drawable(id))
    else {
        return;
    };
    let origin = scene.transformer.tile_origin_px(cell);
    let rect = drawable_frame_rect(&scene.projection, height, origin, drawable);
    let tint = scene.interaction.hover_tint().tint();
    blit_drawable(frame, width, height, rect, drawable, tint);
}

fn draw_sprites(frame: &mut [u8], width: u32, height: u32, scene: &RenderScene<'_>) {
    for proxy in scene.sprites.iter() {
        let Some(footprint) = proxy.rect(scene.model) else {
            continue;
        };
        let origin = scene.transformer.world_to_px(footprint.origin);
        let drawable = proxy
            .current_frame()
            .and_then(|id| scene.assets.drawable(id));
        let rect = match drawable {
            Some(drawable) => {
                let rect = drawable_frame_rect(&scene.projection, height, origin, drawable);
                blit_drawable(frame, width, height, rect, drawable, Tint::NEUTRAL);
                rect
            }
            None => {
                let rect =
                    proxy_frame_rect(&scene.projection, height, origin, proxy, scene.transformer);
                draw_filled_rect(frame, width, height, rect, PLACEHOLDER_COLOR);
                rect
            }
        };
        if proxy.is_selected() {
            draw_rect_outline(frame, width, height, rect, SELECTED_OUTLINE_COLOR);
        }
    }
}

/// Frame rectangle covered by `drawable` when its bottom-left corner sits at
/// world pixel `origin`.
fn drawable_frame_rect(
    projection: &Projection,
    frame_height: u32,
    origin: Vec2,
    drawable: &Drawable,
) -> FrameRect {
    world_box_to_frame(
        projection,
        frame_height,
        origin,
        drawable.width() as f32,
        drawable.height() as f32,
    )
}

fn proxy_frame_rect(
    projection: &Projection,
    frame_height: u32,
    origin: Vec2,
    proxy: &SpriteProxy,
    transformer: &CoordinateTransformer,
) -> FrameRect {
    let (width_tiles, height_tiles) = proxy.size();
    world_box_to_frame(
        projection,
        frame_height,
        origin,
        width_tiles * transformer.tile_length(),
        height_tiles * transformer.tile_length(),
    )
}

fn world_box_to_frame(
    projection: &Projection,
    frame_height: u32,
    origin: Vec2,
    width_px: f32,
    height_px: f32,
) -> FrameRect {
    let bottom_left = projection.world_to_screen(origin);
    let top_right =
        projection.world_to_screen(Vec2::new(origin.x + width_px, origin.y + height_px));
    let frame_height = frame_height as f32;
    FrameRect {
        left: bottom_left.x.round() as i32,
        top: (frame_height - top_right.y).round() as i32,
        right: top_right.x.round() as i32,
        bottom: (frame_height - bottom_left.y).round() as i32,
    }
}

pub fn clear(frame: &mut [u8], color: [u8; 4]) {
    for pixel in frame.chunks_exact_mut(4) {
        pixel.copy_from_slice(&color);
    }
}

/// Nearest-neighbour stretch of `drawable` onto `rect`, tinted and alpha
/// blended over the frame. Pixels outside the frame are skipped.
pub fn blit_drawable(
    frame: &mut [u8],
    width: u32,
    height: u32,
    rect: FrameRect,
    drawable: &Drawable,
    tint: Tint,
) {
    let (dest_w, dest_h) = (rect.width(), rect.height());
    if dest_w <= 0 || dest_h <= 0 || drawable.width() == 0 || drawable.height() == 0 {
        return;
    }
    let draw_left = rect.left.max(0);
    let draw_top = rect.top.max(0);
    let draw_right = rect.right.min(width as i32);
    let draw_bottom = rect.bottom.min(height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let x_ratio = drawable.width() as f32 / dest_w as f32;
    let y_ratio = drawable.height() as f32 / dest_h as f32;
    for out_y in draw_top..draw_bottom {
        let src_y = (((out_y - rect.top) as f32) * y_ratio).floor() as u32;
        let src_y = src_y.min(drawable.height() - 1);
        for out_x in draw_left..draw_right {
            let src_x = (((out_x - rect.left) as f32) * x_ratio).floor() as u32;
            let src_x = src_x.min(drawable.width() - 1);
            let Some(source) = drawable.pixel(src_x, src_y) else {
                continue;
            };
            blend_pixel_clipped(frame, width as usize, out_x, out_y, tint.apply(source));
        }
    }
}

pub fn draw_filled_rect(
    frame: &mut [u8],
    width: u32,
    height: u32,
    rect: FrameRect,
    color: [u8; 4],
) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(width as i32);
    let bottom = rect.bottom.min(height as i32);
    for y in top..bottom {
        for x in left..right {
            write_pixel_rgba_clipped(frame, width as usize, x, y, color);
        }
    }
}

pub fn draw_rect_outline(
    frame: &mut [u8],
    width: u32,
    _height: u32,
    rect: FrameRect,
    color: [u8; 4],
) {
    if rect.width() <= 0 || rect.height() <= 0 {
        return;
    }
    let right = rect.right - 1;
    let bottom = rect.bottom - 1;
    for x in rect.left..=right {
        write_pixel_rgba_clipped(frame, width as usize, x, rect.top, color);
        write_pixel_rgba_clipped(frame, width as usize, x, bottom, color);
    }
    for y in rect.top..=bottom {
        write_pixel_rgba_clipped(frame, width as usize, rect.left, y, color);
        write_pixel_rgba_clipped(frame, width as usize, right, y, color);
    }
}

fn blend_pixel_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    let alpha = color[3];
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        write_pixel_rgba_clipped(frame, width, x, y, color);
        return;
    }
    let Some(range) = pixel_range(frame.len(), width, x, y) else {
        return;
    };
    let dst = &mut frame[range];
    let a = alpha as u32;
    for channel in 0..3 {
        let blended = (color[channel] as u32 * a + dst[channel] as u32 * (255 - a) + 127) / 255;
        dst[channel] = blended as u8;
    }
    dst[3] = 255;
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    let Some(range) = pixel_range(frame.len(), width, x, y) else {
        return;
    };
    frame[range].copy_from_slice(&color);
}

fn pixel_range(len: usize, width: usize, x: i32, y: i32) -> Option<std::ops::Range<usize>> {
    if x < 0 || y < 0 || x as usize >= width {
        return None;
    }
    let pixel_offset = (y as usize).checked_mul(width)?.checked_add(x as usize)?;
    let byte_offset = pixel_offset.checked_mul(4)?;
    let end = byte_offset.checked_add(4)?;
    (end <= len).then_some(byte_offset..end)
}
