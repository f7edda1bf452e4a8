use tileview::view::{NetworkLinks, TileVisual};
use tileview::{AtlasError, Direction, Drawable, SpriteAtlas, Terrain};

use super::world::WORKER_SPRITE_KEY;

const WORKER_FRAMES: u32 = 4;
const ROAD_COLOR: [u8; 4] = [120, 112, 104, 255];
const ROAD_EDGE_COLOR: [u8; 4] = [84, 78, 72, 255];
const WORKER_BODY: [u8; 4] = [236, 180, 64, 255];
const WORKER_HEAD: [u8; 4] = [250, 222, 190, 255];

/// Flat-colour stand-ins for every tile variant plus an animated worker, used
/// when no sprite directory is available.
pub(crate) fn procedural_atlas(tile_px: u32) -> Result<SpriteAtlas, AtlasError> {
    let tile_px = tile_px.max(4);
    let mut atlas = SpriteAtlas::new();
    for visual in TileVisual::all() {
        let Some(key) = visual.sprite_key() else {
            continue;
        };
        let drawable = match visual {
            TileVisual::Ground(terrain) => Drawable::solid(tile_px, tile_px, ground_color(terrain)),
            TileVisual::Network(links) => road_tile(tile_px, links),
            TileVisual::Unset => continue,
        };
        atlas.insert(&key, drawable)?;
    }
    for frame in 0..WORKER_FRAMES {
        atlas.insert(
            &format!("{WORKER_SPRITE_KEY}/{frame}"),
            worker_frame(tile_px, frame),
        )?;
    }
    Ok(atlas)
}

fn ground_color(terrain: Terrain) -> [u8; 4] {
    match terrain {
        Terrain::Grass => [76, 140, 72, 255],
        Terrain::Dirt => [130, 96, 64, 255],
        Terrain::Sand => [214, 196, 140, 255],
        Terrain::Water => [52, 96, 168, 255],
        Terrain::None => [0, 0, 0, 0],
    }
}

fn road_tile(size: u32, links: NetworkLinks) -> Drawable {
    let mut drawable = Drawable::solid(size, size, ground_color(Terrain::Grass));
    let quarter = size / 4;
    let (low, high) = (quarter, size - quarter);
    fill(&mut drawable, low, low, high, high, ROAD_COLOR);

    // Rows run top to bottom, so north is the low-y band.
    for direction in Direction::ALL {
        if !links.contains(direction) {
            continue;
        }
        match direction {
            Direction::North => fill(&mut drawable, low, 0, high, low, ROAD_COLOR),
            Direction::South => fill(&mut drawable, low, high, high, size, ROAD_COLOR),
            Direction::West => fill(&mut drawable, 0, low, low, high, ROAD_COLOR),
            Direction::East => fill(&mut drawable, high, low, size, high, ROAD_COLOR),
        }
    }
    if links.count() == 0 {
        outline(&mut drawable, low, low, high, high, ROAD_EDGE_COLOR);
    }
    drawable
}

fn worker_frame(size: u32, frame: u32) -> Drawable {
    let mut drawable = Drawable::solid(size, size, [0, 0, 0, 0]);
    let bob = frame % 2;
    let third = size / 3;
    let body_top = size / 2 - bob;
    fill(&mut drawable, third, body_top, size - third, size - 2, WORKER_BODY);
    let head = (size / 5).max(1);
    let head_left = size / 2 - head / 2;
    let head_top = body_top.saturating_sub(head + 1);
    fill(
        &mut drawable,
        head_left,
        head_top,
        head_left + head,
        head_top + head,
        WORKER_HEAD,
    );
    // Alternate legs.
    let leg_x = if frame < 2 { third } else { size - third - 1 };
    fill(&mut drawable, leg_x, size - 2, leg_x + 1, size, WORKER_BODY);
    drawable
}

fn fill(drawable: &mut Drawable, left: u32, top: u32, right: u32, bottom: u32, color: [u8; 4]) {
    for y in top..bottom {
        for x in left..right {
            drawable.set_pixel(x, y, color);
        }
    }
}

fn outline(drawable: &mut Drawable, left: u32, top: u32, right: u32, bottom: u32, color: [u8; 4]) {
    if right <= left || bottom <= top {
        return;
    }
    for x in left..right {
        drawable.set_pixel(x, top, color);
        drawable.set_pixel(x, bottom - 1, color);
    }
    for y in top..bottom {
        drawable.set_pixel(left, y, color);
        drawable.set_pixel(right - 1, y, color);
    }
}
