//! Tiny 3x5 bitmap font for tooltips.

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;
pub const TEXT_SCALE: i32 = 2;
pub const GLYPH_ADVANCE: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;
pub const TEXT_HEIGHT: i32 = GLYPH_HEIGHT * TEXT_SCALE;

const FIRST_PRINTABLE: u32 = 0x20;
const FALLBACK_CHAR: char = '?';

// Printable ASCII from ' ' to '~'. Each glyph packs five 3-bit rows, top row
// in the highest bits.
#[rustfmt::skip]
const GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

fn glyph_for(ch: char) -> Option<u16> {
    let index = (ch as u32).checked_sub(FIRST_PRINTABLE)?;
    GLYPHS.get(index as usize).copied()
}

fn glyph_row(glyph: u16, row: i32) -> u16 {
    (glyph >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111
}

/// Pixel width of `text` when drawn with [`draw_text_clipped`].
pub fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE
}

/// Draws `text` with its top-left corner at frame pixel `(x, y)`. Characters
/// outside printable ASCII render as `?`.
pub fn draw_text_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    mut x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    let fallback = glyph_for(FALLBACK_CHAR).unwrap_or_default();
    for ch in text.chars() {
        let glyph = glyph_for(ch).unwrap_or(fallback);
        draw_glyph_clipped(frame, width, height, x, y, glyph, color);
        x += GLYPH_ADVANCE;
    }
}

fn draw_glyph_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    glyph: u16,
    color: [u8; 4],
) {
    if width == 0 || height == 0 || glyph == 0 {
        return;
    }
    let width_i32 = width as i32;
    let height_i32 = height as i32;

    for row in 0..GLYPH_HEIGHT {
        let bits = glyph_row(glyph, row);
        let glyph_y = y + row * TEXT_SCALE;
        for col in 0..GLYPH_WIDTH {
            if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                continue;
            }
            let glyph_x = x + col * TEXT_SCALE;
            for sy in 0..TEXT_SCALE {
                let pixel_y = glyph_y + sy;
                if pixel_y < 0 || pixel_y >= height_i32 {
                    continue;
                }
                for sx in 0..TEXT_SCALE {
                    let pixel_x = glyph_x + sx;
                    if pixel_x < 0 || pixel_x >= width_i32 {
                        continue;
                    }
                    let offset = (pixel_y as usize * width as usize + pixel_x as usize) * 4;
                    if let Some(pixel) = frame.get_mut(offset..offset + 4) {
                        pixel.copy_from_slice(&color);
                    }
                }
            }
        }
    }
}
