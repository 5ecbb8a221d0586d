use crate::session::{text_extent, text_scale, GLYPH_HEIGHT, GLYPH_WIDTH};

use super::color::Rgba;
use super::raster::Canvas;

/// 3x5 glyphs for `' '..='~'`, rows top to bottom packed three bits each,
/// most significant bit is the leftmost column.
const ASCII_GLYPHS: [u16; 95] = [
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

fn glyph_rows(ch: char) -> [u8; GLYPH_HEIGHT as usize] {
    let packed = match ch {
        ' '..='~' => ASCII_GLYPHS[ch as usize - ' ' as usize],
        _ => 0,
    };
    let mut rows = [0u8; GLYPH_HEIGHT as usize];
    for (index, row) in rows.iter_mut().enumerate() {
        let shift = (GLYPH_HEIGHT as usize - 1 - index) * GLYPH_WIDTH as usize;
        *row = ((packed >> shift) & 0b111) as u8;
    }
    rows
}

/// Draws `text` with its top-left corner at `(x, y)`.
pub fn draw_text(canvas: &mut Canvas<'_>, x: f64, y: f64, text: &str, size_px: f64, color: Rgba) {
    let scale = text_scale(size_px) as i32;
    let advance = (GLYPH_WIDTH as i32 + 1) * scale;
    let origin_x = x.round() as i32;
    let origin_y = y.round() as i32;
    for (index, ch) in text.chars().enumerate() {
        let glyph_x = origin_x + index as i32 * advance;
        if glyph_x >= canvas.width() as i32 {
            break;
        }
        for (row_index, row) in glyph_rows(ch).iter().enumerate() {
            for column in 0..GLYPH_WIDTH as i32 {
                if row & (1 << (GLYPH_WIDTH as i32 - 1 - column)) == 0 {
                    continue;
                }
                canvas.fill_rect(
                    glyph_x + column * scale,
                    origin_y + row_index as i32 * scale,
                    scale,
                    scale,
                    color,
                );
            }
        }
    }
}

pub fn draw_text_centered(
    canvas: &mut Canvas<'_>,
    center_x: f64,
    y: f64,
    text: &str,
    size_px: f64,
    color: Rgba,
) {
    let (width, _) = text_extent(text, size_px);
    draw_text(canvas, center_x - width / 2.0, y, text, size_px, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba = [255, 255, 255, 255];

    #[test]
    fn glyph_rows_unpack_top_to_bottom() {
        assert_eq!(glyph_rows('1'), [0b010, 0b110, 0b010, 0b010, 0b111]);
        assert_eq!(glyph_rows(' '), [0; 5]);
        assert_eq!(glyph_rows('\u{e9}'), [0; 5]);
    }

    #[test]
    fn text_is_drawn_at_font_scale() {
        let mut frame = vec![0u8; 32 * 16 * 4];
        let mut canvas = Canvas::new(&mut frame, 32, 16);
        draw_text(&mut canvas, 0.0, 0.0, "1", 14.0, WHITE);
        // Top row of '1' is the middle column only; scale 2 doubles it.
        assert_eq!(canvas.pixel(2, 0), Some(WHITE));
        assert_eq!(canvas.pixel(3, 1), Some(WHITE));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(canvas.pixel(5, 9), Some(WHITE));
    }
}
