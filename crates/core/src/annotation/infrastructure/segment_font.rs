//! Seven-segment digits drawn from filled rectangles.
//!
//! Labels only ever hold ages, so a digit font is enough and no font file
//! has to ship with the binary.
//!
//! Glyph cell, in units of `scale` pixels (5 wide, 9 tall):
//!
//! ```text
//!  aaaaa
//!  f   b
//!  f   b
//!  f   b
//!  ggggg
//!  e   c
//!  e   c
//!  e   c
//!  ddddd
//! ```
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const GLYPH_WIDTH: u32 = 5;
pub const GLYPH_HEIGHT: u32 = 9;
/// Gap between neighbouring glyphs.
pub const GLYPH_SPACING: u32 = 2;

const A: u8 = 1 << 0;
const B: u8 = 1 << 1;
const C: u8 = 1 << 2;
const D: u8 = 1 << 3;
const E: u8 = 1 << 4;
const F: u8 = 1 << 5;
const G: u8 = 1 << 6;

/// Segment rectangles `(bit, x, y, w, h)` in glyph units.
const SEGMENTS: [(u8, u32, u32, u32, u32); 7] = [
    (A, 0, 0, 5, 1),
    (B, 4, 0, 1, 5),
    (C, 4, 4, 1, 5),
    (D, 0, 8, 5, 1),
    (E, 0, 4, 1, 5),
    (F, 0, 0, 1, 5),
    (G, 0, 4, 5, 1),
];

fn segments_for(c: char) -> u8 {
    match c {
        '0' => A | B | C | D | E | F,
        '1' => B | C,
        '2' => A | B | G | E | D,
        '3' => A | B | G | C | D,
        '4' => F | G | B | C,
        '5' => A | F | G | C | D,
        '6' => A | F | G | E | C | D,
        '7' => A | B | C,
        '8' => A | B | C | D | E | F | G,
        '9' => A | B | C | D | F | G,
        '-' => G,
        _ => 0,
    }
}

/// Pixel size of `text` rendered at `scale`.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    if n == 0 {
        return (0, 0);
    }
    let width = (n * GLYPH_WIDTH + (n - 1) * GLYPH_SPACING) * scale;
    (width, GLYPH_HEIGHT * scale)
}

/// Draws `text` with its top-left corner at `(x, y)`. Unknown characters
/// render as blanks. Pixels outside the image are clipped.
pub fn draw_text_mut(image: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    if scale == 0 {
        return;
    }
    let advance = ((GLYPH_WIDTH + GLYPH_SPACING) * scale) as i32;
    for (i, c) in text.chars().enumerate() {
        let gx = x + i as i32 * advance;
        let lit = segments_for(c);
        for &(bit, sx, sy, sw, sh) in &SEGMENTS {
            if lit & bit == 0 {
                continue;
            }
            let rect = Rect::at(gx + (sx * scale) as i32, y + (sy * scale) as i32)
                .of_size(sw * scale, sh * scale);
            draw_filled_rect_mut(image, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    #[rstest]
    #[case::empty("", 1, (0, 0))]
    #[case::one_digit("7", 1, (5, 9))]
    #[case::two_digits("41", 2, (24, 18))]
    fn test_text_size(#[case] text: &str, #[case] scale: u32, #[case] expected: (u32, u32)) {
        assert_eq!(text_size(text, scale), expected);
    }

    #[test]
    fn test_one_lights_right_column_only() {
        let mut img = RgbImage::from_pixel(10, 12, BLACK);
        draw_text_mut(&mut img, "1", 1, 1, 1, WHITE);
        assert_eq!(*img.get_pixel(5, 2), WHITE);
        assert_eq!(*img.get_pixel(5, 8), WHITE);
        assert_eq!(*img.get_pixel(1, 2), BLACK);
        assert_eq!(*img.get_pixel(3, 1), BLACK);
    }

    #[test]
    fn test_eight_fills_every_segment() {
        let mut img = RgbImage::from_pixel(5, 9, BLACK);
        draw_text_mut(&mut img, "8", 0, 0, 1, WHITE);
        // Only the two 3x3 counters stay dark.
        let dark = img.pixels().filter(|p| **p == BLACK).count();
        assert_eq!(dark, 2 * 3 * 3);
    }

    #[test]
    fn test_clips_at_image_edge() {
        let mut img = RgbImage::from_pixel(4, 4, BLACK);
        draw_text_mut(&mut img, "88", -1, -1, 2, WHITE);
        assert_eq!(*img.get_pixel(2, 0), WHITE);
        assert!(img.pixels().any(|p| *p == WHITE));
    }

    #[test]
    fn test_unknown_characters_are_blank() {
        let mut img = RgbImage::from_pixel(8, 10, BLACK);
        draw_text_mut(&mut img, "x", 0, 0, 1, WHITE);
        assert!(img.pixels().all(|p| *p == BLACK));
    }
}
