use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use super::segment_font::{draw_text_mut, text_size};
use crate::annotation::domain::frame_annotator::{FaceLabel, FrameAnnotator};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

pub const DEFAULT_BOX_THICKNESS: u32 = 2;
pub const DEFAULT_TEXT_SCALE: u32 = 3;

const LABEL_PADDING: u32 = 2;
const LABEL_BACKGROUND: Rgb<u8> = Rgb([255, 0, 0]);
const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Draws each face as a hollow rectangle with its label on a filled tab
/// sitting just above the top-left corner, or pinned to the top row when
/// there is no room above.
pub struct BoxAnnotator {
    thickness: u32,
    text_scale: u32,
}

impl BoxAnnotator {
    pub fn new(thickness: u32, text_scale: u32) -> Self {
        Self {
            thickness: thickness.max(1),
            text_scale: text_scale.max(1),
        }
    }

    fn draw_box(&self, image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
        let (x, y, w, h) = bbox.to_pixel_rect();
        for i in 0..self.thickness {
            let (iw, ih) = (w.saturating_sub(2 * i), h.saturating_sub(2 * i));
            if iw == 0 || ih == 0 {
                break;
            }
            let rect = Rect::at(x + i as i32, y + i as i32).of_size(iw, ih);
            draw_hollow_rect_mut(image, rect, color);
        }
    }

    fn draw_label(&self, image: &mut RgbImage, bbox: &BoundingBox, text: &str) {
        let (tw, th) = text_size(text, self.text_scale);
        if tw == 0 {
            return;
        }
        let (x, y, _, _) = bbox.to_pixel_rect();
        // Boxes touching the top edge keep their tab inside the frame.
        let top = (y - (th + 2 * LABEL_PADDING) as i32).max(0);
        let background =
            Rect::at(x, top).of_size(tw + 2 * LABEL_PADDING, th + 2 * LABEL_PADDING);
        draw_filled_rect_mut(image, background, LABEL_BACKGROUND);
        draw_text_mut(
            image,
            text,
            x + LABEL_PADDING as i32,
            top + LABEL_PADDING as i32,
            self.text_scale,
            LABEL_TEXT,
        );
    }
}

impl Default for BoxAnnotator {
    fn default() -> Self {
        Self::new(DEFAULT_BOX_THICKNESS, DEFAULT_TEXT_SCALE)
    }
}

impl FrameAnnotator for BoxAnnotator {
    fn annotate(
        &self,
        frame: &mut Frame,
        labels: &[FaceLabel],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if labels.is_empty() {
            return Ok(());
        }
        let mut image = frame
            .to_rgb_image()
            .ok_or_else(|| format!("cannot annotate a {}-channel frame", frame.channels()))?;

        for label in labels {
            self.draw_box(&mut image, &label.bbox, to_rgb(label.color));
            self.draw_label(&mut image, &label.bbox, &label.text);
        }

        *frame = Frame::from_rgb_image(image, frame.index(), frame.captured_at());
        Ok(())
    }
}

fn to_rgb(color: [f64; 3]) -> Rgb<u8> {
    Rgb(color.map(|c| c.round().clamp(0.0, 255.0) as u8))
}
