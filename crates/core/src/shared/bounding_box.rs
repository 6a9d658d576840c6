//! Canonical box representation and the geometry shared by matching,
//! tracking and drawing.
//!
//! Every box inside the pipeline is `(x1, y1, x2, y2)` corners in pixel
//! units of some reference resolution. Which resolution is a property of
//! the pipeline stage holding the box; crossing stages always goes through
//! [`BoundingBox::scaled`].

/// Axis-aligned box as top-left and bottom-right corners, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from origin + size (`[x1, y1, w, h]`).
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Builds a pixel box from normalised `[y1, x1, y2, x2]` coordinates.
    ///
    /// Each coordinate is in `[0, 1]`, relative to the height (for y) or
    /// width (for x) of the image the detection was made on.
    pub fn from_normalized_yxyx(coords: [f64; 4], image_width: u32, image_height: u32) -> Self {
        let [y1, x1, y2, x2] = coords;
        let w = image_width as f64;
        let h = image_height as f64;
        Self::new(x1 * w, y1 * h, x2 * w, y2 * h)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Euclidean distance between the two box centers.
    pub fn center_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Rescales from an image `from_width` wide to one `to_width` wide.
    ///
    /// Images are always resized with a preserved aspect ratio, so a single
    /// factor applies to both axes.
    pub fn scaled(&self, from_width: u32, to_width: u32) -> BoundingBox {
        if from_width == to_width || from_width == 0 {
            return *self;
        }
        let f = to_width as f64 / from_width as f64;
        BoundingBox::new(self.x1 * f, self.y1 * f, self.x2 * f, self.y2 * f)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Intersection with a `width` x `height` image, or `None` if empty.
    pub fn clamped(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x1 = self.x1.max(0.0);
        let y1 = self.y1.max(0.0);
        let x2 = self.x2.min(width as f64);
        let y2 = self.y2.min(height as f64);
        (x2 > x1 && y2 > y1).then(|| BoundingBox::new(x1, y1, x2, y2))
    }

    /// Integer pixel rectangle `(x, y, w, h)` for drawing and sampling.
    pub fn to_pixel_rect(&self) -> (i32, i32, u32, u32) {
        let x = self.x1.round() as i32;
        let y = self.y1.round() as i32;
        let w = self.width().round().max(0.0) as u32;
        let h = self.height().round().max(0.0) as u32;
        (x, y, w, h)
    }
}

/// Rescales a list of boxes between two image widths.
pub fn scale_boxes(boxes: &[BoundingBox], from_width: u32, to_width: u32) -> Vec<BoundingBox> {
    boxes.iter().map(|b| b.scaled(from_width, to_width)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_origin_size_converts_to_corners() {
        let b = BoundingBox::from_origin_size(10.0, 20.0, 30.0, 40.0);
        assert_eq!(b, BoundingBox::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_normalized_yxyx_swaps_axes() {
        // y1=0.1, x1=0.2, y2=0.5, x2=0.6 on a 1000x500 image
        let b = BoundingBox::from_normalized_yxyx([0.1, 0.2, 0.5, 0.6], 1000, 500);
        assert_relative_eq!(b.x1, 200.0);
        assert_relative_eq!(b.y1, 50.0);
        assert_relative_eq!(b.x2, 600.0);
        assert_relative_eq!(b.y2, 250.0);
    }

    #[test]
    fn test_center() {
        let b = BoundingBox::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(b.center(), (5.0, 10.0));
    }

    #[rstest]
    #[case::same_box(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.0)]
    #[case::shifted_diagonal(BoundingBox::new(1.0, 1.0, 11.0, 11.0), 2f64.sqrt())]
    #[case::shifted_x(BoundingBox::new(3.0, 0.0, 13.0, 10.0), 3.0)]
    fn test_center_distance(#[case] other: BoundingBox, #[case] expected: f64) {
        let base = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert_relative_eq!(base.center_distance(&other), expected);
    }

    #[test]
    fn test_scaled_down_and_back() {
        let b = BoundingBox::new(100.0, 200.0, 300.0, 400.0);
        let small = b.scaled(1024, 256);
        assert_eq!(small, BoundingBox::new(25.0, 50.0, 75.0, 100.0));
        assert_eq!(small.scaled(256, 1024), b);
    }

    #[test]
    fn test_scaled_same_width_is_identity() {
        let b = BoundingBox::new(1.5, 2.5, 3.5, 4.5);
        assert_eq!(b.scaled(640, 640), b);
    }

    #[test]
    fn test_scale_boxes_applies_to_all() {
        let boxes = vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(10.0, 10.0, 20.0, 20.0),
        ];
        let scaled = scale_boxes(&boxes, 100, 200);
        assert_eq!(scaled[1], BoundingBox::new(20.0, 20.0, 40.0, 40.0));
    }

    #[test]
    fn test_clamped_inside_unchanged() {
        let b = BoundingBox::new(1.0, 1.0, 5.0, 5.0);
        assert_eq!(b.clamped(10, 10), Some(b));
    }

    #[test]
    fn test_clamped_partially_outside() {
        let b = BoundingBox::new(-5.0, 2.0, 5.0, 15.0);
        assert_eq!(b.clamped(10, 10), Some(BoundingBox::new(0.0, 2.0, 5.0, 10.0)));
    }

    #[test]
    fn test_clamped_fully_outside() {
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert!(b.clamped(10, 10).is_none());
    }

    #[test]
    fn test_to_pixel_rect_rounds() {
        let b = BoundingBox::new(1.4, 2.6, 11.4, 12.6);
        assert_eq!(b.to_pixel_rect(), (1, 3, 10, 10));
    }
}
