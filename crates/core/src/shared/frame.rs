use std::time::Instant;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array2, ArrayView3};

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Frames are treated as immutable once built. Resizing and mirroring
/// return new frames; only the annotator mutates its own working copy.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
    captured_at: Instant,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        Self::captured(data, width, height, channels, index, Instant::now())
    }

    pub fn captured(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        index: usize,
        captured_at: Instant,
    ) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
            captured_at,
        }
    }

    pub fn from_rgb_image(image: RgbImage, index: usize, captured_at: Instant) -> Self {
        let (width, height) = image.dimensions();
        Self::captured(image.into_raw(), width, height, 3, index, captured_at)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(self.shape(), &self.data).ok()
    }

    /// Copies the pixels into an `RgbImage`, or `None` for non-RGB frames.
    pub fn to_rgb_image(&self) -> Option<RgbImage> {
        if self.channels != 3 {
            return None;
        }
        RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    /// Horizontal flip, so a user-facing camera reads like a mirror.
    pub fn mirrored(&self) -> Frame {
        match self.to_rgb_image() {
            Some(img) => self.with_image(imageops::flip_horizontal(&img)),
            None => self.clone(),
        }
    }

    /// Scales to `target_width`, keeping the aspect ratio.
    ///
    /// Height follows the truncating rule `target_width * height / width`.
    /// A frame already at the target width is returned unchanged.
    pub fn resized_to_width(&self, target_width: u32) -> Frame {
        if self.width == target_width || self.width == 0 || target_width == 0 {
            return self.clone();
        }
        let target_height =
            ((target_width as u64 * self.height as u64) / self.width as u64).max(1) as u32;
        match self.to_rgb_image() {
            Some(img) => self.with_image(imageops::resize(
                &img,
                target_width,
                target_height,
                FilterType::Triangle,
            )),
            None => self.clone(),
        }
    }

    /// Luma plane (BT.601 weights) as `(height, width)` floats.
    pub fn to_grayscale(&self) -> Array2<f32> {
        let mut gray = Array2::<f32>::zeros((self.height as usize, self.width as usize));
        let Some(pixels) = self.as_ndarray() else {
            return gray;
        };
        for ((row, col), value) in gray.indexed_iter_mut() {
            *value = if self.channels >= 3 {
                0.299 * pixels[[row, col, 0]] as f32
                    + 0.587 * pixels[[row, col, 1]] as f32
                    + 0.114 * pixels[[row, col, 2]] as f32
            } else {
                pixels[[row, col, 0]] as f32
            };
        }
        gray
    }

    fn with_image(&self, image: RgbImage) -> Frame {
        Frame::from_rgb_image(image, self.index, self.captured_at)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
