use std::io::Cursor;
use std::time::Instant;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageError};

use crate::shared::frame::Frame;

/// Decodes any format the `image` crate recognises into an RGB frame.
pub fn decode_image(bytes: &[u8], index: usize, captured_at: Instant) -> Result<Frame, ImageError> {
    let img = image::load_from_memory(bytes)?.to_rgb8();
    Ok(Frame::from_rgb_image(img, index, captured_at))
}

/// Encodes a frame as JPEG in memory.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, ImageError> {
    let color = match frame.channels() {
        1 => ExtendedColorType::L8,
        4 => ExtendedColorType::Rgba8,
        _ => ExtendedColorType::Rgb8,
    };
    let mut out = Cursor::new(Vec::new());
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder.encode(frame.data(), frame.width(), frame.height(), color)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb.repeat((width * height) as usize);
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_encode_produces_jpeg_magic() {
        let jpeg = encode_jpeg(&solid(16, 8, [10, 200, 30]), 95).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_decode_restores_dimensions_and_color() {
        let jpeg = encode_jpeg(&solid(16, 8, [200, 200, 200]), 95).unwrap();
        let frame = decode_image(&jpeg, 3, Instant::now()).unwrap();
        assert_eq!((frame.width(), frame.height(), frame.channels()), (16, 8, 3));
        assert_eq!(frame.index(), 3);
        assert!((frame.data()[0] as i32 - 200).abs() <= 3);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_image(b"not an image", 0, Instant::now()).is_err());
    }
}
