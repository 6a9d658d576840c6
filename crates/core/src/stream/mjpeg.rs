//! `multipart/x-mixed-replace` framing understood by browsers as MJPEG.
use std::io::{self, Write};

use image::ImageError;

use crate::shared::frame::Frame;
use crate::shared::image_codec::encode_jpeg;

pub const MULTIPART_BOUNDARY: &str = "frame";

/// Response content type matching the part framing below.
pub const MJPEG_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const PART_HEADER: &[u8] = b"--frame\r\nContent-Type: image/jpeg\r\n\r\n";
const PART_TRAILER: &[u8] = b"\r\n";

/// Wraps one JPEG image as a multipart part.
pub fn multipart_part(jpeg: &[u8]) -> Vec<u8> {
    let mut part = Vec::with_capacity(PART_HEADER.len() + jpeg.len() + PART_TRAILER.len());
    part.extend_from_slice(PART_HEADER);
    part.extend_from_slice(jpeg);
    part.extend_from_slice(PART_TRAILER);
    part
}

/// JPEG-encodes `frame` and wraps it as a multipart part.
pub fn encode_part(frame: &Frame, quality: u8) -> Result<Vec<u8>, ImageError> {
    Ok(multipart_part(&encode_jpeg(frame, quality)?))
}

/// Writes parts to any byte sink, flushing after each so a browser sees
/// every frame as soon as it is produced.
pub struct MjpegWriter<W: Write> {
    inner: W,
    parts: usize,
}

impl<W: Write> MjpegWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, parts: 0 }
    }

    pub fn write_part(&mut self, part: &[u8]) -> io::Result<()> {
        self.inner.write_all(part)?;
        self.inner.flush()?;
        self.parts += 1;
        Ok(())
    }

    pub fn parts_written(&self) -> usize {
        self.parts
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_framing_is_exact() {
        let part = multipart_part(b"JPEGDATA");
        assert_eq!(
            part,
            b"--frame\r\nContent-Type: image/jpeg\r\n\r\nJPEGDATA\r\n".to_vec()
        );
    }

    #[test]
    fn test_content_type_names_boundary() {
        assert!(MJPEG_CONTENT_TYPE.ends_with(&format!("boundary={MULTIPART_BOUNDARY}")));
    }

    #[test]
    fn test_encode_part_wraps_jpeg() {
        let frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, 0);
        let part = encode_part(&frame, 95).unwrap();
        assert!(part.starts_with(PART_HEADER));
        assert_eq!(&part[PART_HEADER.len()..PART_HEADER.len() + 2], &[0xFF, 0xD8]);
        assert!(part.ends_with(b"\xFF\xD9\r\n"));
    }

    #[test]
    fn test_writer_appends_parts_in_order() {
        let mut writer = MjpegWriter::new(Vec::new());
        writer.write_part(&multipart_part(b"A")).unwrap();
        writer.write_part(&multipart_part(b"B")).unwrap();
        assert_eq!(writer.parts_written(), 2);

        let bytes = writer.into_inner();
        let expected = [multipart_part(b"A"), multipart_part(b"B")].concat();
        assert_eq!(bytes, expected);
    }
}
