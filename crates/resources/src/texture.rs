//! Image pixel loading.
//!
//! Decodes image files into tightly packed RGBA8 pixel buffers ready for
//! the GPU texture upload path. Decoding failures surface as errors; no
//! partially decoded buffer is returned.

use std::path::Path;

use tracing::info;

use crate::error::{ResourceError, ResourceResult};

/// Decoded image pixels: tightly packed RGBA, 8 bits per channel.
#[derive(Debug, Clone)]
pub struct PixelData {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes, row-major from the top-left.
    pub pixels: Vec<u8>,
}

impl PixelData {
    /// Wraps a raw RGBA byte buffer, validating its length against the
    /// stated dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::PixelSizeMismatch`] when the byte length
    /// is not `width * height * 4`.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> ResourceResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ResourceError::PixelSizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Total byte length of the pixel buffer.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

/// Decodes an in-memory image (PNG/JPEG) into RGBA8 pixels.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn decode_pixels(bytes: &[u8]) -> ResourceResult<PixelData> {
    let image = image::load_from_memory(bytes)?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();

    PixelData::from_rgba8(width, height, rgba.into_raw())
}

/// Loads and decodes an image file into RGBA8 pixels.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable, or not a
/// decodable image.
pub fn load_pixels(path: &Path) -> ResourceResult<PixelData> {
    if !path.exists() {
        return Err(ResourceError::FileNotFound(path.to_path_buf()));
    }

    let bytes = std::fs::read(path)?;
    let data = decode_pixels(&bytes)?;

    info!(
        "Loaded {}: {}x{} RGBA",
        path.display(),
        data.width,
        data.height
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_rgba8_accepts_matching_length() {
        let data = PixelData::from_rgba8(2, 2, vec![0u8; 16]).unwrap();
        assert_eq!(data.width, 2);
        assert_eq!(data.height, 2);
        assert_eq!(data.byte_len(), 16);
    }

    #[test]
    fn test_from_rgba8_rejects_wrong_length() {
        match PixelData::from_rgba8(2, 2, vec![0u8; 12]) {
            Err(ResourceError::PixelSizeMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 16);
                assert_eq!(actual, 12);
            }
            other => panic!("expected PixelSizeMismatch, got {:?}", other.map(|d| d.byte_len())),
        }
    }

    #[test]
    fn test_decode_round_trips_png() {
        // Encode a tiny image in memory, then decode it back
        let mut source = image::RgbaImage::new(2, 2);
        source.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        source.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        source.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        source.put_pixel(1, 1, image::Rgba([255, 255, 255, 255]));

        let mut encoded = Vec::new();
        source
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_pixels(&encoded).unwrap();
        assert_eq!(decoded.width, 2);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.byte_len(), 16);
        assert_eq!(&decoded.pixels[0..4], &[255, 0, 0, 255]);
        assert_eq!(&decoded.pixels[12..16], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        match decode_pixels(b"definitely not an image") {
            Err(ResourceError::Image(_)) => {}
            other => panic!("expected Image error, got {:?}", other.map(|d| d.byte_len())),
        }
    }

    #[test]
    fn test_missing_file_is_rejected() {
        match load_pixels(Path::new("no/such/texture.png")) {
            Err(ResourceError::FileNotFound(_)) => {}
            other => panic!("expected FileNotFound, got {:?}", other.map(|d| d.byte_len())),
        }
    }
}
