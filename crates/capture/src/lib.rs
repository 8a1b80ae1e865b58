#![warn(missing_docs)]
//! Still-image capture: frame containers, PNG encoding and data-URI
//! packaging, plus GPU readback for hosts that render with wgpu.

mod readback;

pub use readback::{record_texture_readback, TextureReadback};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use thiserror::Error;

/// Errors produced while encoding captures.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// PNG encoding failed.
    #[error("failed to encode capture png: {0}")]
    Encode(#[from] image::ImageError),
    /// The pixel buffer does not match the stated dimensions.
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize {
        /// Bytes required by width × height × 4.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },
    /// GPU readback failed.
    #[error("texture readback failed: {0}")]
    Readback(String),
}

/// A rendered frame: tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 bytes, `width * height * 4` long.
    pub rgba: Vec<u8>,
}

impl Frame {
    /// Create a frame from existing pixels.
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// An all-transparent frame; what captures yield before the first
    /// render pass completes.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; (width * height * 4) as usize],
        }
    }

    fn check(&self) -> Result<(), CaptureError> {
        let expected = (self.width * self.height * 4) as usize;
        if self.rgba.len() != expected {
            return Err(CaptureError::BufferSize {
                expected,
                actual: self.rgba.len(),
            });
        }
        Ok(())
    }
}

/// Encode a frame as PNG bytes.
pub fn encode_png(frame: &Frame) -> Result<Vec<u8>, CaptureError> {
    frame.check()?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter);
    encoder.write_image(
        &frame.rgba,
        frame.width,
        frame.height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// Encode a frame as a `data:image/png;base64,...` URI, the payload of
/// the SCREENSHOT_RESULT message.
pub fn png_data_uri(frame: &Frame) -> Result<String, CaptureError> {
    let png = encode_png(frame)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_round_trips_through_image_decode() {
        let frame = Frame::new(
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255,
            ],
        );
        let png = encode_png(&frame).expect("encode png");
        let decoded = image::load_from_memory(&png).expect("decode image").to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.as_raw(), &frame.rgba);
    }

    #[test]
    fn data_uri_has_png_prefix_and_valid_base64() {
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine;

        let frame = Frame::blank(4, 4);
        let uri = png_data_uri(&frame).expect("encode uri");
        let payload = uri
            .strip_prefix("data:image/png;base64,")
            .expect("uri prefix");
        let png = STANDARD.decode(payload).expect("valid base64");
        let decoded = image::load_from_memory(&png).expect("decode image").to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 4));
        assert!(decoded.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        let frame = Frame::new(4, 4, vec![0; 7]);
        assert!(matches!(
            encode_png(&frame),
            Err(CaptureError::BufferSize { .. })
        ));
    }
}
