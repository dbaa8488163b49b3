/// Decode/encode between compressed image bytes and `PixelBuffer`.
use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::error::{OrientError, Result};
use crate::pixel_buffer::PixelBuffer;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Output encoding for oriented images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Alpha is dropped.
    Jpeg { quality: u8 },
    Png,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::default()),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg { .. } => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// Decode any format the `image` crate understands into an RGBA buffer.
///
/// Zero-length input yields a 1x1 transparent black buffer instead of an error.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer> {
    if bytes.is_empty() {
        return PixelBuffer::new(1, 1);
    }
    let img = image::load_from_memory(bytes).map_err(OrientError::Decode)?;
    PixelBuffer::from_rgba_image(&img.to_rgba8())
}

pub fn encode(buf: &PixelBuffer, format: OutputFormat) -> Result<Vec<u8>> {
    let img = DynamicImage::ImageRgba8(buf.to_rgba_image());
    let mut output = Vec::new();

    match format {
        OutputFormat::Jpeg { quality } => {
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100))
                .encode_image(&rgb)
                .map_err(OrientError::Encode)?;
        }
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
                .map_err(OrientError::Encode)?;
        }
    }

    Ok(output)
}
