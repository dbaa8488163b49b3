/// Metadata orientation and cost-control downscaling, applied before scoring.
use image::imageops::FilterType;
use tracing::debug;

use crate::error::Result;
use crate::exif_orientation::apply_orientation;
use crate::pixel_buffer::PixelBuffer;

/// Largest side the scorer works on by default.
pub const DEFAULT_MAX_DIMENSION: u32 = 500;

/// Resize `buf` to fit `bounds`, never enlarging.
///
/// If either bound exceeds the source dimension the buffer is returned as is.
/// Otherwise the target height is `bounds.1` and the width follows the
/// source aspect ratio: `floor(bounds.1 * width / height)`.
pub fn resize_within(
    buf: PixelBuffer,
    bounds: (u32, u32),
    filter: FilterType,
) -> Result<PixelBuffer> {
    let (width, height) = buf.dimensions();
    let (bound_w, bound_h) = bounds;
    if bound_w > width || bound_h > height {
        return Ok(buf);
    }

    let ratio = width as f64 / height as f64;
    let target_w = ((bound_h as f64 * ratio) as u32).max(1);
    let target_h = bound_h.max(1);
    if (target_w, target_h) == (width, height) {
        return Ok(buf);
    }

    debug!(width, height, target_w, target_h, "Downscaling");
    let resized = image::imageops::resize(&buf.to_rgba_image(), target_w, target_h, filter);
    PixelBuffer::from_rgba_image(&resized)
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    /// Downscale when either side exceeds this.
    pub max_dimension: u32,
    pub filter: FilterType,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            filter: FilterType::CatmullRom,
        }
    }
}

impl Preprocessor {
    /// Apply the metadata orientation, then downscale oversized inputs.
    ///
    /// The downscale is permanent: later stages see and return the smaller buffer.
    pub fn apply(&self, buf: PixelBuffer, orientation: Option<u32>) -> Result<PixelBuffer> {
        let buf = apply_orientation(buf, orientation);
        let (width, height) = buf.dimensions();
        if width <= self.max_dimension && height <= self.max_dimension {
            return Ok(buf);
        }
        resize_within(buf, (self.max_dimension, self.max_dimension), self.filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::Pixel;

    fn patterned(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                buf.set(x, y, Pixel::rgba(v, v / 2, 255 - v, 255)).unwrap();
            }
        }
        buf
    }

    #[test]
    fn test_never_upscales() {
        let buf = patterned(40, 30);
        let raw = buf.as_raw().to_vec();
        let out = resize_within(buf, (50, 20), FilterType::CatmullRom).unwrap();
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(out.as_raw(), &raw[..]);

        let out = resize_within(out, (100, 100), FilterType::CatmullRom).unwrap();
        assert_eq!(out.as_raw(), &raw[..]);
    }

    #[test]
    fn test_width_follows_height_and_ratio() {
        let out = resize_within(patterned(120, 80), (40, 40), FilterType::Triangle).unwrap();
        // 40 * 1.5 = 60
        assert_eq!(out.dimensions(), (60, 40));

        let out = resize_within(patterned(80, 120), (40, 40), FilterType::Triangle).unwrap();
        // 40 * 0.666.. = 26.66 -> 26
        assert_eq!(out.dimensions(), (26, 40));
    }

    #[test]
    fn test_small_input_untouched() {
        let buf = patterned(30, 20);
        let out = Preprocessor::default().apply(buf.clone(), None).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_oversized_input_is_downscaled() {
        let pre = Preprocessor {
            max_dimension: 50,
            filter: FilterType::CatmullRom,
        };
        let out = pre.apply(patterned(100, 100), None).unwrap();
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn test_one_side_oversized_but_other_below_bound() {
        // Height is below the bounding box, so the resizer refuses to touch it.
        let pre = Preprocessor {
            max_dimension: 50,
            filter: FilterType::CatmullRom,
        };
        let buf = patterned(80, 30);
        assert_eq!(pre.apply(buf.clone(), None).unwrap(), buf);
    }

    #[test]
    fn test_orientation_applied_before_downscale() {
        let pre = Preprocessor {
            max_dimension: 50,
            filter: FilterType::Triangle,
        };
        // 100x50 rotated to 50x100, then height 50 -> width 50 * 0.5 = 25
        let out = pre.apply(patterned(100, 50), Some(6)).unwrap();
        assert_eq!(out.dimensions(), (25, 50));
    }
}
