/// Laplacian edge detection producing the "noise map" used by the grid profiles.
///
/// Kernel:
/// ```text
/// -1  -1  -1
/// -1   8  -1
/// -1  -1  -1
/// ```
/// Only pixels whose full 3x3 neighborhood lies inside the buffer are
/// computed. The 1-pixel border of the output stays all-zero (alpha included).
use crate::pixel_buffer::{Pixel, PixelBuffer};

const LAPLACIAN: [[f64; 3]; 3] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 8.0, -1.0],
    [-1.0, -1.0, -1.0],
];

/// Luma weights in single precision, applied per channel name.
const LUMA_B: f32 = 0.11;
const LUMA_G: f32 = 0.59;
const LUMA_R: f32 = 0.30;

/// Convolution parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeParams {
    /// Multiplier applied to each channel's kernel sum.
    pub factor: f64,
    /// Offset added after `factor`.
    pub bias: i32,
    /// Collapse RGB to luma before convolving.
    pub grayscale: bool,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            factor: 1.0,
            bias: 0,
            grayscale: true,
        }
    }
}

/// Luma of a pixel: `0.11*B + 0.59*G + 0.30*R`, truncated into a byte.
#[inline]
pub fn luma(p: Pixel) -> u8 {
    let v = (p.b as f32 * LUMA_B) as f64
        + (p.g as f32 * LUMA_G) as f64
        + (p.r as f32 * LUMA_R) as f64;
    v.clamp(0.0, 255.0) as u8
}

/// Copy of `buf` where every pixel's RGB is replaced by its luma and alpha is 255.
pub fn grayscale_copy(buf: &PixelBuffer) -> PixelBuffer {
    let mut gray = buf.clone();
    for y in 0..buf.height() {
        for x in 0..buf.width() {
            let v = luma(buf.pixel_unchecked(x, y));
            gray.put_unchecked(x, y, Pixel::gray(v));
        }
    }
    gray
}

/// Apply the Laplacian kernel to a copy of `buf` and return the edge-magnitude map.
///
/// Each channel is convolved independently, scaled by `factor`, offset by
/// `bias`, and clamped to 0-255. Buffers narrower or shorter than 3 pixels
/// yield an all-zero map.
pub fn laplacian(buf: &PixelBuffer, params: &EdgeParams) -> PixelBuffer {
    let gray;
    let src = if params.grayscale {
        gray = grayscale_copy(buf);
        &gray
    } else {
        buf
    };

    let w = src.width();
    let h = src.height();
    let mut out = src.zeroed_like();

    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let mut r = 0.0;
            let mut g = 0.0;
            let mut b = 0.0;

            for (ky, row) in LAPLACIAN.iter().enumerate() {
                for (kx, &k) in row.iter().enumerate() {
                    let p = src.pixel_unchecked(x + kx as u32 - 1, y + ky as u32 - 1);
                    r += p.r as f64 * k;
                    g += p.g as f64 * k;
                    b += p.b as f64 * k;
                }
            }

            out.put_unchecked(
                x,
                y,
                Pixel::rgba(
                    scale_clamp(r, params),
                    scale_clamp(g, params),
                    scale_clamp(b, params),
                    255,
                ),
            );
        }
    }

    out
}

#[inline]
fn scale_clamp(sum: f64, params: &EdgeParams) -> u8 {
    (params.factor * sum + params.bias as f64).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: u32, height: u32, pixel: Pixel) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.set(x, y, pixel).unwrap();
            }
        }
        buf
    }

    fn is_border(buf: &PixelBuffer, x: u32, y: u32) -> bool {
        x == 0 || y == 0 || x == buf.width() - 1 || y == buf.height() - 1
    }

    #[test]
    fn test_luma_weights_follow_channel_names() {
        assert_eq!(luma(Pixel::rgba(0, 0, 0, 255)), 0);
        assert_eq!(luma(Pixel::rgba(100, 0, 0, 255)), 30);
        assert_eq!(luma(Pixel::rgba(0, 0, 100, 255)), 11);
        // 3.3 + 11.8 + 3.0 = 18.1
        assert_eq!(luma(Pixel::rgba(10, 20, 30, 255)), 18);
        // 124.5 truncates, never rounds up
        assert_eq!(luma(Pixel::rgba(200, 100, 50, 255)), 124);
        // Single-precision products sum to just under 255
        assert_eq!(luma(Pixel::rgba(255, 255, 255, 255)), 254);
        // Red is weighted heavier than blue
        assert!(luma(Pixel::rgba(200, 0, 0, 255)) > luma(Pixel::rgba(0, 0, 200, 255)));
    }

    #[test]
    fn test_grayscale_copy_forces_alpha() {
        let buf = filled(2, 2, Pixel::rgba(10, 20, 30, 7));
        let gray = grayscale_copy(&buf);
        let p = gray.get(1, 1).unwrap();
        assert_eq!(p.r, p.g);
        assert_eq!(p.g, p.b);
        assert_eq!(p.a, 255);
    }

    #[test]
    fn test_uniform_no_edges() {
        let noise = laplacian(&filled(6, 5, Pixel::gray(128)), &EdgeParams::default());
        assert!(noise.as_raw().iter().enumerate().all(|(i, &v)| {
            // interior alpha is 255, everything else is zero
            i % 4 == 3 || v == 0
        }));
    }

    #[test]
    fn test_border_is_exactly_zero() {
        let mut buf = PixelBuffer::new(7, 5).unwrap();
        for y in 0..5 {
            for x in 0..7 {
                let v = ((x * 37 + y * 91) % 256) as u8;
                buf.set(x, y, Pixel::rgba(v, 255 - v, v / 2, 255)).unwrap();
            }
        }
        let noise = laplacian(&buf, &EdgeParams::default());
        assert_eq!(noise.dimensions(), (7, 5));
        for y in 0..5 {
            for x in 0..7 {
                let p = noise.get(x, y).unwrap();
                if is_border(&noise, x, y) {
                    assert_eq!(p, Pixel::default(), "border pixel ({}, {})", x, y);
                } else {
                    assert_eq!(p.a, 255);
                }
            }
        }
    }

    #[test]
    fn test_isolated_bright_pixel() {
        let mut buf = filled(5, 5, Pixel::gray(0));
        buf.set(2, 2, Pixel::gray(255)).unwrap();
        let noise = laplacian(&buf, &EdgeParams::default());
        // 8 * ~255 clamps to 255 at the center
        assert_eq!(noise.get(2, 2).unwrap(), Pixel::gray(255));
        // Neighbors see a negative sum and clamp to 0
        assert_eq!(noise.get(1, 2).unwrap(), Pixel::rgba(0, 0, 0, 255));
        assert_eq!(noise.get(3, 3).unwrap(), Pixel::rgba(0, 0, 0, 255));
    }

    #[test]
    fn test_too_small_for_kernel() {
        for (w, h) in [(1, 1), (2, 2), (2, 9), (9, 2)] {
            let noise = laplacian(&filled(w, h, Pixel::gray(200)), &EdgeParams::default());
            assert!(noise.as_raw().iter().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_bias_and_factor() {
        let params = EdgeParams {
            factor: 2.0,
            bias: 10,
            grayscale: true,
        };
        let noise = laplacian(&filled(3, 3, Pixel::gray(50)), &params);
        // Kernel sums to zero on a flat image, leaving only the bias
        assert_eq!(noise.get(1, 1).unwrap(), Pixel::gray(10));
    }

    #[test]
    fn test_color_channels_independent_without_grayscale() {
        let mut buf = filled(3, 3, Pixel::rgba(0, 0, 0, 255));
        buf.set(1, 1, Pixel::rgba(20, 0, 0, 255)).unwrap();
        let params = EdgeParams {
            grayscale: false,
            ..EdgeParams::default()
        };
        let noise = laplacian(&buf, &params);
        assert_eq!(noise.get(1, 1).unwrap(), Pixel::rgba(160, 0, 0, 255));
    }
}
