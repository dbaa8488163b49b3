/// Owned RGBA raster with an explicit row stride.
///
/// Transforms never mutate in place: each one returns a new, tightly packed
/// buffer so the pipeline only ever holds a single current image.
use image::{Rgba, RgbaImage};

use crate::error::{OrientError, Result};

const CHANNELS: usize = 4;

/// One RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque gray pixel.
    pub const fn gray(v: u8) -> Self {
        Self::rgba(v, v, v, 255)
    }

    /// Brightness in `[0, 1]`: `(R + G + B) / (3 * 255)`. Alpha is ignored.
    pub fn brightness(&self) -> f64 {
        self.channel_sum() as f64 / (3.0 * 255.0)
    }

    #[inline]
    pub(crate) fn channel_sum(&self) -> u32 {
        self.r as u32 + self.g as u32 + self.b as u32
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: usize,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled (transparent black) buffer with a tight stride.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OrientError::InvalidBuffer(format!(
                "dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let stride = width as usize * CHANNELS;
        Ok(Self {
            width,
            height,
            stride,
            pixels: vec![0u8; stride * height as usize],
        })
    }

    /// Wrap an existing RGBA byte buffer. Rows may be padded (`stride > width * 4`).
    pub fn from_raw(width: u32, height: u32, stride: usize, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(OrientError::InvalidBuffer(format!(
                "dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let min_stride = width as usize * CHANNELS;
        if stride < min_stride {
            return Err(OrientError::InvalidBuffer(format!(
                "stride {} is smaller than width * 4 = {}",
                stride, min_stride
            )));
        }
        let expected = stride * height as usize;
        if pixels.len() != expected {
            return Err(OrientError::InvalidBuffer(format!(
                "expected {} bytes for stride {} x height {}, got {}",
                expected,
                stride,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            pixels,
        })
    }

    pub fn from_rgba_image(img: &RgbaImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::from_raw(
            width,
            height,
            width as usize * CHANNELS,
            img.as_raw().clone(),
        )
    }

    /// Copy into an `image` buffer, dropping any row padding.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixel_unchecked(x, y);
            Rgba([p.r, p.g, p.b, p.a])
        })
    }

    /// All-zero buffer with the same dimensions and a tight stride.
    pub(crate) fn zeroed_like(&self) -> PixelBuffer {
        let stride = self.width as usize * CHANNELS;
        PixelBuffer {
            width: self.width,
            height: self.height,
            stride,
            pixels: vec![0u8; stride * self.height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row, including padding.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Pixel> {
        self.check_bounds(x, y)?;
        Ok(self.pixel_unchecked(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: Pixel) -> Result<()> {
        self.check_bounds(x, y)?;
        self.put_unchecked(x, y, pixel);
        Ok(())
    }

    /// `R + G + B` at a coordinate already known to be in range.
    #[inline]
    pub(crate) fn channel_sum_at(&self, x: u32, y: u32) -> u32 {
        self.pixel_unchecked(x, y).channel_sum()
    }

    #[inline]
    pub(crate) fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * CHANNELS
    }

    #[inline]
    pub(crate) fn pixel_unchecked(&self, x: u32, y: u32) -> Pixel {
        let i = self.offset(x, y);
        Pixel::rgba(
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        )
    }

    #[inline]
    pub(crate) fn put_unchecked(&mut self, x: u32, y: u32, pixel: Pixel) {
        let i = self.offset(x, y);
        self.pixels[i] = pixel.r;
        self.pixels[i + 1] = pixel.g;
        self.pixels[i + 2] = pixel.b;
        self.pixels[i + 3] = pixel.a;
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(OrientError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Build a tightly packed buffer where each destination pixel is read
    /// from the source coordinate returned by `source`.
    fn remap<F>(&self, width: u32, height: u32, source: F) -> PixelBuffer
    where
        F: Fn(u32, u32) -> (u32, u32),
    {
        let stride = width as usize * CHANNELS;
        let mut out = PixelBuffer {
            width,
            height,
            stride,
            pixels: vec![0u8; stride * height as usize],
        };
        for y in 0..height {
            for x in 0..width {
                let (sx, sy) = source(x, y);
                out.put_unchecked(x, y, self.pixel_unchecked(sx, sy));
            }
        }
        out
    }

    /// Rotate 90° clockwise. Width and height swap.
    pub fn rotate90(&self) -> PixelBuffer {
        let h = self.height;
        self.remap(self.height, self.width, |x, y| (y, h - 1 - x))
    }

    pub fn rotate180(&self) -> PixelBuffer {
        let (w, h) = (self.width, self.height);
        self.remap(w, h, |x, y| (w - 1 - x, h - 1 - y))
    }

    /// Rotate 270° clockwise (90° counter-clockwise).
    pub fn rotate270(&self) -> PixelBuffer {
        let w = self.width;
        self.remap(self.height, self.width, |x, y| (w - 1 - y, x))
    }

    /// Mirror row order (top becomes bottom).
    pub fn flip_vertical(&self) -> PixelBuffer {
        let (w, h) = (self.width, self.height);
        self.remap(w, h, |x, y| (x, h - 1 - y))
    }

    /// Mirror column order (left becomes right).
    pub fn flip_horizontal(&self) -> PixelBuffer {
        let (w, h) = (self.width, self.height);
        self.remap(w, h, |x, y| (w - 1 - x, y))
    }
}
