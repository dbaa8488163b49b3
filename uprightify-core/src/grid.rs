/// 3x3 grid aggregation of brightness and edge "noise".
///
/// Cells are `floor(width / 3)` by `floor(height / 3)` pixels, indexed
/// row-major with cell 0 at the top-left. Remainder pixels on the right and
/// bottom edges belong to no cell.
use crate::edge_detect::{laplacian, EdgeParams};
use crate::pixel_buffer::PixelBuffer;

pub const GRID_SIZE: usize = 3;
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;

/// Largest channel sum a pixel can have (`3 * 255`).
const MAX_CHANNEL_SUM: f64 = 765.0;

/// Per-cell pixel bounds `(x_start, y_start, width, height)`.
pub fn cell_bounds(width: u32, height: u32, cell: usize) -> (u32, u32, u32, u32) {
    let cell_w = width / GRID_SIZE as u32;
    let cell_h = height / GRID_SIZE as u32;
    let col = (cell % GRID_SIZE) as u32;
    let row = (cell / GRID_SIZE) as u32;
    (col * cell_w, row * cell_h, cell_w, cell_h)
}

/// Raw (un-normalized) mean brightness of every cell.
///
/// Sums are accumulated as integers so the result does not depend on scan
/// order. A cell with no pixels (image smaller than 3 in a dimension) has mean 0.
pub fn cell_means(buf: &PixelBuffer) -> [f64; CELL_COUNT] {
    let (width, height) = buf.dimensions();
    let mut means = [0.0; CELL_COUNT];

    for (cell, mean) in means.iter_mut().enumerate() {
        let (x0, y0, cw, ch) = cell_bounds(width, height, cell);
        let count = cw as u64 * ch as u64;
        if count == 0 {
            continue;
        }

        let mut sum = 0u64;
        for y in y0..y0 + ch {
            for x in x0..x0 + cw {
                sum += buf.channel_sum_at(x, y) as u64;
            }
        }
        *mean = sum as f64 / (count as f64 * MAX_CHANNEL_SUM);
    }

    means
}

/// Divide every element by the maximum. An all-zero profile is left as is.
pub fn normalize(values: &mut [f64]) {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return;
    }
    for v in values.iter_mut() {
        *v /= max;
    }
}

/// `max - min` of a 3-element profile.
pub fn spread(profile: &[f64; GRID_SIZE]) -> f64 {
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = profile.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Normalized mean brightness per cell.
pub fn brightness_grid(buf: &PixelBuffer) -> [f64; CELL_COUNT] {
    let mut grid = cell_means(buf);
    normalize(&mut grid);
    grid
}

/// Normalized mean brightness of the Laplacian noise map per cell.
pub fn noise_grid(buf: &PixelBuffer, params: &EdgeParams) -> [f64; CELL_COUNT] {
    brightness_grid(&laplacian(buf, params))
}

/// Average each column of the grid (`grid[c], grid[c + 3], grid[c + 6]`), then normalize.
/// Captures left-to-right variation.
pub fn column_profile(grid: &[f64; CELL_COUNT]) -> [f64; GRID_SIZE] {
    let mut profile = [0.0; GRID_SIZE];
    for (c, value) in profile.iter_mut().enumerate() {
        *value = (grid[c] + grid[c + 3] + grid[c + 6]) / 3.0;
    }
    normalize(&mut profile);
    profile
}

/// Average each row of the grid (`grid[3r..3r + 3]`), then normalize.
/// Captures top-to-bottom variation.
pub fn row_profile(grid: &[f64; CELL_COUNT]) -> [f64; GRID_SIZE] {
    let mut profile = [0.0; GRID_SIZE];
    for (r, value) in profile.iter_mut().enumerate() {
        let i = r * GRID_SIZE;
        *value = (grid[i] + grid[i + 1] + grid[i + 2]) / 3.0;
    }
    normalize(&mut profile);
    profile
}

/// Every profile derived from one buffer. Always recomputed from scratch.
#[derive(Debug, Clone, PartialEq)]
pub struct GridProfiles {
    pub brightness: [f64; CELL_COUNT],
    pub noise: [f64; CELL_COUNT],
    pub brightness_rows: [f64; GRID_SIZE],
    pub brightness_columns: [f64; GRID_SIZE],
    pub noise_rows: [f64; GRID_SIZE],
    pub noise_columns: [f64; GRID_SIZE],
}

impl GridProfiles {
    pub fn compute(buf: &PixelBuffer, params: &EdgeParams) -> Self {
        let brightness = brightness_grid(buf);
        let noise = noise_grid(buf, params);
        Self {
            brightness,
            noise,
            brightness_rows: row_profile(&brightness),
            brightness_columns: column_profile(&brightness),
            noise_rows: row_profile(&noise),
            noise_columns: column_profile(&noise),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::Pixel;

    fn gray_buffer(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.set(x, y, Pixel::gray(f(x, y))).unwrap();
            }
        }
        buf
    }

    #[test]
    fn test_cell_bounds_floor_division() {
        assert_eq!(cell_bounds(10, 7, 0), (0, 0, 3, 2));
        assert_eq!(cell_bounds(10, 7, 2), (6, 0, 3, 2));
        assert_eq!(cell_bounds(10, 7, 8), (6, 4, 3, 2));
    }

    #[test]
    fn test_remainder_column_never_counted() {
        // Width 10: only x = 0..9 belongs to a cell. Column 9 is white, rest black.
        let buf = gray_buffer(10, 9, |x, _| if x == 9 { 255 } else { 0 });
        assert_eq!(cell_means(&buf), [0.0; CELL_COUNT]);

        // Bottom remainder row likewise ignored
        let buf = gray_buffer(9, 10, |_, y| if y == 9 { 255 } else { 0 });
        assert_eq!(cell_means(&buf), [0.0; CELL_COUNT]);
    }

    #[test]
    fn test_cell_means_row_major() {
        // Top-left cell white, everything else black
        let buf = gray_buffer(6, 6, |x, y| if x < 2 && y < 2 { 255 } else { 0 });
        let means = cell_means(&buf);
        assert_eq!(means[0], 1.0);
        assert!(means[1..].iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_normalize_max_is_one() {
        let mut values = [0.2, 0.8, 0.4];
        normalize(&mut values);
        assert_eq!(values.iter().copied().fold(0.0, f64::max), 1.0);
        assert!(values.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert_eq!(values[0], 0.25);
    }

    #[test]
    fn test_normalize_all_zero_unchanged() {
        let mut values = [0.0; 9];
        normalize(&mut values);
        assert_eq!(values, [0.0; 9]);
        assert_eq!(spread(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_row_and_column_profiles() {
        #[rustfmt::skip]
        let grid = [
            1.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
            1.0, 0.0, 0.0,
        ];
        assert_eq!(column_profile(&grid), [1.0, 0.0, 0.0]);
        assert_eq!(row_profile(&grid), [1.0, 1.0, 1.0]);

        #[rustfmt::skip]
        let grid = [
            0.5, 0.5, 0.5,
            0.0, 0.0, 0.0,
            0.25, 0.25, 0.25,
        ];
        assert_eq!(row_profile(&grid), [1.0, 0.0, 0.5]);
        assert_eq!(column_profile(&grid), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_spread() {
        assert_eq!(spread(&[0.25, 1.0, 0.5]), 0.75);
    }

    #[test]
    fn test_tiny_image_is_degenerate_not_error() {
        let buf = gray_buffer(1, 1, |_, _| 255);
        let profiles = GridProfiles::compute(&buf, &EdgeParams::default());
        assert_eq!(profiles.brightness, [0.0; CELL_COUNT]);
        assert_eq!(profiles.noise_rows, [0.0; GRID_SIZE]);
    }

    #[test]
    fn test_noise_grid_finds_textured_column() {
        // Vertical stripes in the left third of a 12x6 image
        let buf = gray_buffer(12, 6, |x, _| if x < 4 && x % 2 == 0 { 255 } else { 0 });
        let profiles = GridProfiles::compute(&buf, &EdgeParams::default());
        assert_eq!(profiles.noise_columns, [1.0, 0.0, 0.0]);
        assert_eq!(profiles.noise_rows, [0.5, 1.0, 0.5]);
        assert_eq!(profiles.brightness_columns, [1.0, 0.0, 0.0]);
        assert_eq!(profiles.brightness_rows, [1.0, 1.0, 1.0]);
    }
}
