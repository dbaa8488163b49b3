pub mod codec;
pub mod edge_detect;
pub mod error;
pub mod exif_orientation;

#[cfg(not(target_arch = "wasm32"))]
pub mod ffi;

pub mod grid;
pub mod pipeline;
pub mod pixel_buffer;
pub mod preprocess;
pub mod scorer;

pub use error::{OrientError, Result};
pub use pipeline::{orient, orient_with, OrientParams};
pub use pixel_buffer::{Pixel, PixelBuffer};
