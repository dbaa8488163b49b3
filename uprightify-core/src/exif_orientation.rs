/// Read the EXIF orientation tag and apply the rotation/mirror it declares.
///
/// EXIF orientation values:
/// 1 = Normal
/// 2 = Flipped horizontally
/// 3 = Rotated 180°
/// 4 = Flipped vertically
/// 5 = Transposed (rotate 90° CW + flip horizontal)
/// 6 = Rotated 90° CW
/// 7 = Transverse (rotate 270° CW + flip horizontal)
/// 8 = Rotated 270° CW
use std::io::Cursor;
use std::path::Path;

use tracing::debug;

use crate::pixel_buffer::PixelBuffer;

fn orientation_from_reader<R: std::io::BufRead + std::io::Seek>(reader: &mut R) -> Option<u32> {
    let exif = exif::Reader::new().read_from_container(reader).ok()?;
    let orientation = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    match orientation.value.get_uint(0)? {
        o @ 1..=8 => Some(o),
        _ => None,
    }
}

/// Read EXIF orientation from a file. Returns None if unreadable, missing, or out of range.
pub fn read_exif_orientation(path: &Path) -> Option<u32> {
    let file = std::fs::File::open(path).ok()?;
    let mut bufreader = std::io::BufReader::new(file);
    orientation_from_reader(&mut bufreader)
}

/// Read EXIF orientation from a byte slice. Returns None if unreadable, missing, or out of range.
pub fn read_exif_orientation_from_bytes(bytes: &[u8]) -> Option<u32> {
    orientation_from_reader(&mut Cursor::new(bytes))
}

/// Apply the transform declared by an orientation tag. `None` and 1 are no-ops.
pub fn apply_orientation(buf: PixelBuffer, orientation: Option<u32>) -> PixelBuffer {
    let Some(orientation) = orientation else {
        return buf;
    };
    if orientation != 1 {
        debug!(orientation, "Applying EXIF orientation");
    }

    match orientation {
        2 => buf.flip_horizontal(),
        3 => buf.rotate180(),
        4 => buf.flip_vertical(),
        5 => buf.rotate90().flip_horizontal(),
        6 => buf.rotate90(),
        7 => buf.rotate270().flip_horizontal(),
        8 => buf.rotate270(),
        _ => buf,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::pixel_buffer::Pixel;

    /// Insert a big-endian APP1 Exif segment holding only the orientation
    /// tag (0x0112) right after the JPEG SOI marker.
    pub(crate) fn jpeg_with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let [hi, lo] = orientation.to_be_bytes();
        #[rustfmt::skip]
        let tiff = [
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08, // header, IFD0 at 8
            0x00, 0x01,                                     // one entry
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, // Orientation, SHORT, count 1
            hi, lo, 0x00, 0x00,                             // value
            0x00, 0x00, 0x00, 0x00,                         // no next IFD
        ];
        let segment_len = (2 + 6 + tiff.len()) as u16;

        let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
        out.extend_from_slice(&segment_len.to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 200]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
            .unwrap();
        out
    }

    fn indexed(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                buf.set(x, y, Pixel::rgba((y * width + x) as u8, 0, 0, 255))
                    .unwrap();
            }
        }
        buf
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_no_exif_returns_none() {
        assert_eq!(read_exif_orientation_from_bytes(&png_bytes()), None);
        assert_eq!(read_exif_orientation_from_bytes(&[]), None);
        assert_eq!(read_exif_orientation_from_bytes(b"not an image"), None);
    }

    #[test]
    fn test_reads_tag_from_jpeg_bytes() {
        let jpeg = plain_jpeg(12, 6);
        assert_eq!(read_exif_orientation_from_bytes(&jpeg), None);
        for tag in [1, 3, 6, 8] {
            let tagged = jpeg_with_orientation(&jpeg, tag);
            assert_eq!(read_exif_orientation_from_bytes(&tagged), Some(tag as u32));
        }
    }

    #[test]
    fn test_out_of_range_tag_is_absent() {
        let tagged = jpeg_with_orientation(&plain_jpeg(4, 4), 9);
        assert_eq!(read_exif_orientation_from_bytes(&tagged), None);
    }

    #[test]
    fn test_reads_tag_from_file() {
        let path = std::env::temp_dir().join(format!("uprightify-exif-{}.jpg", std::process::id()));
        std::fs::write(&path, jpeg_with_orientation(&plain_jpeg(8, 4), 6)).unwrap();
        assert_eq!(read_exif_orientation(&path), Some(6));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_returns_none() {
        assert_eq!(
            read_exif_orientation(Path::new("/nonexistent/uprightify.jpg")),
            None
        );
    }

    #[test]
    fn test_identity_tags() {
        let buf = indexed(3, 2);
        assert_eq!(apply_orientation(buf.clone(), None), buf);
        assert_eq!(apply_orientation(buf.clone(), Some(1)), buf);
        assert_eq!(apply_orientation(buf.clone(), Some(42)), buf);
    }

    #[test]
    fn test_all_tags() {
        let buf = indexed(3, 2);
        let expected = [
            (2, buf.flip_horizontal()),
            (3, buf.rotate180()),
            (4, buf.flip_vertical()),
            (5, buf.rotate90().flip_horizontal()),
            (6, buf.rotate90()),
            (7, buf.rotate270().flip_horizontal()),
            (8, buf.rotate270()),
        ];
        for (tag, want) in expected {
            assert_eq!(apply_orientation(buf.clone(), Some(tag)), want, "tag {}", tag);
        }
    }

    #[test]
    fn test_tag_4_equals_rotate180_and_mirror() {
        let buf = indexed(4, 3);
        assert_eq!(
            apply_orientation(buf.clone(), Some(4)),
            buf.rotate180().flip_horizontal()
        );
    }

    #[test]
    fn test_transpose_swaps_axes() {
        // Tag 5 maps (x, y) -> (y, x)
        let buf = indexed(3, 2);
        let t = apply_orientation(buf.clone(), Some(5));
        assert_eq!(t.dimensions(), (2, 3));
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(t.get(y, x).unwrap(), buf.get(x, y).unwrap());
            }
        }
    }
}
