//! Codec for bitmaps embedded in annotation JSON.
//!
//! Wire format: `base64(zlib(PNG))`, where the PNG's alpha channel carries
//! the occupancy mask (non-zero alpha = set). The encoder writes an 8-bit
//! indexed PNG with a black/white palette whose index 0 is fully
//! transparent, which decodes back to the same mask.

use std::io::{Cursor, Read, Write};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, ImageFormat, ImageReader, Limits};

use crate::error::BitmapError;

/// Largest inflated PNG stream accepted, in bytes.
pub const MAX_INFLATED_BYTES: u64 = 64 * 1024 * 1024;

/// Largest bitmap width or height accepted, in pixels.
pub const MAX_BITMAP_SIDE: u32 = 16_384;

/// Upper bound on the PNG decoder's own allocations.
const MAX_DECODE_ALLOC: u64 = 256 * 1024 * 1024;

/// A dense boolean rectangle, row-major.
#[derive(Clone, PartialEq, Eq)]
pub struct BitMask {
    height: usize,
    width: usize,
    cells: Vec<bool>,
}

impl BitMask {
    /// Creates an all-clear mask.
    pub fn new(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            cells: vec![false; height * width],
        }
    }

    /// Creates a mask from a predicate over `(row, col)`.
    pub fn from_fn(height: usize, width: usize, f: impl Fn(usize, usize) -> bool) -> Self {
        let cells = (0..height * width).map(|i| f(i / width.max(1), i % width.max(1))).collect();
        Self {
            height,
            width,
            cells,
        }
    }

    /// Creates a mask from row-major cells. Returns `None` on a length mismatch.
    pub fn from_cells(height: usize, width: usize, cells: Vec<bool>) -> Option<Self> {
        (cells.len() == height * width).then_some(Self {
            height,
            width,
            cells,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// True if the mask has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width && self.cells[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        if row < self.height && col < self.width {
            self.cells[row * self.width + col] = value;
        }
    }

    /// Number of set cells.
    pub fn count_set(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

impl std::fmt::Debug for BitMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "BitMask {}x{}", self.width, self.height)?;
        for row in self.cells.chunks(self.width.max(1)) {
            let line: String = row.iter().map(|&c| if c { '#' } else { '.' }).collect();
            writeln!(f, "  {}", line)?;
        }
        Ok(())
    }
}

/// Decodes an embedded bitmap payload.
///
/// base64 → zlib inflate → PNG decode → alpha channel → non-zero test.
/// ASCII whitespace in the payload is ignored. The inflated stream is capped
/// at [`MAX_INFLATED_BYTES`] and each side at [`MAX_BITMAP_SIDE`].
pub fn decode_bitmap(data: &str) -> Result<BitMask, BitmapError> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let compressed = general_purpose::STANDARD.decode(cleaned.as_bytes())?;
    let png_bytes = inflate_limited(&compressed, MAX_INFLATED_BYTES)?;

    let mut reader = ImageReader::with_format(Cursor::new(&png_bytes), ImageFormat::Png);
    reader.limits(png_limits());
    let decoded = reader.decode()?;

    let (width, height) = (decoded.width(), decoded.height());
    let cells = match &decoded {
        DynamicImage::ImageLumaA8(img) => img.pixels().map(|p| p.0[1] != 0).collect(),
        DynamicImage::ImageLumaA16(img) => img.pixels().map(|p| p.0[1] != 0).collect(),
        DynamicImage::ImageRgba8(img) => img.pixels().map(|p| p.0[3] != 0).collect(),
        DynamicImage::ImageRgba16(img) => img.pixels().map(|p| p.0[3] != 0).collect(),
        DynamicImage::ImageRgba32F(img) => img.pixels().map(|p| p.0[3] != 0.0).collect(),
        other => return Err(BitmapError::MissingAlpha(format!("{:?}", other.color()))),
    };

    Ok(BitMask {
        height: height as usize,
        width: width as usize,
        cells,
    })
}

/// Inflates a zlib stream, failing once it grows past `limit` bytes.
fn inflate_limited(compressed: &[u8], limit: u64) -> Result<Vec<u8>, BitmapError> {
    let mut out = Vec::new();
    ZlibDecoder::new(compressed)
        .take(limit.saturating_add(1))
        .read_to_end(&mut out)
        .map_err(BitmapError::Zlib)?;
    if out.len() as u64 > limit {
        return Err(BitmapError::TooLarge { limit });
    }
    Ok(out)
}

fn png_limits() -> Limits {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_BITMAP_SIDE);
    limits.max_image_height = Some(MAX_BITMAP_SIDE);
    limits.max_alloc = Some(MAX_DECODE_ALLOC);
    limits
}

/// Encodes a mask into an embedded bitmap payload.
///
/// mask → indexed PNG (palette black/white, index 0 transparent) → zlib → base64.
pub fn encode_bitmap(mask: &BitMask) -> Result<String, BitmapError> {
    if mask.height == 0 || mask.width == 0 {
        return Err(BitmapError::Empty);
    }

    let indices: Vec<u8> = mask.cells.iter().map(|&c| c as u8).collect();

    let mut png_bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_bytes, mask.width as u32, mask.height as u32);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(vec![0, 0, 0, 255, 255, 255]);
        encoder.set_trns(vec![0u8]);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&indices)?;
        writer.finish()?;
    }

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
    zlib.write_all(&png_bytes).map_err(BitmapError::Zlib)?;
    let compressed = zlib.finish().map_err(BitmapError::Zlib)?;

    Ok(general_purpose::STANDARD.encode(compressed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_mask() -> BitMask {
        BitMask::from_fn(5, 7, |r, c| r == 0 || r == 4 || c == 0 || c == 6)
    }

    #[test]
    fn test_roundtrip_preserves_mask() {
        let mask = ring_mask();
        let encoded = encode_bitmap(&mask).expect("encode");
        let decoded = decode_bitmap(&encoded).expect("decode");
        assert_eq!(decoded, mask);
        assert_eq!(decoded.count_set(), 20);
    }

    #[test]
    fn test_roundtrip_all_clear_and_all_set() {
        for value in [false, true] {
            let mask = BitMask::from_fn(3, 2, |_, _| value);
            let decoded = decode_bitmap(&encode_bitmap(&mask).unwrap()).unwrap();
            assert_eq!(decoded, mask);
        }
    }

    #[test]
    fn test_decode_ignores_whitespace() {
        let encoded = encode_bitmap(&ring_mask()).unwrap();
        let (a, b) = encoded.split_at(encoded.len() / 2);
        let wrapped = format!("{}\n  {}\n", a, b);
        assert_eq!(decode_bitmap(&wrapped).unwrap(), ring_mask());
    }

    #[test]
    fn test_encode_empty_mask_fails() {
        assert!(matches!(
            encode_bitmap(&BitMask::new(0, 4)),
            Err(BitmapError::Empty)
        ));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_bitmap("not base64 !!"),
            Err(BitmapError::Base64(_))
        ));
    }

    #[test]
    fn test_decode_rejects_non_zlib_payload() {
        let payload = general_purpose::STANDARD.encode(b"plain bytes");
        assert!(matches!(
            decode_bitmap(&payload),
            Err(BitmapError::Zlib(_))
        ));
    }

    #[test]
    fn test_decode_rejects_png_without_alpha() {
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 2, 2);
            encoder.set_color(png::ColorType::Grayscale);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[0, 255, 255, 0]).unwrap();
            writer.finish().unwrap();
        }
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(&png_bytes).unwrap();
        let payload = general_purpose::STANDARD.encode(zlib.finish().unwrap());

        assert!(matches!(
            decode_bitmap(&payload),
            Err(BitmapError::MissingAlpha(_))
        ));
    }

    #[test]
    fn test_decode_rgba_alpha_channel() {
        // 2x1 RGBA: opaque black pixel, then a white pixel with alpha 0.
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, 2, 1);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer
                .write_image_data(&[0, 0, 0, 255, 255, 255, 255, 0])
                .unwrap();
            writer.finish().unwrap();
        }
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(&png_bytes).unwrap();
        let payload = general_purpose::STANDARD.encode(zlib.finish().unwrap());

        let mask = decode_bitmap(&payload).unwrap();
        assert_eq!(mask.cells(), &[true, false]);
    }

    #[test]
    fn test_inflate_stops_at_limit() {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::fast());
        zlib.write_all(&[0u8; 4096]).unwrap();
        let compressed = zlib.finish().unwrap();

        assert_eq!(inflate_limited(&compressed, 4096).unwrap().len(), 4096);
        assert!(matches!(
            inflate_limited(&compressed, 1024),
            Err(BitmapError::TooLarge { limit: 1024 })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_stream() {
        // Inflates to one byte more than the cap before any PNG parsing.
        let chunk = vec![0u8; 1024 * 1024];
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::fast());
        for _ in 0..MAX_INFLATED_BYTES / chunk.len() as u64 {
            zlib.write_all(&chunk).unwrap();
        }
        zlib.write_all(&[0]).unwrap();
        let payload = general_purpose::STANDARD.encode(zlib.finish().unwrap());

        assert!(matches!(
            decode_bitmap(&payload),
            Err(BitmapError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized_dimensions() {
        let width = MAX_BITMAP_SIDE + 1;
        let mut png_bytes = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut png_bytes, width, 1);
            encoder.set_color(png::ColorType::Indexed);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_palette(vec![0, 0, 0, 255, 255, 255]);
            encoder.set_trns(vec![0u8]);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&vec![1u8; width as usize]).unwrap();
            writer.finish().unwrap();
        }
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        zlib.write_all(&png_bytes).unwrap();
        let payload = general_purpose::STANDARD.encode(zlib.finish().unwrap());

        assert!(matches!(
            decode_bitmap(&payload),
            Err(BitmapError::Png(image::ImageError::Limits(_)))
        ));
    }
}
