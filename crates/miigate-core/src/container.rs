//! Final container encoding for raster renders.

use std::io::Cursor;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::compositor::Raster;
use crate::error::{RenderError, Result};
use crate::protocol::response::{TgaHeader, TGA_BITS_PER_PIXEL, TGA_HEADER_LEN};

pub fn encode_png(raster: &Raster) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    PngEncoder::new(&mut out)
        .write_image(&raster.pixels, raster.width, raster.height, ExtendedColorType::Rgba8)
        .map_err(|e| RenderError::Internal(format!("png encode failed: {e}")))?;
    Ok(out.into_inner())
}

/// Backend header with its size fields rewritten for `raster`, followed by
/// the pixels as-is.
pub fn encode_tga(raster: &Raster, template: &TgaHeader) -> Result<Vec<u8>> {
    let dim = |v: u32| {
        i16::try_from(v).map_err(|_| RenderError::Internal(format!("tga dimension {v} exceeds i16")))
    };
    let header = TgaHeader {
        width: dim(raster.width)?,
        height: dim(raster.height)?,
        bits_per_pixel: TGA_BITS_PER_PIXEL,
        ..*template
    };
    let mut out = Vec::with_capacity(tga_len(raster));
    header.put(&mut out);
    out.extend_from_slice(&raster.pixels);
    Ok(out)
}

/// Exact byte size of [`encode_tga`] output.
pub fn tga_len(raster: &Raster) -> usize {
    TGA_HEADER_LEN + raster.pixels.len()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn tga_rewrites_dimensions_and_keeps_descriptor() {
        let template = TgaHeader::parse(&[0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 0, 8, 0, 32, 0x28]).unwrap();
        let raster = Raster::new(4, 4, vec![9; 64]).unwrap();
        let out = encode_tga(&raster, &template).unwrap();
        assert_eq!(out.len(), tga_len(&raster));
        let h = TgaHeader::parse(&out).unwrap();
        assert_eq!((h.width, h.height, h.bits_per_pixel, h.descriptor), (4, 4, 32, 0x28));
        assert!(out[TGA_HEADER_LEN..].iter().all(|b| *b == 9));
    }

    #[test]
    fn png_signature() {
        let raster = Raster::new(1, 1, vec![255, 0, 0, 255]).unwrap();
        let out = encode_png(&raster).unwrap();
        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
    }
}
