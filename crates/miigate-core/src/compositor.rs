//! Supersampling removal on the CPU.
//!
//! Renders are requested `factor` times larger than the caller asked for and
//! scaled back down here with a bilinear (triangle) filter. Channels are
//! treated as straight, non-premultiplied RGBA and their order is never
//! touched; TGA output simply carries whatever order the backend produced.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{RenderError, Result};

pub const BYTES_PER_PIXEL: usize = 4;

/// Tightly packed 8-bit, 4-channel pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(RenderError::Internal(format!(
                "raster {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }
}

/// Scale `src` down by `factor` in both dimensions. No-op for factor 1.
pub fn downscale(src: Raster, factor: u32) -> Result<Raster> {
    if factor <= 1 {
        return Ok(src);
    }
    let (width, height) = (src.width / factor, src.height / factor);
    if width == 0 || height == 0 {
        return Err(RenderError::Internal(format!(
            "cannot downscale {}x{} by {factor}",
            src.width, src.height
        )));
    }
    let img = RgbaImage::from_raw(src.width, src.height, src.pixels)
        .ok_or_else(|| RenderError::Internal("raster buffer does not match its dimensions".into()))?;
    let scaled = imageops::resize(&img, width, height, FilterType::Triangle);
    Raster::new(width, height, scaled.into_raw())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn uniform(width: u32, height: u32, px: [u8; 4]) -> Raster {
        let pixels = px.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Raster::new(width, height, pixels).unwrap()
    }

    #[test]
    fn factor_one_is_identity() {
        let src = uniform(3, 5, [1, 2, 3, 4]);
        assert_eq!(downscale(src.clone(), 1).unwrap(), src);
    }

    #[test]
    fn uniform_field_stays_uniform() {
        for (w, h) in [(2, 2), (64, 64), (270, 540), (91, 33)] {
            let px = [12, 200, 77, 255];
            let out = downscale(uniform(w, h, px), 2).unwrap();
            assert_eq!((out.width, out.height), (w / 2, h / 2));
            assert_eq!(out, uniform(w / 2, h / 2, px));
        }
    }

    #[test]
    fn mismatched_buffer_is_rejected() {
        assert!(Raster::new(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn too_small_to_downscale() {
        assert!(downscale(uniform(1, 4, [0; 4]), 2).is_err());
    }
}
