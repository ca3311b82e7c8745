//! Render request record (wire layout version 3).
//!
//! Layout rules:
//! - Fixed size ([`REQUEST_SIZE`]); the backend frames requests by size alone.
//! - Little-endian, fields in declaration order, no implicit padding.
//! - Mipmap enable is the sign of `tex_resolution`, not a separate field.

use bytes::{BufMut, Bytes, BytesMut};

use crate::params::payload::STORE_DATA_MAX;
use crate::params::RenderParameters;

/// Encoded size of a request.
pub const REQUEST_SIZE: usize = 160;
/// Trailing zero bytes that round the record up to [`REQUEST_SIZE`].
const TRAILING_PAD: usize = 5;

/// Number of 32-bit blocks in the expression flag set.
pub const EXPRESSION_FLAG_BLOCKS: usize = 3;
/// Expressions known to the renderer; higher indices are rejected.
pub const EXPRESSION_FLAG_LIMIT: usize = 70;

/// Set of expressions to bake into a single glTF export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExpressionFlags {
    blocks: [u32; EXPRESSION_FLAG_BLOCKS],
}

impl ExpressionFlags {
    /// Set `index`. Returns false, leaving the set untouched, when the index
    /// is out of range.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= EXPRESSION_FLAG_LIMIT {
            return false;
        }
        self.blocks[index / 32] |= 1 << (index % 32);
        true
    }

    pub fn blocks(&self) -> [u32; EXPRESSION_FLAG_BLOCKS] {
        self.blocks
    }
}

/// Largest supersampling the renderer may apply on top of the requested
/// resolution.
pub const BACKEND_SSAA_MAX: u32 = 2;

/// Model flag bit that flattens the nose (for hats and masks).
pub const MODEL_FLAG_FLATTEN_NOSE: u8 = 1 << 3;

/// Wire-exact counterpart of [`RenderParameters`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub data: [u8; STORE_DATA_MAX],
    pub data_length: u16,
    pub model_flag: u8,
    pub response_format: u8,
    pub resolution: u16,
    pub tex_resolution: i16,
    pub view_type: u8,
    pub resource_type: i8,
    pub shader_type: u8,
    pub expression: u8,
    pub expression_flag: [u32; EXPRESSION_FLAG_BLOCKS],
    pub camera_rotate: [i16; 3],
    pub model_rotate: [i16; 3],
    pub background_color: [u8; 4],
    pub aa_method: u8,
    pub draw_stage_mode: u8,
    pub verify_char_info: bool,
    pub verify_crc16: bool,
    pub light_enable: bool,
    pub clothes_color: i8,
    pub pants_color: i8,
    pub body_type: i8,
    pub hat_type: u8,
    pub hat_color: u8,
    pub instance_count: u8,
    pub instance_rotation_mode: u8,
    pub light_direction: [i16; 3],
    pub split_mode: u8,
}

impl RenderRequest {
    /// Map resolved parameters onto the wire record. Pure.
    pub fn from_params(p: &RenderParameters) -> Self {
        let mut data = [0u8; STORE_DATA_MAX];
        let len = p.store_data.len().min(STORE_DATA_MAX);
        data[..len].copy_from_slice(&p.store_data[..len]);

        let mut model_flag = 1u8.checked_shl(u32::from(p.model_type)).unwrap_or(0);
        if p.flatten_nose {
            model_flag |= MODEL_FLAG_FLATTEN_NOSE;
        }

        let tex_resolution = if p.mipmap { -p.tex_resolution } else { p.tex_resolution };

        Self {
            data,
            data_length: len as u16,
            model_flag,
            response_format: p.format.wire(),
            resolution: p.resolution,
            tex_resolution,
            view_type: p.view_type,
            resource_type: p.resource_type,
            shader_type: p.shader_type,
            expression: p.expression,
            expression_flag: p.expression_flags.blocks(),
            camera_rotate: p.camera_rotate,
            model_rotate: p.model_rotate,
            background_color: p.background.to_array(),
            aa_method: 0,
            draw_stage_mode: p.draw_stage_mode,
            verify_char_info: p.verify_char_info,
            verify_crc16: p.verify_crc16,
            light_enable: p.light_enable,
            clothes_color: p.clothes_color,
            pants_color: p.pants_color,
            body_type: p.body_type,
            hat_type: p.hat_type,
            hat_color: p.hat_color,
            instance_count: p.instance_count,
            instance_rotation_mode: 0,
            light_direction: p.light_direction,
            split_mode: p.split_mode,
        }
    }

    /// Largest side a raster answer to this request can have.
    pub fn max_response_side(&self) -> u32 {
        u32::from(self.resolution) * BACKEND_SSAA_MAX
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(REQUEST_SIZE);
        buf.put_slice(&self.data);
        buf.put_u16_le(self.data_length);
        buf.put_u8(self.model_flag);
        buf.put_u8(self.response_format);
        buf.put_u16_le(self.resolution);
        buf.put_i16_le(self.tex_resolution);
        buf.put_u8(self.view_type);
        buf.put_i8(self.resource_type);
        buf.put_u8(self.shader_type);
        buf.put_u8(self.expression);
        for block in self.expression_flag {
            buf.put_u32_le(block);
        }
        for v in self.camera_rotate.iter().chain(&self.model_rotate) {
            buf.put_i16_le(*v);
        }
        buf.put_slice(&self.background_color);
        buf.put_u8(self.aa_method);
        buf.put_u8(self.draw_stage_mode);
        buf.put_u8(u8::from(self.verify_char_info));
        buf.put_u8(u8::from(self.verify_crc16));
        buf.put_u8(u8::from(self.light_enable));
        buf.put_i8(self.clothes_color);
        buf.put_i8(self.pants_color);
        buf.put_i8(self.body_type);
        buf.put_u8(self.hat_type);
        buf.put_u8(self.hat_color);
        buf.put_u8(self.instance_count);
        buf.put_u8(self.instance_rotation_mode);
        for v in self.light_direction {
            buf.put_i16_le(v);
        }
        buf.put_u8(self.split_mode);
        buf.put_bytes(0, TRAILING_PAD);
        debug_assert_eq!(buf.len(), REQUEST_SIZE);
        buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_blocks_split_at_32() {
        let mut f = ExpressionFlags::default();
        assert!(f.set(0));
        assert!(f.set(33));
        assert!(f.set(69));
        assert_eq!(f.blocks(), [1, 2, 1 << 5]);
    }

    #[test]
    fn out_of_range_index_leaves_set_untouched() {
        let mut f = ExpressionFlags::default();
        f.set(5);
        let before = f;
        assert!(!f.set(EXPRESSION_FLAG_LIMIT));
        assert!(!f.set(95));
        assert!(!f.set(200));
        assert_eq!(f, before);
    }
}
