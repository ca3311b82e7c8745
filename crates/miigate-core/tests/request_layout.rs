//! Wire layout checks for the render request record.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use miigate_core::params::{self, QueryParams, RenderParameters};
use miigate_core::protocol::request::{RenderRequest, REQUEST_SIZE};
use miigate_core::protocol::ResponseFormat;

fn store_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(1)).collect()
}

fn resolved(pairs: &[(&str, &str)], format: ResponseFormat, data: Vec<u8>) -> RenderParameters {
    let q: QueryParams = pairs.iter().copied().collect();
    params::resolve(&q, format, data).unwrap()
}

fn u16_at(b: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([b[off], b[off + 1]])
}

fn i16_at(b: &[u8], off: usize) -> i16 {
    i16::from_le_bytes([b[off], b[off + 1]])
}

fn u32_at(b: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

#[test]
fn every_field_lands_at_its_offset() {
    let data = store_data(72);
    let p = resolved(
        &[
            ("width", "300"),
            ("mipmapEnable", "1"),
            ("type", "all_body"),
            ("modelType", "hat"),
            ("flattenNose", "1"),
            ("resourceType", "high"),
            ("shaderType", "miitomo"),
            ("expression", "smile,33"),
            ("cameraXRotate", "-10"),
            ("cameraZRotate", "20"),
            ("characterYRotate", "180"),
            ("bgColor", "11223344"),
            ("drawStageMode", "xlu_only"),
            ("verifyCharInfo", "0"),
            ("clothesColor", "blue"),
            ("pantsColor", "red"),
            ("bodyType", "3ds"),
            ("hatType", "4"),
            ("hatColor", "2"),
            ("instanceCount", "3"),
            ("lightYDirection", "5"),
            ("splitMode", "back"),
        ],
        ResponseFormat::Glb,
        data.clone(),
    );
    let b = RenderRequest::from_params(&p).encode();
    assert_eq!(b.len(), REQUEST_SIZE);

    assert_eq!(&b[..72], &data[..]);
    assert!(b[72..96].iter().all(|x| *x == 0));
    assert_eq!(u16_at(&b, 96), 72);
    assert_eq!(b[98], (1 << 1) | (1 << 3));
    assert_eq!(b[99], 1);
    assert_eq!(u16_at(&b, 100), 600);
    assert_eq!(i16_at(&b, 102), -600);
    assert_eq!(b[104], 2);
    assert_eq!(b[105] as i8, 1);
    assert_eq!(b[106], 2);
    assert_eq!(b[107], 1);
    assert_eq!(u32_at(&b, 108), 1 << 1);
    assert_eq!(u32_at(&b, 112), 1 << 1);
    assert_eq!(u32_at(&b, 116), 0);
    assert_eq!([i16_at(&b, 120), i16_at(&b, 122), i16_at(&b, 124)], [-10, 0, 20]);
    assert_eq!([i16_at(&b, 126), i16_at(&b, 128), i16_at(&b, 130)], [0, 180, 0]);
    assert_eq!(&b[132..136], &[0x11, 0x22, 0x33, 0x44]);
    assert_eq!(b[136], 0);
    assert_eq!(b[137], 2);
    assert_eq!(&b[138..141], &[0, 1, 1]);
    assert_eq!([b[141] as i8, b[142] as i8, b[143] as i8], [5, 2, 4]);
    assert_eq!(&b[144..148], &[4, 2, 3, 0]);
    assert_eq!([i16_at(&b, 148), i16_at(&b, 150), i16_at(&b, 152)], [-1, 5, -1]);
    assert_eq!(b[154], 2);
    assert!(b[155..].iter().all(|x| *x == 0));
}

#[test]
fn encoding_is_deterministic() {
    let p = resolved(&[("width", "512"), ("bgColor", "#336699")], ResponseFormat::Tga, store_data(96));
    let a = RenderRequest::from_params(&p).encode();
    let b = RenderRequest::from_params(&p).encode();
    assert_eq!(a, b);
}

#[test]
fn size_is_constant_across_payloads() {
    for len in [46, 58, 72, 74, 76, 92, 96] {
        let p = resolved(&[], ResponseFormat::Png, store_data(len));
        assert_eq!(RenderRequest::from_params(&p).encode().len(), REQUEST_SIZE, "len={len}");
    }
}

#[test]
fn mipmap_off_keeps_texture_resolution_positive() {
    let p = resolved(&[("width", "200")], ResponseFormat::Png, store_data(96));
    let b = RenderRequest::from_params(&p).encode();
    assert_eq!(i16_at(&b, 102), 800);
    assert_eq!(b[98], 1);
    assert_eq!(b[99], 0);
}

#[test]
fn response_side_bound_follows_resolution() {
    let p = resolved(&[], ResponseFormat::Png, store_data(96));
    let req = RenderRequest::from_params(&p);
    assert_eq!(req.resolution, 540);
    assert_eq!(req.max_response_side(), 1080);
}
