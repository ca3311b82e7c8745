//! Response classification tests over synthetic probe windows.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use bytes::Bytes;

use miigate_core::protocol::response::{
    classify, read_failure, Probe, ReadFault, ResponseEnvelope, TgaHeader, GLB_MAGIC, PROBE_WINDOW,
};
use miigate_core::protocol::ResponseFormat;

const MAX_SIDE: u32 = 1080;

fn window(prefix: &[u8]) -> Bytes {
    let mut w = prefix.to_vec();
    w.resize(PROBE_WINDOW, 0xAB);
    Bytes::from(w)
}

fn tga_header(width: i16, height: i16, bpp: u8) -> Vec<u8> {
    let mut h = vec![0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    h.extend_from_slice(&width.to_le_bytes());
    h.extend_from_slice(&height.to_le_bytes());
    h.extend_from_slice(&[bpp, 8]);
    h
}

fn glb_header(len: u32) -> Vec<u8> {
    let mut h = GLB_MAGIC.to_le_bytes().to_vec();
    h.extend_from_slice(&2u32.to_le_bytes());
    h.extend_from_slice(&len.to_le_bytes());
    h
}

#[test]
fn error_prefix_survives_a_reset() {
    let probe = Probe::failed(
        Bytes::from_static(b"ERROR: Data CRC16 verification failed.\n"),
        ReadFault::Reset,
    );
    for format in [ResponseFormat::Png, ResponseFormat::Tga, ResponseFormat::Glb] {
        let env = classify(format, MAX_SIDE, &probe);
        assert_eq!(
            env,
            ResponseEnvelope::BackendError { message: "Data CRC16 verification failed.\n".into() }
        );
        let err = env.error().unwrap();
        assert_eq!(err.client_code().as_str(), "UPSTREAM_REPORTED");
    }
}

#[test]
fn error_prefix_in_a_full_window() {
    let mut text = b"ERROR: Unknown data type\n".to_vec();
    text.push(0);
    let env = classify(ResponseFormat::Png, MAX_SIDE, &Probe::complete(window(&text)));
    assert_eq!(env, ResponseEnvelope::BackendError { message: "Unknown data type\n".into() });
}

#[test]
fn early_close_without_prefix_is_truncation() {
    let probe = Probe::failed(Bytes::from_static(b"\0\0\x02\0"), ReadFault::Eof);
    let env = classify(ResponseFormat::Png, MAX_SIDE, &probe);
    assert!(matches!(env, ResponseEnvelope::Truncated { .. }));
    assert_eq!(env.error().unwrap().client_code().as_str(), "UPSTREAM_TRUNCATED");
}

#[test]
fn refused_is_never_truncation() {
    let probe = Probe::failed(Bytes::new(), ReadFault::Refused);
    let env = classify(ResponseFormat::Tga, MAX_SIDE, &probe);
    assert!(matches!(env, ResponseEnvelope::Unavailable { .. }));
    assert_eq!(env.error().unwrap().client_code().as_str(), "UPSTREAM_UNAVAILABLE");
}

#[test]
fn other_io_failure_keeps_its_detail() {
    let probe = Probe::failed(Bytes::new(), ReadFault::Other("permission denied".into()));
    let err = classify(ResponseFormat::Png, MAX_SIDE, &probe).error().unwrap();
    assert_eq!(err.client_code().as_str(), "UPSTREAM_IO");
    assert!(err.to_string().contains("permission denied"));
}

#[test]
fn raster_header_by_format() {
    let w = window(&tga_header(540, 540, 32));
    assert_eq!(
        classify(ResponseFormat::Png, MAX_SIDE, &Probe::complete(w.clone())),
        ResponseEnvelope::RawPixelBuffer { width: 540, height: 540, bytes_per_pixel: 4 }
    );
    match classify(ResponseFormat::Tga, MAX_SIDE, &Probe::complete(w)) {
        ResponseEnvelope::TgaImage { header } => {
            assert_eq!(header.pixel_len(), 540 * 540 * 4);
            assert_eq!(header.descriptor, 8);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn raster_header_sanity() {
    for header in [tga_header(540, 540, 24), tga_header(0, 10, 32), tga_header(-4, 10, 32)] {
        let env = classify(ResponseFormat::Png, MAX_SIDE, &Probe::complete(window(&header)));
        assert!(matches!(env, ResponseEnvelope::Malformed { .. }), "{env:?}");
    }
}

#[test]
fn raster_larger_than_requested_is_malformed() {
    let env = classify(ResponseFormat::Png, 540, &Probe::complete(window(&tga_header(32767, 32767, 32))));
    match env {
        ResponseEnvelope::Malformed { reason } => assert!(reason.contains("32767x32767"), "{reason}"),
        other => panic!("unexpected {other:?}"),
    }
    let env = classify(ResponseFormat::Tga, 540, &Probe::complete(window(&tga_header(540, 541, 32))));
    assert!(matches!(env, ResponseEnvelope::Malformed { .. }), "{env:?}");
    let env = classify(ResponseFormat::Tga, 540, &Probe::complete(window(&tga_header(540, 540, 32))));
    assert!(matches!(env, ResponseEnvelope::TgaImage { .. }), "{env:?}");
}

#[test]
fn glb_declared_length_is_echoed() {
    let env = classify(ResponseFormat::Glb, MAX_SIDE, &Probe::complete(window(&glb_header(123_456))));
    assert_eq!(env, ResponseEnvelope::GlbStream { declared_len: 123_456 });
}

#[test]
fn glb_bad_magic_is_malformed() {
    let env = classify(ResponseFormat::Glb, MAX_SIDE, &Probe::complete(window(&[0x89, b'P', b'N', b'G'])));
    assert!(matches!(env, ResponseEnvelope::Malformed { .. }));
}

#[test]
fn glb_smaller_than_window_is_complete() {
    let mut body = glb_header(40);
    body.resize(40, 0);
    let env = classify(ResponseFormat::Glb, MAX_SIDE, &Probe::failed(Bytes::from(body.clone()), ReadFault::Eof));
    assert_eq!(env, ResponseEnvelope::GlbStream { declared_len: 40 });

    body.truncate(30);
    let env = classify(ResponseFormat::Glb, MAX_SIDE, &Probe::failed(Bytes::from(body), ReadFault::Eof));
    assert!(matches!(env, ResponseEnvelope::Truncated { .. }));
}

#[test]
fn mid_body_failure_reuses_window_prefix() {
    let w = window(&tga_header(64, 64, 32));
    let err = read_failure(&w, &ReadFault::Eof);
    assert_eq!(err.client_code().as_str(), "UPSTREAM_TRUNCATED");

    let err = read_failure(b"ERROR: out of memory\0", &ReadFault::Reset);
    assert_eq!(err.to_string(), "renderer returned ERROR: out of memory");
}

#[test]
fn header_parse_needs_full_length() {
    assert!(TgaHeader::parse(&tga_header(1, 1, 32)[..17]).is_none());
}
