//! Query resolution vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde_json::{json, Value};

use miigate_core::params::{self, DataSource, RenderParameters};

mod vector_loader;

fn field(p: &RenderParameters, name: &str) -> Value {
    match name {
        "resolution" => json!(p.resolution),
        "tex_resolution" => json!(p.tex_resolution),
        "ssaa_factor" => json!(p.ssaa_factor),
        "mipmap" => json!(p.mipmap),
        "background" => json!(p.background.to_array()),
        "light_enable" => json!(p.light_enable),
        "verify_char_info" => json!(p.verify_char_info),
        "verify_crc16" => json!(p.verify_crc16),
        "instance_count" => json!(p.instance_count),
        "view_type" => json!(p.view_type),
        "model_type" => json!(p.model_type),
        "flatten_nose" => json!(p.flatten_nose),
        "clothes_color" => json!(p.clothes_color),
        "pants_color" => json!(p.pants_color),
        "body_type" => json!(p.body_type),
        "shader_type" => json!(p.shader_type),
        "resource_type" => json!(p.resource_type),
        "expression" => json!(p.expression),
        "expression_flags" => json!(p.expression_flags.blocks()),
        "camera_rotate" => json!(p.camera_rotate),
        "model_rotate" => json!(p.model_rotate),
        "light_direction" => json!(p.light_direction),
        "data_len" => json!(p.store_data.len()),
        other => panic!("unknown expect field: {other}"),
    }
}

fn run(v: &vector_loader::ResolveVector) -> miigate_core::Result<RenderParameters> {
    let q = v.query();
    match params::data_source(&q)? {
        DataSource::Inline(data) => params::resolve(&q, v.format(), data),
        DataSource::Nnid(n) => panic!("vector {} unexpectedly asked for nnid {n}", v.description),
    }
}

#[test]
fn resolve_vectors() {
    for v in vector_loader::load("resolve.json") {
        let res = run(&v);

        if let Some(err) = &v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let p = res.unwrap_or_else(|e| panic!("vector={} failed: {e}", v.description));
        for (name, want) in v.expect.as_ref().expect("missing expect block") {
            assert_eq!(&field(&p, name), want, "vector={} field={name}", v.description);
        }
    }
}

#[test]
fn nnid_wins_over_data() {
    let q: params::QueryParams = [("data", "00"), ("nnid", "Some-One")].into_iter().collect();
    assert_eq!(params::data_source(&q).unwrap(), DataSource::Nnid("Some-One".into()));
}

#[test]
fn payload_bounds_hold_for_both_encodings() {
    use base64::Engine as _;
    for len in [0usize, 10, 45, 46, 70, 96, 97, 128] {
        let bytes: Vec<u8> = (0..len).map(|i| (i * 13 + 7) as u8).collect();
        let encodings = [
            hex::encode(&bytes),
            base64::engine::general_purpose::STANDARD.encode(&bytes),
        ];
        for data in encodings {
            let q: params::QueryParams = [("data", data.as_str())].into_iter().collect();
            let res = params::data_source(&q).and_then(|src| match src {
                DataSource::Inline(d) => params::resolve(&q, miigate_core::protocol::ResponseFormat::Png, d),
                DataSource::Nnid(_) => unreachable!(),
            });
            assert_eq!(res.is_ok(), (46..=96).contains(&len), "len={len} data={data}");
        }
    }
}
