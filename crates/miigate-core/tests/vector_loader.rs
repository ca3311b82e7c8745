//! JSON test vector loader for query resolution tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde::Deserialize;

use miigate_core::params::QueryParams;
use miigate_core::protocol::ResponseFormat;

#[derive(Debug, Deserialize)]
pub struct ResolveVector {
    pub description: String,
    pub format: String,
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub expect: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

impl ResolveVector {
    pub fn query(&self) -> QueryParams {
        QueryParams::from_pairs(self.query.clone())
    }

    pub fn format(&self) -> ResponseFormat {
        match self.format.as_str() {
            "png" => ResponseFormat::Png,
            "glb" => ResponseFormat::Glb,
            "tga" => ResponseFormat::Tga,
            other => panic!("unsupported format: {other}"),
        }
    }
}

pub fn load(name: &str) -> Vec<ResolveVector> {
    let s = std::fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
