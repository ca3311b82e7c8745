//! Backend wire protocol.
//!
//! - `request`: the fixed-layout render request record written to the backend.
//! - `response`: probe-window classification of whatever the backend answers.
//!
//! Both sides are little-endian and parsed through `bytes::Buf`/`BufMut`, so
//! a short or hostile buffer is reported as a value instead of a panic.

pub mod request;
pub mod response;

/// Output container, chosen by the request path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseFormat {
    /// Raw RGBA render, encoded to PNG by the gateway.
    Png,
    /// Binary glTF streamed through untouched.
    Glb,
    /// TGA-headered render (the backend flips Y and emits BGRA).
    Tga,
}

impl ResponseFormat {
    pub fn from_path(path: &str) -> Self {
        if path.ends_with(".glb") {
            ResponseFormat::Glb
        } else if path.ends_with(".tga") {
            ResponseFormat::Tga
        } else {
            ResponseFormat::Png
        }
    }

    /// Value of the request's `response_format` byte.
    pub fn wire(self) -> u8 {
        match self {
            ResponseFormat::Png => 0,
            ResponseFormat::Glb => 1,
            ResponseFormat::Tga => 2,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ResponseFormat::Png => "image/png",
            ResponseFormat::Glb => "model/gltf-binary",
            ResponseFormat::Tga => "image/tga",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Png => "png",
            ResponseFormat::Glb => "glb",
            ResponseFormat::Tga => "tga",
        }
    }
}
