//! Backend response classification.
//!
//! The backend sends no tag byte. What came back is decided from the
//! requested format plus the first [`PROBE_WINDOW`] bytes:
//! 1. A window starting with [`ERROR_PREFIX`] is a backend error, always.
//! 2. A refused connection is "backend down", never truncation.
//! 3. glTF requests read a 12-byte GLB header; everything else an 18-byte
//!    TGA header that sizes the pixel data.
//! 4. A read that failed early is truncation unless the bytes already
//!    received hold the complete response.

use std::fmt;

use bytes::{Buf, BufMut, Bytes};

use crate::error::RenderError;
use crate::protocol::ResponseFormat;

/// Bytes read from the backend before classifying.
pub const PROBE_WINDOW: usize = 1024;
/// Reserved prefix of a structured backend error.
pub const ERROR_PREFIX: &str = "ERROR: ";

pub const TGA_HEADER_LEN: usize = 18;
/// Uncompressed true-color TGA image type.
pub const TGA_IMAGE_TYPE_TRUE_COLOR: u8 = 2;
/// The gateway's internal raster is always 8-bit RGBA.
pub const TGA_BITS_PER_PIXEL: u8 = 32;

pub const GLB_HEADER_LEN: usize = 12;
/// `glTF` read as a little-endian u32.
pub const GLB_MAGIC: u32 = 0x4654_6C67;

/// Why a backend read stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadFault {
    /// Backend closed the connection.
    Eof,
    /// Backend reset or aborted the connection.
    Reset,
    /// Connection refused while reading (some platforms report it late).
    Refused,
    /// Any other I/O failure.
    Other(String),
}

impl fmt::Display for ReadFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFault::Eof => f.write_str("unexpected eof"),
            ReadFault::Reset => f.write_str("connection reset"),
            ReadFault::Refused => f.write_str("connection refused"),
            ReadFault::Other(e) => f.write_str(e),
        }
    }
}

impl ReadFault {
    pub fn from_io(e: &std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::UnexpectedEof => ReadFault::Eof,
            ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
                ReadFault::Reset
            }
            ErrorKind::ConnectionRefused => ReadFault::Refused,
            _ => ReadFault::Other(e.to_string()),
        }
    }
}

/// First bytes of a backend response, plus the fault that ended the read
/// early (if any). Without a fault the window is exactly [`PROBE_WINDOW`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub window: Bytes,
    pub fault: Option<ReadFault>,
}

impl Probe {
    pub fn complete(window: Bytes) -> Self {
        Self { window, fault: None }
    }

    pub fn failed(window: Bytes, fault: ReadFault) -> Self {
        Self { window, fault: Some(fault) }
    }
}

/// TGA-style render header. Only the size fields are normative; the rest is
/// carried through to TGA output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TgaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_origin: i16,
    pub color_map_length: i16,
    pub color_map_depth: u8,
    pub origin_x: i16,
    pub origin_y: i16,
    pub width: i16,
    pub height: i16,
    pub bits_per_pixel: u8,
    pub descriptor: u8,
}

impl TgaHeader {
    pub fn parse(mut buf: &[u8]) -> Option<Self> {
        if buf.remaining() < TGA_HEADER_LEN {
            return None;
        }
        Some(Self {
            id_length: buf.get_u8(),
            color_map_type: buf.get_u8(),
            image_type: buf.get_u8(),
            color_map_origin: buf.get_i16_le(),
            color_map_length: buf.get_i16_le(),
            color_map_depth: buf.get_u8(),
            origin_x: buf.get_i16_le(),
            origin_y: buf.get_i16_le(),
            width: buf.get_i16_le(),
            height: buf.get_i16_le(),
            bits_per_pixel: buf.get_u8(),
            descriptor: buf.get_u8(),
        })
    }

    pub fn put(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.id_length);
        buf.put_u8(self.color_map_type);
        buf.put_u8(self.image_type);
        buf.put_i16_le(self.color_map_origin);
        buf.put_i16_le(self.color_map_length);
        buf.put_u8(self.color_map_depth);
        buf.put_i16_le(self.origin_x);
        buf.put_i16_le(self.origin_y);
        buf.put_i16_le(self.width);
        buf.put_i16_le(self.height);
        buf.put_u8(self.bits_per_pixel);
        buf.put_u8(self.descriptor);
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel / 8)
    }

    /// Exact pixel data size following the header.
    pub fn pixel_len(&self) -> usize {
        let w = usize::try_from(self.width).unwrap_or(0);
        let h = usize::try_from(self.height).unwrap_or(0);
        w * h * self.bytes_per_pixel()
    }

    fn check(&self, max_side: u32) -> Result<(), String> {
        if self.image_type != TGA_IMAGE_TYPE_TRUE_COLOR {
            return Err(format!("unsupported tga image type {}", self.image_type));
        }
        if self.bits_per_pixel != TGA_BITS_PER_PIXEL {
            return Err(format!("unsupported bits per pixel {}", self.bits_per_pixel));
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(format!("invalid dimensions {}x{}", self.width, self.height));
        }
        if self.width as u32 > max_side || self.height as u32 > max_side {
            return Err(format!(
                "dimensions {}x{} exceed the requested {max_side}",
                self.width, self.height
            ));
        }
        Ok(())
    }
}

/// Binary glTF header; only `length` matters to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub magic: u32,
    pub version: u32,
    /// Declared total length of the GLB, header included.
    pub length: u32,
}

impl GlbHeader {
    pub fn parse(mut buf: &[u8]) -> Option<Self> {
        if buf.remaining() < GLB_HEADER_LEN {
            return None;
        }
        Some(Self {
            magic: buf.get_u32_le(),
            version: buf.get_u32_le(),
            length: buf.get_u32_le(),
        })
    }
}

/// What the backend answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEnvelope {
    /// RGBA pixels follow an 18-byte header; the gateway encodes PNG.
    RawPixelBuffer { width: u16, height: u16, bytes_per_pixel: u8 },
    /// Same framing, re-emitted as a TGA file.
    TgaImage { header: TgaHeader },
    /// GLB bytes starting at offset 0 of the window.
    GlbStream { declared_len: u32 },
    /// Text after [`ERROR_PREFIX`], up to the first NUL.
    BackendError { message: String },
    /// Connection refused.
    Unavailable { detail: String },
    /// Read ended before a complete response arrived.
    Truncated { partial: Bytes, fault: ReadFault },
    /// Header present but failed sanity checks.
    Malformed { reason: String },
}

impl ResponseEnvelope {
    /// Terminal error for the failure variants, `None` for payload variants.
    pub fn error(&self) -> Option<RenderError> {
        match self {
            ResponseEnvelope::RawPixelBuffer { .. }
            | ResponseEnvelope::TgaImage { .. }
            | ResponseEnvelope::GlbStream { .. } => None,
            ResponseEnvelope::BackendError { message } => Some(RenderError::UpstreamReported(message.clone())),
            ResponseEnvelope::Unavailable { detail } => Some(RenderError::UpstreamUnavailable(detail.clone())),
            ResponseEnvelope::Truncated { fault, .. } => Some(fault_error(fault)),
            ResponseEnvelope::Malformed { reason } => Some(RenderError::MalformedResponse(reason.clone())),
        }
    }
}

fn fault_error(fault: &ReadFault) -> RenderError {
    match fault {
        ReadFault::Eof | ReadFault::Reset => RenderError::UpstreamTruncated,
        ReadFault::Refused => RenderError::UpstreamUnavailable(fault.to_string()),
        ReadFault::Other(e) => RenderError::UpstreamIo(e.clone()),
    }
}

/// Text after [`ERROR_PREFIX`] if `window` is a structured backend error.
pub fn backend_error_message(window: &[u8]) -> Option<String> {
    let end = window.iter().position(|b| *b == 0).unwrap_or(window.len());
    let text = window[..end].strip_prefix(ERROR_PREFIX.as_bytes())?;
    Some(String::from_utf8_lossy(text).into_owned())
}

/// Error for a read that failed after classification (mid pixel data).
pub fn read_failure(window: &[u8], fault: &ReadFault) -> RenderError {
    match backend_error_message(window) {
        Some(message) => RenderError::UpstreamReported(message),
        None => fault_error(fault),
    }
}

/// Decide what the backend answered for a `format` request. Raster headers
/// wider or taller than `max_side` are malformed.
pub fn classify(format: ResponseFormat, max_side: u32, probe: &Probe) -> ResponseEnvelope {
    let window = &probe.window[..];
    if let Some(message) = backend_error_message(window) {
        return ResponseEnvelope::BackendError { message };
    }
    if let Some(ReadFault::Refused) = &probe.fault {
        return ResponseEnvelope::Unavailable { detail: ReadFault::Refused.to_string() };
    }

    let truncated = || match &probe.fault {
        Some(fault) => ResponseEnvelope::Truncated { partial: probe.window.clone(), fault: fault.clone() },
        None => ResponseEnvelope::Malformed { reason: "short probe window".into() },
    };

    match format {
        ResponseFormat::Glb => {
            let Some(header) = GlbHeader::parse(window) else {
                return truncated();
            };
            if header.magic != GLB_MAGIC {
                return ResponseEnvelope::Malformed { reason: format!("bad glb magic {:#010x}", header.magic) };
            }
            if probe.fault.is_some() && (header.length as usize) > window.len() {
                return truncated();
            }
            ResponseEnvelope::GlbStream { declared_len: header.length }
        }
        ResponseFormat::Png | ResponseFormat::Tga => {
            let Some(header) = TgaHeader::parse(window) else {
                return truncated();
            };
            if let Err(reason) = header.check(max_side) {
                return ResponseEnvelope::Malformed { reason };
            }
            if probe.fault.is_some() && TGA_HEADER_LEN + header.pixel_len() > window.len() {
                return truncated();
            }
            if format == ResponseFormat::Tga {
                ResponseEnvelope::TgaImage { header }
            } else {
                // check() guarantees positive dimensions
                ResponseEnvelope::RawPixelBuffer {
                    width: header.width as u16,
                    height: header.height as u16,
                    bytes_per_pixel: header.bits_per_pixel / 8,
                }
            }
        }
    }
}
