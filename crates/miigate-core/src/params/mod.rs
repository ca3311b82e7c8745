//! Query parameter resolution.
//!
//! Turns the raw query string pairs of a render request into a fully
//! defaulted, bounds-checked [`RenderParameters`]. No I/O happens here: the
//! gateway resolves an `nnid` key to store data itself and hands the bytes
//! back to [`resolve`].

pub mod color;
pub mod payload;
pub mod tables;

use crate::error::{RenderError, Result};
use crate::protocol::request::{ExpressionFlags, EXPRESSION_FLAG_LIMIT};
use crate::protocol::ResponseFormat;

pub use color::{parse_hex_color, ParsedColor, Rgba};

pub const DEFAULT_WIDTH: i64 = 270;
pub const DEFAULT_SSAA_FACTOR: i64 = 2;
pub const MAX_WIDTH: i64 = 4096;
pub const MIN_TEX_RESOLUTION: i64 = 2;
pub const MAX_TEX_RESOLUTION: i64 = 6000;
pub const MAX_SSAA_FACTOR: i64 = 2;
pub const MAX_INSTANCE_COUNT: u8 = 20;
/// Below this output width the texture resolution is doubled.
pub const LOW_RES_THRESHOLD: i64 = 256;
/// Out-of-band mipmap bit older clients OR into `texResolution`.
pub const TEX_RESOLUTION_MIPMAP_BIT: i64 = 1 << 30;

/// Query string pairs in arrival order. Keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// First value for `key`, empty values included.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Every value for `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// First value for `key`, treating an empty value like an absent key.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Default-on flag: absent is true, `0` is false, anything else is true.
    pub fn flag_default_on(&self, key: &str) -> bool {
        self.get(key) != Some("0")
    }

    /// Presence flag: true when the key carries a non-empty value.
    pub fn flag_present(&self, key: &str) -> bool {
        self.value(key).is_some()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where the avatar payload comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Decoded `data` parameter.
    Inline(Vec<u8>),
    /// `nnid` key for the external store, as supplied.
    Nnid(String),
}

/// Pick the payload source. `nnid` wins over `data` when both are present.
pub fn data_source(q: &QueryParams) -> Result<DataSource> {
    if q.value("pnid").is_some() || q.get("api_id") == Some("1") {
        return Err(RenderError::NotImplemented("pnid lookup is not supported yet".into()));
    }
    if let Some(nnid) = q.value("nnid") {
        return Ok(DataSource::Nnid(nnid.to_string()));
    }
    match q.value("data") {
        Some(data) => Ok(DataSource::Inline(payload::decode_store_data(data)?)),
        None => Err(RenderError::Validation(
            "specify \"data\" as store data or studio data in hex/base64, or \"nnid\" as an nnid".into(),
        )),
    }
}

/// Fully resolved render job.
///
/// Resolutions are final: supersampling and the low-resolution texture
/// boost have already been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParameters {
    pub store_data: Vec<u8>,
    pub format: ResponseFormat,
    pub resolution: u16,
    pub tex_resolution: i16,
    pub mipmap: bool,
    /// Factor to remove again by downscaling; 1 means none.
    pub ssaa_factor: u8,
    pub view_type: u8,
    pub model_type: u8,
    pub flatten_nose: bool,
    pub split_mode: u8,
    pub draw_stage_mode: u8,
    pub expression: u8,
    pub expression_flags: ExpressionFlags,
    pub camera_rotate: [i16; 3],
    pub model_rotate: [i16; 3],
    pub light_direction: [i16; 3],
    pub background: Rgba,
    pub clothes_color: i8,
    pub pants_color: i8,
    pub body_type: i8,
    pub resource_type: i8,
    pub shader_type: u8,
    pub hat_type: u8,
    pub hat_color: u8,
    pub light_enable: bool,
    pub verify_char_info: bool,
    pub verify_crc16: bool,
    pub instance_count: u8,
}

fn parse_int(q: &QueryParams, key: &str, default: i64) -> Result<(i64, bool)> {
    match q.value(key) {
        None => Ok((default, false)),
        Some(s) => s
            .trim()
            .parse::<i64>()
            .map(|n| (n, true))
            .map_err(|_| RenderError::invalid(key, "must be an integer")),
    }
}

/// Lenient 3-axis integer: unparseable axes keep their default.
fn parse_vec3(q: &QueryParams, keys: [&str; 3], default: i16) -> [i16; 3] {
    keys.map(|k| {
        q.value(k)
            .and_then(|s| s.trim().parse::<i16>().ok())
            .unwrap_or(default)
    })
}

fn resolve_expression(raw: &str, resource_type: i8) -> Result<u8> {
    let expression = tables::resolve("expression", Some(raw), tables::EXPRESSIONS, tables::EXPRESSION_NORMAL)?;
    if expression > tables::EXPRESSION_MIDDLE_MAX && resource_type == tables::RESOURCE_TYPE_MIDDLE {
        return Err(RenderError::invalid(
            "expression",
            format!("{expression} is not available with the middle resource"),
        ));
    }
    Ok(expression)
}

fn narrow<T: TryFrom<i64>>(field: &str, v: i64) -> Result<T> {
    T::try_from(v).map_err(|_| RenderError::invalid(field, format!("{v} is out of range")))
}

/// Resolve every parameter for a render of `format` over `store_data`.
pub fn resolve(q: &QueryParams, format: ResponseFormat, store_data: Vec<u8>) -> Result<RenderParameters> {
    payload::check_length(&store_data)?;

    let background = match q.value("bgColor") {
        None => Rgba::TRANSPARENT_WHITE,
        Some(s) => {
            let parsed = parse_hex_color(s).map_err(|e| RenderError::invalid("bgColor", e))?;
            if parsed.alpha_zero {
                tracing::debug!(bg_color = %s, "background color has zero alpha");
            }
            parsed.color
        }
    };

    let instance_count = match q.value("instanceCount") {
        None => 1,
        Some(s) => match s.trim().parse::<u8>() {
            Ok(n) if n <= MAX_INSTANCE_COUNT => n,
            _ => {
                return Err(RenderError::invalid(
                    "instanceCount",
                    format!("must be a number no greater than {MAX_INSTANCE_COUNT}"),
                ))
            }
        },
    };

    let view_type: u8 = tables::resolve("type", q.value("type"), tables::VIEW_TYPES, 0)?;
    let model_type: u8 = tables::resolve("modelType", q.value("modelType"), tables::MODEL_TYPES, 0)?;
    if model_type > tables::MODEL_TYPE_MAX {
        return Err(RenderError::invalid("modelType", "valid model types: normal, hat, face_only"));
    }
    let split_mode: u8 = tables::resolve("splitMode", q.value("splitMode"), tables::SPLIT_MODES, 0)?;
    let draw_stage_mode: u8 =
        tables::resolve("drawStageMode", q.value("drawStageMode"), tables::DRAW_STAGE_MODES, 0)?;

    let resource_type: i8 =
        tables::resolve("resourceType", q.value("resourceType"), tables::RESOURCE_TYPES, -1)?;

    // Single expression: the first listed one. Extra comma-joined values only
    // mean something to glTF export below.
    let first_expression = q.get("expression").unwrap_or("").split(',').next().unwrap_or("");
    let expression = resolve_expression(first_expression, resource_type)?;

    let mut expression_flags = ExpressionFlags::default();
    if format == ResponseFormat::Glb && q.has("expression") {
        for raw in q.get_all("expression").flat_map(|v| v.split(',')) {
            let index = resolve_expression(raw.trim(), resource_type)?;
            if !expression_flags.set(usize::from(index)) {
                tracing::debug!(index, limit = EXPRESSION_FLAG_LIMIT, "expression flag index out of range");
            }
        }
    }

    let clothes_color: i8 =
        tables::resolve("clothesColor", q.value("clothesColor"), tables::CLOTHES_COLORS, -1)?;
    let pants_color: i8 = tables::resolve("pantsColor", q.value("pantsColor"), tables::PANTS_COLORS, -1)?;
    let body_type: i8 = tables::resolve("bodyType", q.value("bodyType"), tables::BODY_TYPES, -1)?;
    let shader_type: u8 = tables::resolve("shaderType", q.value("shaderType"), tables::SHADER_TYPES, 0)?;
    let hat_type: u8 = tables::resolve("hatType", q.value("hatType"), &[], 0)?;
    let hat_color: u8 = tables::resolve("hatColor", q.value("hatColor"), &[], 0)?;

    let (mut width, width_given) = parse_int(q, "width", DEFAULT_WIDTH)?;
    if width < 1 {
        return Err(RenderError::invalid("width", "must be positive"));
    }
    if width > MAX_WIDTH {
        return Err(RenderError::invalid("width", format!("the limit is {MAX_WIDTH}")));
    }

    let (mut tex_resolution, tex_override) = parse_int(q, "texResolution", width)?;
    let mut mipmap = q.flag_present("mipmapEnable");
    if tex_override && tex_resolution & TEX_RESOLUTION_MIPMAP_BIT != 0 {
        tex_resolution &= !TEX_RESOLUTION_MIPMAP_BIT;
        mipmap = true;
    }
    if !(MIN_TEX_RESOLUTION..=MAX_TEX_RESOLUTION).contains(&tex_resolution) {
        return Err(RenderError::invalid(
            "texResolution",
            format!("must be between {MIN_TEX_RESOLUTION} and {MAX_TEX_RESOLUTION}"),
        ));
    }

    let (mut ssaa_factor, _) = parse_int(q, "scale", DEFAULT_SSAA_FACTOR)?;
    if !(1..=MAX_SSAA_FACTOR).contains(&ssaa_factor) {
        return Err(RenderError::invalid("scale", format!("must be between 1 and {MAX_SSAA_FACTOR}")));
    }

    let camera_rotate = parse_vec3(q, ["cameraXRotate", "cameraYRotate", "cameraZRotate"], 0);
    let model_rotate = parse_vec3(q, ["characterXRotate", "characterYRotate", "characterZRotate"], 0);
    let light_direction = parse_vec3(q, ["lightXDirection", "lightYDirection", "lightZDirection"], -1);

    // Order matters: low-res boost first, then supersampling.
    if width < LOW_RES_THRESHOLD && !tex_override {
        tex_resolution *= 2;
    }
    if draw_stage_mode == tables::DRAW_STAGE_MASK_ONLY {
        if width_given {
            tex_resolution = width;
        } else {
            width = tex_resolution;
        }
        if width > MAX_WIDTH {
            return Err(RenderError::invalid(
                "texResolution",
                format!("mask output is sized by the texture, the limit is {MAX_WIDTH}"),
            ));
        }
        ssaa_factor = 1;
    } else {
        width *= ssaa_factor;
        if !tex_override {
            tex_resolution *= ssaa_factor;
        }
    }

    Ok(RenderParameters {
        store_data,
        format,
        resolution: narrow("width", width)?,
        tex_resolution: narrow("texResolution", tex_resolution)?,
        mipmap,
        ssaa_factor: narrow("scale", ssaa_factor)?,
        view_type,
        model_type,
        flatten_nose: q.flag_present("flattenNose"),
        split_mode,
        draw_stage_mode,
        expression,
        expression_flags,
        camera_rotate,
        model_rotate,
        light_direction,
        background,
        clothes_color,
        pants_color,
        body_type,
        resource_type,
        shader_type,
        hat_type,
        hat_color,
        light_enable: q.flag_default_on("lightEnable"),
        verify_char_info: q.flag_default_on("verifyCharInfo"),
        verify_crc16: q.flag_default_on("verifyCRC16"),
        instance_count,
    })
}
