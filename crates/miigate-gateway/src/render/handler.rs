//! Render handler.
//!
//! Per request, in order: payload source, parameter resolution, request
//! record, backend probe, classification, then one of two response paths:
//! - PNG / TGA: read the exact pixel payload, downscale, encode, answer with
//!   a fully buffered body (nothing is committed before the last byte).
//! - glTF: stream the backend bytes through, capped at the declared length.

use std::time::Instant;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::Local;
use futures_util::StreamExt;
use tracing::Instrument;

use miigate_core::compositor::{self, Raster};
use miigate_core::container;
use miigate_core::error::{RenderError, Result};
use miigate_core::params::{self, DataSource, QueryParams};
use miigate_core::protocol::request::RenderRequest;
use miigate_core::protocol::response::{classify, ResponseEnvelope, TGA_HEADER_LEN};
use miigate_core::protocol::ResponseFormat;

use crate::app_state::AppState;
use crate::render::error::ApiError;
use crate::render::headers;
use crate::transport::backend::Exchange;

/// Filename label for renders of inline data.
const INLINE_LABEL: &str = "mii-data";

pub async fn render_image(
    State(app): State<AppState>,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let format = ResponseFormat::from_path(uri.path());
    let query = QueryParams::from_pairs(pairs);
    let span = tracing::info_span!("render", format = format.as_str());

    let mut resp = async {
        match render(&app, format, &query).await {
            Ok(resp) => resp,
            Err(e) => ApiError(e).into_response(),
        }
    }
    .instrument(span)
    .await;

    headers::apply_cors(app.cfg().gateway.cors_origin.as_deref(), resp.headers_mut());
    resp
}

async fn render(app: &AppState, format: ResponseFormat, query: &QueryParams) -> Result<Response> {
    let mut timer = StageTimer::new(app.cfg().gateway.timing_log);

    let (store_data, label) = match params::data_source(query)? {
        DataSource::Inline(data) => (data, INLINE_LABEL.to_string()),
        DataSource::Nnid(nnid) => {
            let data = lookup_nnid(app, &nnid).await?;
            timer.lap("nnid lookup");
            (data, nnid)
        }
    };

    let params = params::resolve(query, format, store_data)?;
    let request = RenderRequest::from_params(&params);
    tracing::debug!(
        resolution = params.resolution,
        tex_resolution = params.tex_resolution,
        ssaa = params.ssaa_factor,
        "render request resolved"
    );

    let exchange = app.backend().exchange(&request).await?;
    timer.lap("backend exchange");

    let factor = u32::from(params.ssaa_factor);
    match classify(format, request.max_response_side(), &exchange.probe) {
        ResponseEnvelope::GlbStream { declared_len } => Ok(glb_response(exchange, declared_len, label)),
        ResponseEnvelope::RawPixelBuffer { width, height, bytes_per_pixel } => {
            let (width, height) = (u32::from(width), u32::from(height));
            let len = width as usize * height as usize * usize::from(bytes_per_pixel);
            let pixels = app.backend().within(exchange.read_body(TGA_HEADER_LEN, len)).await?;
            timer.lap("pixel read");

            let raster = downscale(width, height, pixels, factor).await?;
            timer.lap("downscale");
            let png = blocking(move || container::encode_png(&raster)).await?;
            timer.lap("png encode");
            Ok(buffered(format, png))
        }
        ResponseEnvelope::TgaImage { header } => {
            let pixels = app.backend().within(exchange.read_body(TGA_HEADER_LEN, header.pixel_len())).await?;
            timer.lap("pixel read");

            let dim = |v: i16| {
                u32::try_from(v).map_err(|_| RenderError::MalformedResponse(format!("tga dimension {v}")))
            };
            let raster = downscale(dim(header.width)?, dim(header.height)?, pixels, factor).await?;
            timer.lap("downscale");
            let tga = blocking(move || container::encode_tga(&raster, &header)).await?;
            timer.lap("tga encode");
            Ok(buffered(format, tga))
        }
        other => Err(other
            .error()
            .unwrap_or_else(|| RenderError::Internal("unhandled backend response".into()))),
    }
}

async fn lookup_nnid(app: &AppState, nnid: &str) -> Result<Vec<u8>> {
    let store = app
        .store()
        .ok_or_else(|| RenderError::NotImplemented("nnid lookup is not configured".into()))?;
    store
        .fetch(nnid)
        .await?
        .ok_or_else(|| RenderError::NotFound(format!("did not find that nnid: {nnid}")))
}

async fn downscale(width: u32, height: u32, pixels: Vec<u8>, factor: u32) -> Result<Raster> {
    blocking(move || compositor::downscale(Raster::new(width, height, pixels)?, factor)).await
}

/// Run CPU-bound compositing off the async workers.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RenderError::Internal(format!("compositing task failed: {e}")))?
}

/// Complete body. TGA pins `Content-Length` to the exact container size;
/// PNG leaves framing to the HTTP layer.
fn buffered(format: ResponseFormat, body: Vec<u8>) -> Response {
    let len = body.len();
    let mut resp = (StatusCode::OK, [(header::CONTENT_TYPE, format.content_type())], body).into_response();
    if format == ResponseFormat::Tga {
        resp.headers_mut().insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    resp
}

fn glb_response(exchange: Exchange, declared_len: u32, label: String) -> Response {
    let filename = headers::glb_filename(Local::now(), &label);
    let body = exchange.into_body_stream(u64::from(declared_len)).inspect(move |chunk| {
        if let Err(e) = chunk {
            tracing::warn!(error = %e, label = %label, declared_len, "glb stream ended early");
        }
    });

    let mut resp = Response::new(Body::from_stream(body));
    let h = resp.headers_mut();
    h.insert(header::CONTENT_TYPE, HeaderValue::from_static(ResponseFormat::Glb.content_type()));
    h.insert(header::CONTENT_LENGTH, HeaderValue::from(declared_len));
    if let Some(v) = headers::attachment(&filename) {
        h.insert(header::CONTENT_DISPOSITION, v);
    }
    resp
}

struct StageTimer {
    enabled: bool,
    last: Instant,
}

impl StageTimer {
    fn new(enabled: bool) -> Self {
        Self { enabled, last: Instant::now() }
    }

    fn lap(&mut self, stage: &'static str) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.last).as_secs_f64() * 1000.0;
        tracing::info!(stage, elapsed_ms, "render stage");
        self.last = now;
    }
}
