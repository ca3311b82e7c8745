use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Local};

/// Cross-origin headers for a configured origin. Invalid header text is
/// skipped.
pub fn apply_cors(origin: Option<&str>, headers: &mut HeaderMap) {
    let Some(origin) = origin else {
        return;
    };
    let Ok(origin) = HeaderValue::from_str(origin) else {
        tracing::debug!(origin, "cors origin is not a valid header value");
        return;
    };
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    headers.insert(
        HeaderName::from_static("access-control-allow-private-network"),
        HeaderValue::from_static("true"),
    );
}

/// `YYYY-MM-DD_HH-MM-SS-<label>.glb`
pub fn glb_filename(at: DateTime<Local>, label: &str) -> String {
    format!("{}-{label}.glb", at.format("%Y-%m-%d_%H-%M-%S"))
}

pub fn attachment(filename: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("attachment; filename={filename}")).ok()
}
