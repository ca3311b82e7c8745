use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use miigate_core::error::RenderError;

/// HTTP face of a [`RenderError`]: status from the client code, JSON body
/// `{ "error": CODE, "message": text }`.
#[derive(Debug)]
pub struct ApiError(pub RenderError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::warn!(code = code.as_str(), %message, "render failed");
        } else {
            tracing::debug!(code = code.as_str(), %message, "render rejected");
        }

        (status, Json(json!({ "error": code.as_str(), "message": message }))).into_response()
    }
}
