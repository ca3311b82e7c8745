//! Axum router wiring.
//!
//! All three render routes share one handler; the path suffix picks the
//! output container. Anything else gets a plain 404 pointing at the PNG route.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{routing::get, Router};

use crate::{app_state::AppState, render};

pub const PNG_ROUTE: &str = "/miis/image.png";
pub const GLB_ROUTE: &str = "/miis/image.glb";
pub const TGA_ROUTE: &str = "/miis/image.tga";

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(PNG_ROUTE, get(render::render_image).post(render::render_image))
        .route(GLB_ROUTE, get(render::render_image).post(render::render_image))
        .route(TGA_ROUTE, get(render::render_image).post(render::render_image))
        .fallback(not_found_hint)
        .with_state(state)
}

async fn not_found_hint() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, format!("you are probably looking for {PNG_ROUTE}\n"))
}
