//! Render endpoints.
//!
//! - `handler`: query -> request record -> backend -> container
//! - `error`: JSON error responses
//! - `headers`: CORS and download headers added to every render response

pub mod error;
pub mod handler;
pub mod headers;

pub use handler::render_image;
