//! miigate core: query resolution, the backend wire contract, response
//! classification, and raster post-processing.
//!
//! This crate carries no transport or runtime dependencies. The gateway owns
//! the sockets and HTTP surface and drives everything here as pure functions
//! over bytes and typed values.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `RenderError`/`Result` so a hostile query
//! string or a misbehaving backend never takes the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod compositor;
pub mod container;
pub mod error;
pub mod params;
pub mod protocol;

/// Shared result type.
pub use error::{RenderError, Result};
