//! miigate gateway library entry.
//!
//! Wires config, the nnid store, the backend transport and the render
//! handler into an axum router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod render;
pub mod router;
pub mod store;
pub mod transport;
