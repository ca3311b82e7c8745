//! Transport layer (backend TCP).
//!
//! One connection per render: write the request record, read the probe window,
//! then hand the still-open socket to whichever response path classification
//! picked.

pub mod backend;
