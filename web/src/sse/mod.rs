//! SSE HTTP handler for the web layer.
//!
//! This module contains only the Axum handler for SSE endpoints.
//! The event bus and stream controller live in the `sse` crate so the
//! domain event bridge does not depend on the web layer.

pub mod handler;
