//! HTTP API for the Segment Editor
//!
//! Serves the embedded editor UI, the editing/export endpoints, and the SSE
//! event stream.

pub mod handlers;
pub mod sse;

mod server;

pub use server::{build_router, AppContext};
