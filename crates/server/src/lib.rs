//! HTTP server for the Krishimitra query engine

pub mod http;
pub mod state;

pub use http::{build_router, serve};
pub use state::AppState;
