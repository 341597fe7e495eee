//! Public entry points: the HTTP API.

pub mod http;

pub use http::{router, AppState};
