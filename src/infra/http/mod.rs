//! HTTP surface: router, public page handlers and middleware.

pub mod middleware;
pub mod public;

pub use public::{HttpState, build_router, serve};
