//! HTTP API: routing, permission gate, and request/response mapping.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
pub mod session;
