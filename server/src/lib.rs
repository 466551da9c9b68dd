//! Employee directory server: configuration and the HTTP endpoint layer.

pub mod config;
pub mod http;

pub use config::AppConfig;
pub use http::{AppState, ServeConfig, build_router, serve};
