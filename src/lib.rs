//! Fault-injecting HTTP reverse proxy library

pub mod admin;
pub mod chaos;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use chaos::ChaosEngine;
pub use config::schema::ChaosConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
