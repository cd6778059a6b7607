//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → /_chaos/*  → admin (management surface)
//!     → otherwise  → chaos engine verdict
//!         → timeout / error → response.rs (injected JSON bodies)
//!         → forward         → forward.rs (rewrite, stream to target)
//!                           → response.rs (X-Chaos-* markers)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
