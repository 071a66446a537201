//! Routing surface collaborators: configuration, middleware, handlers.

pub mod config;
pub mod handlers;
pub mod middleware;

pub use config::{NetworkConfig, TlsConfig};
pub use handlers::AppState;
pub use middleware::build_http_layers;
