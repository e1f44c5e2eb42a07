//! HTTP layer around the route table.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum fallback, tower layers)
//!     → request.rs (request ID)
//!     → routing::Router lookup (method + decoded path)
//!     → context.rs (params, query, body; handler chain writes the response)
//!     → static_dir routes: ServeDir on the catch-all value
//!     → miss: 405 / trailing-slash redirect / not-found handler
//!     → Send to client
//! ```

pub mod context;
pub mod echo;
pub mod request;
pub mod server;

pub use context::{handler, Context, FormError, Handler, PanicHandler, RoutePattern, Validate};
pub use request::X_REQUEST_ID;
pub use server::{app, apply_reloads, serve, Endpoint, Server, SharedServer};
