//! Radix-tree HTTP request router.
//!
//! Routes are registered per HTTP method into a compressed prefix tree and
//! looked up in time proportional to the path length. `:name` segments and a
//! trailing `*name` capture parameters.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::RouterConfig;
pub use http::Server;
pub use lifecycle::Shutdown;
pub use routing::{Params, PathTree, RouteError, Router};
