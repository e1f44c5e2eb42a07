//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Registration (at startup):
//!     (method, pattern, handler chain)
//!     → pattern.rs (syntax checks)
//!     → router.rs (pick the method's tree)
//!     → tree.rs (split nodes, attach wildcards, detect conflicts)
//!
//! Incoming Request (method, path)
//!     → router.rs (method's tree)
//!     → tree.rs (walk segments, capture wildcards)
//!     → params.rs (positional parameter buffer)
//!     → Return: handler chain + params, or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (byte-wise prefix matching only)
//! - Deterministic: same input always matches same route
//! - Static segments win over wildcards at the same position

pub mod error;
pub mod params;
pub mod pattern;
pub mod router;
pub mod tree;

pub use error::RouteError;
pub use params::{ParamRanges, Params};
pub use router::{HandlerChain, Match, Router};
pub use tree::PathTree;
