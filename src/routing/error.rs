//! Route registration errors.
//!
//! Every variant is a configuration mistake in a route declaration. They are
//! raised while the route table is built and are meant to abort startup.

use thiserror::Error;

/// Errors raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The path is empty or does not begin with `/`.
    #[error("path '{path}' must begin with '/'")]
    MissingLeadingSlash { path: String },

    /// A handler chain is already registered for this exact path.
    #[error("duplicate handlers for path '{path}'")]
    DuplicateRoute { path: String },

    /// A different wildcard already occupies the same branch point.
    #[error("wildcard '{wildcard}' in path '{path}' conflicts with existing wildcard '{existing}'")]
    WildcardConflict {
        path: String,
        wildcard: String,
        existing: String,
    },

    /// A catch-all is followed by more path content.
    #[error("catch-all routes are only allowed at the end of the path in '{path}'")]
    CatchAllNotLast { path: String },

    /// A catch-all is not directly preceded by `/`.
    #[error("no '/' before catch-all in path '{path}'")]
    CatchAllWithoutSlash { path: String },

    /// A single path segment holds more than one wildcard marker.
    #[error("only one wildcard per path segment is allowed in '{path}'")]
    MultipleWildcards { path: String },

    /// A `:` or `*` marker without a name.
    #[error("wildcards must be named with a non-empty name in path '{path}'")]
    EmptyWildcardName { path: String },

    /// The handler chain has no handlers.
    #[error("empty handler chain for '{method} {path}'")]
    EmptyHandlerChain { method: String, path: String },

    /// The method is empty or not an HTTP token.
    #[error("invalid HTTP method '{method}'")]
    InvalidMethod { method: String },
}

impl RouteError {
    /// Returns true for conflicts with routes that are already registered,
    /// as opposed to errors in the pattern itself.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RouteError::DuplicateRoute { .. } | RouteError::WildcardConflict { .. }
        )
    }
}
