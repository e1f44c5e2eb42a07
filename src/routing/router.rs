//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Keep one [`PathTree`] per HTTP method, built independently
//! - Register handler chains at startup, failing loudly on conflicts
//! - Look up the handler chain and parameters for a request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Methods are few, so trees live in a small vector scanned linearly
//! - Explicit no-match rather than silent default

use std::fmt;
use std::ops::Deref;

use crate::routing::error::RouteError;
use crate::routing::params::{ParamRanges, Params};
use crate::routing::tree::PathTree;

/// Non-empty, ordered sequence of handlers registered for one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerChain<H>(Box<[H]>);

impl<H> HandlerChain<H> {
    /// Returns `None` when `handlers` is empty.
    pub fn new(handlers: impl IntoIterator<Item = H>) -> Option<Self> {
        let handlers: Box<[H]> = handlers.into_iter().collect();
        if handlers.is_empty() {
            None
        } else {
            Some(Self(handlers))
        }
    }
}

impl<H> Deref for HandlerChain<H> {
    type Target = [H];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct Match<'r, 'p, H> {
    pub handlers: &'r HandlerChain<H>,
    pub params: Params<'r>,
    path: &'p str,
}

impl<'r, 'p, H> Match<'r, 'p, H> {
    /// The looked-up path.
    pub fn path(&self) -> &'p str {
        self.path
    }

    /// Value captured for the parameter `name`.
    pub fn param(&self, name: &str) -> Option<&'p str> {
        self.params.get(self.path, name)
    }

    /// Captured `(name, value)` pairs in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&'r str, &'p str)> + '_ {
        self.params.iter(self.path)
    }
}

/// HTTP method names are tokens: visible ASCII without separators.
fn is_valid_method(method: &str) -> bool {
    !method.is_empty()
        && method.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// Per-method route table.
pub struct Router<H> {
    trees: Vec<(String, PathTree<HandlerChain<H>>)>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.methods().collect::<Vec<_>>())
            .field("routes", &self.route_count())
            .finish()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self { trees: Vec::new() }
    }

    fn tree(&self, method: &str) -> Option<&PathTree<HandlerChain<H>>> {
        self.trees
            .iter()
            .find(|(m, _)| m.eq_ignore_ascii_case(method))
            .map(|(_, tree)| tree)
    }

    /// Register `handlers` for `method` and the pattern `path`.
    ///
    /// The method is normalized to upper case. Any error is a mistake in the
    /// route declaration and should abort startup.
    pub fn insert(
        &mut self,
        method: &str,
        path: &str,
        handlers: impl IntoIterator<Item = H>,
    ) -> Result<(), RouteError> {
        if !is_valid_method(method) {
            return Err(RouteError::InvalidMethod { method: method.to_string() });
        }
        let method = method.to_ascii_uppercase();

        let chain = HandlerChain::new(handlers).ok_or_else(|| RouteError::EmptyHandlerChain {
            method: method.clone(),
            path: path.to_string(),
        })?;

        let pos = match self.trees.iter().position(|(m, _)| *m == method) {
            Some(pos) => pos,
            None => {
                self.trees.push((method.clone(), PathTree::new()));
                self.trees.len() - 1
            }
        };
        self.trees[pos].1.insert(path, chain)?;

        tracing::debug!(method = %method, path = %path, "Route registered");
        Ok(())
    }

    /// Look up the handler chain for `method` and `path`.
    pub fn lookup<'r, 'p>(&'r self, method: &str, path: &'p str) -> Option<Match<'r, 'p, H>> {
        let mut params = Params::with_capacity(self.max_params());
        let handlers = self.lookup_into(method, path, &mut params)?;
        Some(Match { handlers, params, path })
    }

    /// Like [`Router::lookup`], filling a caller-owned parameter buffer.
    ///
    /// The buffer must not be shared with a concurrent lookup.
    pub fn lookup_into<'r>(
        &'r self,
        method: &str,
        path: &str,
        params: &mut Params<'r>,
    ) -> Option<&'r HandlerChain<H>> {
        match self.tree(method) {
            Some(tree) => tree.lookup(path, params),
            None => {
                params.clear();
                None
            }
        }
    }

    /// Like [`Router::lookup_into`], recording only value ranges. The buffer
    /// holds no borrow of the table, so it can be pooled across requests.
    pub fn lookup_ranges(
        &self,
        method: &str,
        path: &str,
        ranges: &mut ParamRanges,
    ) -> Option<&HandlerChain<H>> {
        match self.tree(method) {
            Some(tree) => tree.lookup_ranges(path, ranges),
            None => {
                ranges.clear();
                None
            }
        }
    }

    /// Methods, other than `except`, that have a route matching `path`.
    pub fn allowed_methods(&self, path: &str, except: Option<&str>) -> Vec<&str> {
        let mut params = Params::new();
        self.trees
            .iter()
            .filter(|(m, _)| except.map_or(true, |e| !m.eq_ignore_ascii_case(e)))
            .filter(|(_, tree)| tree.lookup(path, &mut params).is_some())
            .map(|(m, _)| m.as_str())
            .collect()
    }

    /// Methods with at least one route, in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.trees.iter().map(|(m, _)| m.as_str())
    }

    /// The tree for `method`, for inspection.
    pub fn method_tree(&self, method: &str) -> Option<&PathTree<HandlerChain<H>>> {
        self.tree(method)
    }

    /// Total number of routes over all methods.
    pub fn route_count(&self) -> usize {
        self.trees.iter().map(|(_, tree)| tree.len()).sum()
    }

    /// Most parameters any single route captures, over all methods.
    pub fn max_params(&self) -> usize {
        self.trees
            .iter()
            .map(|(_, tree)| tree.max_params())
            .max()
            .unwrap_or(0)
    }
}
