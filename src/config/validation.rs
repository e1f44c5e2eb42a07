//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting routes by building a scratch route table
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::RouterConfig;
use crate::routing::{RouteError, Router};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("duplicate route name '{name}'")]
    DuplicateName { name: String },

    #[error("route '{name}': {source}")]
    Route { name: String, source: RouteError },

    #[error("bind address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("metrics address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("invalid log level '{0}'")]
    LogLevel(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    let mut names = HashSet::new();
    let mut scratch: Router<()> = Router::new();

    for (index, route) in config.routes.iter().enumerate() {
        let name = if route.name.is_empty() {
            errors.push(ValidationError::EmptyName { index });
            format!("#{index}")
        } else {
            if !names.insert(route.name.as_str()) {
                errors.push(ValidationError::DuplicateName { name: route.name.clone() });
            }
            route.name.clone()
        };

        if let Err(source) = scratch.insert(&route.method, &route.path, [()]) {
            errors.push(ValidationError::Route { name, source });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
