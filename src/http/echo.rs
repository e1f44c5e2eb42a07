//! Built-in handler for routes declared in configuration.

use axum::http::StatusCode;
use serde::Serialize;

use crate::http::context::{handler, Context, Handler};

#[derive(Debug, Serialize)]
struct EchoParam<'a> {
    name: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct EchoResponse<'a> {
    route: &'a str,
    pattern: Option<&'a str>,
    method: &'a str,
    path: &'a str,
    params: Vec<EchoParam<'a>>,
}

fn respond(ctx: &mut Context, route: &str) {
    let body = serde_json::to_value(EchoResponse {
        route,
        pattern: ctx.route(),
        method: ctx.method().as_str(),
        path: ctx.path(),
        params: ctx
            .params()
            .map(|(name, value)| EchoParam { name, value })
            .collect(),
    });

    match body {
        Ok(body) => ctx.json(StatusCode::OK, &body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build echo response");
            ctx.text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
    }
}

/// Handler that replies with the route name, method, path and parameters as JSON.
pub fn echo(route: impl Into<String>) -> Handler {
    let route = route.into();
    handler(move |ctx| respond(ctx, &route))
}
