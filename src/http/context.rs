//! Per-request context handed to handler chains.
//!
//! # Responsibilities
//! - Expose the request (method, decoded path, query, form, headers, body)
//! - Expose the parameters captured by the route tree
//! - Collect the response written by the chain
//!
//! # Design Decisions
//! - Handlers are synchronous closures over `&mut Context`
//! - A chain stops at the first handler that writes a response
//! - Parameters are value ranges into the path, named by the matched route;
//!   the range buffer comes from the server's pool and goes back after the chain

use std::ops::Range;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::routing::pattern::param_name_ranges;
use crate::routing::ParamRanges;

/// A single step in a handler chain.
pub type Handler = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// Called with the panic message when a handler panics.
pub type PanicHandler = Arc<dyn Fn(&mut Context, &str) + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Context) + Send + Sync + 'static,
{
    Arc::new(f)
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A registered pattern and the positions of its parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    pattern: Box<str>,
    names: Box<[Range<usize>]>,
}

impl RoutePattern {
    /// `pattern` must already be a valid route pattern.
    pub fn new(pattern: &str) -> Self {
        Self {
            names: param_name_ranges(pattern).into_boxed_slice(),
            pattern: pattern.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().filter_map(|r| self.pattern.get(r.clone()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names().position(|n| n == name)
    }
}

/// Failure to decode or validate form input.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("invalid form input: {0}")]
    Decode(#[from] serde_urlencoded::de::Error),

    #[error("{0}")]
    Invalid(String),
}

/// Semantic checks run after a form decodes.
///
/// The error is the message shown to the client.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Request state plus the pending response.
pub struct Context {
    method: Method,
    uri: Uri,
    path: String,
    headers: HeaderMap,
    body: Bytes,
    route: Option<Arc<RoutePattern>>,
    params: ParamRanges,
    response: Option<Response>,
    response_headers: HeaderMap,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("route", &self.route())
            .field("params", &self.params().collect::<Vec<_>>())
            .field("written", &self.is_written())
            .finish()
    }
}

impl Context {
    /// `path` is the percent-decoded form of `uri.path()`.
    pub fn new(method: Method, uri: Uri, path: String, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            uri,
            path,
            headers,
            body,
            route: None,
            params: ParamRanges::new(),
            response: None,
            response_headers: HeaderMap::new(),
        }
    }

    /// Attach the matched route and the ranges its lookup filled in.
    pub(crate) fn set_match(&mut self, route: Arc<RoutePattern>, params: ParamRanges) {
        self.route = Some(route);
        self.params = params;
    }

    /// Hand the parameter buffer back, leaving the context without params.
    pub(crate) fn take_params(&mut self) -> ParamRanges {
        self.route = None;
        std::mem::take(&mut self.params)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Decoded request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Pattern of the matched route, if any.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref().map(RoutePattern::as_str)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Value of the route parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        let index = self.route.as_deref()?.position(name)?;
        self.params.get(&self.path, index)
    }

    /// Route parameters as `(name, value)` in declaration order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.route
            .as_deref()
            .into_iter()
            .flat_map(RoutePattern::names)
            .zip(self.params.values(&self.path))
    }

    /// First query string value for `name`, form-decoded.
    pub fn query(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    /// Whether the body is a url-encoded form.
    fn has_form_body(&self) -> bool {
        self.header(header::CONTENT_TYPE.as_str())
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    }

    /// Form values from a url-encoded body followed by the query string.
    pub fn form(&self) -> Vec<(String, String)> {
        let body: &[u8] = if self.has_form_body() { &self.body } else { &[] };
        let query = self.uri.query().unwrap_or("").as_bytes();

        url::form_urlencoded::parse(body)
            .chain(url::form_urlencoded::parse(query))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// First form value for `name`; body values win over the query string.
    pub fn form_value(&self, name: &str) -> Option<String> {
        self.form()
            .into_iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Decode the form into `T`. Repeated names keep their first value.
    pub fn parse_form<T: DeserializeOwned>(&self) -> Result<T, FormError> {
        let mut seen: Vec<(String, String)> = Vec::new();
        for (k, v) in self.form() {
            if !seen.iter().any(|(s, _)| *s == k) {
                seen.push((k, v));
            }
        }

        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(seen)
            .finish();
        Ok(serde_urlencoded::from_str(&encoded)?)
    }

    /// Decode the form into `T` and run its checks.
    pub fn parse_validate_form<T>(&self) -> Result<T, FormError>
    where
        T: DeserializeOwned + Validate,
    {
        let input: T = self.parse_form()?;
        input.validate().map_err(FormError::Invalid)?;
        Ok(input)
    }

    /// Request id assigned by the request-id layer.
    pub fn request_id(&self) -> Option<&str> {
        self.header(crate::http::request::X_REQUEST_ID.as_str())
    }

    /// Whether a handler already wrote the response.
    pub fn is_written(&self) -> bool {
        self.response.is_some()
    }

    /// Add a header to whatever response is eventually sent.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response_headers.insert(name, value);
    }

    fn write(&mut self, status: StatusCode, content_type: HeaderValue, body: impl Into<Body>) {
        let mut response = Response::new(body.into());
        *response.status_mut() = status;
        response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        self.response = Some(response);
    }

    /// Use `response` as is. Headers set on the context are still added.
    pub(crate) fn write_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Respond with an empty body.
    pub fn status(&mut self, status: StatusCode) {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = status;
        self.response = Some(response);
    }

    /// Respond with plain text.
    pub fn text(&mut self, status: StatusCode, body: impl Into<String>) {
        self.write(
            status,
            HeaderValue::from_static("text/plain; charset=utf-8"),
            body.into(),
        );
    }

    /// Respond with raw bytes. An unusable content type falls back to
    /// `application/octet-stream`.
    pub fn bytes(&mut self, status: StatusCode, content_type: &str, body: impl Into<Bytes>) {
        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
        self.write(status, content_type, body.into());
    }

    /// Respond with `value` serialized as JSON.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.write(status, HeaderValue::from_static("application/json"), bytes),
            Err(e) => {
                tracing::error!(error = %e, path = %self.path, "Failed to serialize JSON response");
                self.text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
            }
        }
    }

    /// Respond with a redirect to `location`.
    pub fn redirect(&mut self, status: StatusCode, location: &str) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.status(status);
                self.set_header(header::LOCATION, value);
            }
            Err(_) => self.text(StatusCode::INTERNAL_SERVER_ERROR, "invalid redirect location"),
        }
    }

    /// Discard any response written so far.
    pub(crate) fn reset_response(&mut self) {
        self.response = None;
    }

    /// Status of the written response, 200 if nothing was written.
    pub fn response_status(&self) -> StatusCode {
        self.response
            .as_ref()
            .map_or(StatusCode::OK, |r| r.status())
    }

    /// Finish the request. An unwritten response becomes an empty 200.
    pub fn into_response(self) -> Response {
        let mut response = self.response.unwrap_or_else(|| Response::new(Body::empty()));
        response.headers_mut().extend(self.response_headers);
        response
    }
}
