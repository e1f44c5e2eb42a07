//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Collect route registrations into a per-method route table
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch every request through the route table
//! - Answer misses with 405, a trailing-slash redirect, or the not-found handler
//! - Recover from handler panics
//! - Serve static directories under catch-all routes
//!
//! # Design Decisions
//! - The axum router only has a fallback; all matching happens in the route tree
//! - The table sits behind `ArcSwap` so a reload swaps it whole
//! - Handlers are synchronous; the body is buffered before the chain runs
//! - Parameter buffers are pooled per table and reused across requests

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, request, HeaderValue, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::{ServiceBuilder, ServiceExt};
use tower_http::services::ServeDir;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{RouterConfig, RoutingConfig};
use crate::http::context::{Context, Handler, PanicHandler, RoutePattern};
use crate::http::echo::echo;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, X_REQUEST_ID};
use crate::observability::metrics;
use crate::routing::{ParamRanges, RouteError, Router};

/// Largest request body buffered for a handler chain.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Idle parameter buffers kept per table.
const MAX_IDLE_BUFFERS: usize = 256;

/// Bytes escaped when a decoded path goes back into a `Location` header.
/// `/` is kept so segments stay segments.
const PATH_ENCODE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Route table shared with the axum fallback, replaceable at runtime.
pub type SharedServer = Arc<ArcSwap<Server>>;

#[derive(Clone)]
enum Action {
    Run(Handler),
    Files(ServeDir),
}

/// One step of a registered chain, together with the pattern it was
/// registered under.
#[derive(Clone)]
pub struct Endpoint {
    route: Arc<RoutePattern>,
    action: Action,
}

impl Endpoint {
    pub fn pattern(&self) -> &str {
        self.route.as_str()
    }

    fn handler(&self) -> Option<&Handler> {
        match &self.action {
            Action::Run(handler) => Some(handler),
            Action::Files(_) => None,
        }
    }

    fn files(&self) -> Option<&ServeDir> {
        match &self.action {
            Action::Files(dir) => Some(dir),
            Action::Run(_) => None,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.action {
            Action::Run(_) => "handler",
            Action::Files(_) => "files",
        };
        f.debug_struct("Endpoint")
            .field("pattern", &self.pattern())
            .field("kind", &kind)
            .finish()
    }
}

/// Free list of parameter buffers.
#[derive(Debug, Default)]
struct ParamPool {
    idle: Mutex<Vec<ParamRanges>>,
    created: AtomicUsize,
}

impl ParamPool {
    fn take(&self, capacity: usize) -> ParamRanges {
        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            ParamRanges::with_capacity(capacity)
        })
    }

    fn give(&self, mut ranges: ParamRanges) {
        ranges.clear();
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_BUFFERS {
                idle.push(ranges);
            }
        }
    }
}

/// Route table plus the dispatch policy around it.
pub struct Server {
    router: Router<Endpoint>,
    filters: Vec<Handler>,
    not_found: Option<Handler>,
    panic_handler: Option<PanicHandler>,
    options: RoutingConfig,
    request_timeout: Duration,
    params: ParamPool,
}

impl Default for Server {
    fn default() -> Self {
        Self::new(RoutingConfig::default())
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("router", &self.router)
            .field("filters", &self.filters.len())
            .field("options", &self.options)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Server {
    pub fn new(options: RoutingConfig) -> Self {
        Self {
            router: Router::new(),
            filters: Vec::new(),
            not_found: None,
            panic_handler: None,
            options,
            request_timeout: Duration::from_secs(30),
            params: ParamPool::default(),
        }
    }

    /// Build a server whose configured routes reply with the echo handler.
    pub fn from_config(config: &RouterConfig) -> Result<Self, RouteError> {
        let mut server = Self::new(config.routing.clone())
            .with_timeout(Duration::from_secs(config.listener.request_timeout_secs));
        for route in &config.routes {
            server.route(&route.method, &route.path, [echo(route.name.as_str())])?;
        }
        Ok(server)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn insert(
        &mut self,
        method: &str,
        path: &str,
        actions: impl IntoIterator<Item = Action>,
    ) -> Result<&mut Self, RouteError> {
        let route = Arc::new(RoutePattern::new(path));
        self.router.insert(
            method,
            path,
            actions.into_iter().map(|action| Endpoint {
                route: route.clone(),
                action,
            }),
        )?;
        Ok(self)
    }

    /// Register a handler chain for `method` and the pattern `path`.
    pub fn route<I>(&mut self, method: &str, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.insert(method, path, handlers.into_iter().map(Action::Run))
    }

    pub fn get<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("GET", path, handlers)
    }

    pub fn post<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("POST", path, handlers)
    }

    pub fn put<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("PUT", path, handlers)
    }

    pub fn delete<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("DELETE", path, handlers)
    }

    pub fn patch<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("PATCH", path, handlers)
    }

    pub fn head<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("HEAD", path, handlers)
    }

    pub fn options<I>(&mut self, path: &str, handlers: I) -> Result<&mut Self, RouteError>
    where
        I: IntoIterator<Item = Handler>,
    {
        self.route("OPTIONS", path, handlers)
    }

    /// Serve files under `dir` for GET and HEAD on `prefix/*filepath`.
    ///
    /// Filters run first and may answer instead.
    pub fn static_dir(&mut self, prefix: &str, dir: impl AsRef<Path>) -> Result<&mut Self, RouteError> {
        let pattern = format!("{}/*filepath", prefix.trim_end_matches('/'));
        let files = ServeDir::new(dir.as_ref());
        for method in ["GET", "HEAD"] {
            self.insert(method, &pattern, [Action::Files(files.clone())])?;
        }
        Ok(self)
    }

    /// Add a handler that runs before every matched chain.
    pub fn filter(&mut self, handler: Handler) -> &mut Self {
        self.filters.push(handler);
        self
    }

    /// Handler for requests no route matches.
    pub fn not_found(&mut self, handler: Handler) -> &mut Self {
        self.not_found = Some(handler);
        self
    }

    /// Handler for panics raised by a chain. Any partial response is discarded first.
    pub fn panic_handler(&mut self, handler: PanicHandler) -> &mut Self {
        self.panic_handler = Some(handler);
        self
    }

    pub fn router(&self) -> &Router<Endpoint> {
        &self.router
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Parameter buffers allocated so far. Stays flat once the pool is warm.
    pub fn param_buffers_created(&self) -> usize {
        self.params.created.load(Ordering::Relaxed)
    }

    /// Freeze the table into an axum router.
    pub fn into_router(self) -> axum::Router {
        let timeout = self.request_timeout;
        app(Arc::new(ArcSwap::from_pointee(self)), timeout)
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        serve(listener, self.into_router(), shutdown).await
    }

    /// Dispatch one buffered request through the route table.
    pub async fn dispatch(&self, parts: request::Parts, body: Bytes) -> Response {
        let start = Instant::now();
        let method = parts.method.clone();
        let raw_path = parts.uri.path().to_string();
        let path = percent_decode_str(&raw_path).decode_utf8_lossy().into_owned();
        let request_id = parts
            .headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let mut ranges = self.params.take(self.router.max_params());
        let chain = self.router.lookup_ranges(method.as_str(), &path, &mut ranges);
        let mut ctx = Context::new(method.clone(), parts.uri, path, parts.headers, body);

        let (route, response) = match chain {
            Some(chain) => {
                // Chains are never empty.
                let route = Arc::clone(&chain[0].route);
                ctx.set_match(route.clone(), ranges);

                let handlers = self
                    .filters
                    .iter()
                    .chain(chain.iter().filter_map(Endpoint::handler));
                self.run_chain(&mut ctx, handlers);

                if !ctx.is_written() {
                    if let Some(files) = chain.iter().find_map(Endpoint::files) {
                        serve_files(files, &mut ctx).await;
                    }
                }

                self.params.give(ctx.take_params());
                (Some(route), ctx.into_response())
            }
            None => {
                self.params.give(ranges);
                (None, self.miss(ctx))
            }
        };

        let route = route.as_deref().map_or("none", RoutePattern::as_str);
        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %raw_path,
            route = %route,
            status = %response.status(),
            "Request dispatched"
        );
        metrics::record_request(method.as_str(), response.status().as_u16(), route, start);

        response
    }

    fn run_chain<'a>(&self, ctx: &mut Context, handlers: impl Iterator<Item = &'a Handler>) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            for handler in handlers {
                handler(ctx);
                if ctx.is_written() {
                    break;
                }
            }
        }));

        if let Err(payload) = result {
            let message = panic_message(payload.as_ref());
            tracing::error!(path = %ctx.path(), panic = %message, "Handler panicked");
            ctx.reset_response();
            match &self.panic_handler {
                Some(handler) => {
                    let recovered = panic::catch_unwind(AssertUnwindSafe(|| handler(ctx, &message)));
                    if recovered.is_err() || !ctx.is_written() {
                        ctx.text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
                    }
                }
                None => ctx.text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error"),
            }
        }
    }

    fn miss(&self, mut ctx: Context) -> Response {
        let method = ctx.method().clone();

        if self.options.handle_method_not_allowed {
            let allowed = self.router.allowed_methods(ctx.path(), Some(method.as_str()));
            if !allowed.is_empty() {
                let allow = allowed.join(", ");
                ctx.text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    ctx.set_header(header::ALLOW, value);
                }
                return ctx.into_response();
            }
        }

        if self.options.redirect_trailing_slash && method != Method::CONNECT {
            if let Some(location) = self.trailing_slash_redirect(&ctx) {
                let status = if method == Method::GET || method == Method::HEAD {
                    StatusCode::MOVED_PERMANENTLY
                } else {
                    StatusCode::PERMANENT_REDIRECT
                };
                ctx.redirect(status, &location);
                return ctx.into_response();
            }
        }

        match &self.not_found {
            Some(handler) => {
                self.run_chain(&mut ctx, std::iter::once(handler));
                if !ctx.is_written() {
                    ctx.text(StatusCode::NOT_FOUND, "404 page not found");
                }
            }
            None => ctx.text(StatusCode::NOT_FOUND, "404 page not found"),
        }
        ctx.into_response()
    }

    /// Location of the decoded path with its trailing slash toggled, if that
    /// variant has a route for the request method. The location is built from
    /// the path that was looked up, re-encoded.
    fn trailing_slash_redirect(&self, ctx: &Context) -> Option<String> {
        if ctx.path() == "/" {
            return None;
        }
        let toggled = toggle_trailing_slash(ctx.path());

        let mut ranges = self.params.take(self.router.max_params());
        let found = self
            .router
            .lookup_ranges(ctx.method().as_str(), &toggled, &mut ranges)
            .is_some();
        self.params.give(ranges);
        if !found {
            return None;
        }

        let mut location = utf8_percent_encode(&toggled, PATH_ENCODE).to_string();
        if let Some(query) = ctx.uri().query() {
            location.push('?');
            location.push_str(query);
        }
        Some(location)
    }
}

fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => format!("{path}/"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Answer from `files` using the catch-all value as the file path.
async fn serve_files(files: &ServeDir, ctx: &mut Context) {
    let file = ctx.params().last().map_or("", |(_, value)| value);
    let uri = format!("/{}", utf8_percent_encode(file, PATH_ENCODE));
    let uri: Uri = match uri.parse() {
        Ok(uri) => uri,
        Err(_) => {
            ctx.text(StatusCode::BAD_REQUEST, "invalid file path");
            return;
        }
    };

    let mut request = Request::new(Body::empty());
    *request.method_mut() = ctx.method().clone();
    *request.uri_mut() = uri;
    *request.headers_mut() = ctx.headers().clone();

    match files.clone().oneshot(request).await {
        Ok(response) => ctx.write_response(response.map(Body::new)),
        Err(never) => match never {},
    }
}

/// Status for a failed body read: 413 when the size limit was hit.
fn body_error_status(error: &(dyn std::error::Error + Send + Sync + 'static)) -> StatusCode {
    if error.is::<LengthLimitError>() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    }
}

async fn read_body(body: Body) -> Result<Bytes, StatusCode> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => {
            let status = body_error_status(e.as_ref());
            tracing::warn!(error = %e, status = %status, "Failed to read request body");
            Err(status)
        }
    }
}

/// Build the axum router over a replaceable route table.
#[allow(deprecated)]
pub fn app(table: SharedServer, request_timeout: Duration) -> axum::Router {
    axum::Router::new().fallback(dispatch_handler).with_state(table).layer(
        ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

async fn dispatch_handler(State(table): State<SharedServer>, request: Request<Body>) -> Response {
    let server = table.load_full();
    let (parts, body) = request.into_parts();
    let body = match read_body(body).await {
        Ok(bytes) => bytes,
        Err(status) => {
            let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "request body too large"
            } else {
                "failed to read request body"
            };
            return (status, message).into_response();
        }
    };
    server.dispatch(parts, body).await
}

/// Swap in a table built from each config received, until `shutdown` fires
/// or the sender goes away. A config that fails to build keeps the current table.
pub async fn apply_reloads(
    table: SharedServer,
    mut updates: mpsc::UnboundedReceiver<RouterConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => match Server::from_config(&config) {
                    Ok(server) => {
                        tracing::info!(routes = server.router().route_count(), "Route table reloaded");
                        table.store(Arc::new(server));
                        metrics::record_reload("applied");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected route table, keeping current routes");
                        metrics::record_reload("rejected");
                    }
                },
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Route reload task stopped");
}

/// Serve `app` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    app: axum::Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server starting");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
