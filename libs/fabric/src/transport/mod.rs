use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use bytes::Bytes;
use http::StatusCode;
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::server::Server;
use crate::HttpRequest;

#[derive(Clone)]
struct Dispatch {
    server: Arc<Server>,
    body_limit: usize,
}

/// Build a router that hands every request on `config.path` to `server`
///
/// Any verb is routed; the server itself enforces its allow-set. Verb and
/// content-type rejections are answered before the body is read, so only an
/// admitted request can draw a 413 for exceeding `config.body_limit`.
pub fn router(server: Arc<Server>, config: &TransportConfig) -> Result<Router> {
    if !config.path.starts_with('/') {
        return Err(Error::InvalidRoute(config.path.clone()));
    }

    let state = Dispatch {
        server,
        body_limit: config.body_limit,
    };
    Ok(Router::new()
        .route(&config.path, any(dispatch))
        .with_state(state))
}

async fn dispatch(State(state): State<Dispatch>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    if let Err((status, error)) = state.server.negotiate(&parts.method, &parts.headers) {
        let request = HttpRequest::from_parts(parts, Bytes::new());
        return state
            .server
            .reject(&request, status, &error)
            .map(Body::from)
            .into_response();
    }

    let body = match to_bytes(body, state.body_limit).await {
        Ok(body) => body,
        Err(e) => return body_rejection(e).into_response(),
    };

    state
        .server
        .serve(HttpRequest::from_parts(parts, body))
        .map(Body::from)
        .into_response()
}

fn body_rejection(error: axum::Error) -> StatusCode {
    let error = error.into_inner();
    if error.downcast_ref::<LengthLimitError>().is_some() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        debug!(error = %error, "failed to read request body");
        StatusCode::BAD_REQUEST
    }
}

/// HTTP listener serving one [`Server`]
pub struct HttpTransport {
    listener: TcpListener,
    router: Router,
    path: String,
}

impl HttpTransport {
    /// Bind with the given settings
    pub async fn bind(server: Arc<Server>, config: &TransportConfig) -> Result<Self> {
        Self::builder().config(config).bind(server).await
    }

    /// Create a builder for configuring the transport
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Get the local address this transport is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(Into::into)
    }

    /// Serve until the process ends or the listener fails
    pub async fn serve(self) -> Result<()> {
        info!(address = ?self.listener.local_addr().ok(), path = %self.path, "serving rpc over http");
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Serve until `signal` resolves, then drain in-flight requests
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(address = ?self.listener.local_addr().ok(), path = %self.path, "serving rpc over http");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await?;
        info!("rpc transport shut down");
        Ok(())
    }
}

/// Builder for configuring the HTTP transport
#[derive(Default)]
pub struct HttpTransportBuilder {
    config: TransportConfig,
}

impl HttpTransportBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all settings
    pub fn config(mut self, config: &TransportConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Set the address to bind
    pub fn address(mut self, addr: SocketAddr) -> Self {
        self.config.address = addr;
        self
    }

    /// Set the route the dispatcher is mounted on
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the largest accepted request body, in bytes
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.config.body_limit = limit;
        self
    }

    /// Bind the listener with the configured settings
    pub async fn bind(self, server: Arc<Server>) -> Result<HttpTransport> {
        let router = router(server, &self.config)?;
        let listener = TcpListener::bind(self.config.address).await?;

        Ok(HttpTransport {
            listener,
            router,
            path: self.config.path,
        })
    }
}
