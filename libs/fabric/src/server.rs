use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS};
use http::{Method, StatusCode};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use switchboard_core::{Error, Result};

use crate::codec::{Codec, CodecRegistry, CodecRequest};
use crate::config::ServerConfig;
use crate::hook::{Hooks, RequestInfo};
use crate::service::{MethodDescriptor, Receiver, Service, ServiceMap};
use crate::{HttpRequest, HttpResponse};

/// Serves registered RPC services using registered codecs
///
/// Every registration call takes `&self`, so a server shared behind an `Arc`
/// can keep gaining services while it is already handling requests.
pub struct Server {
    codecs: RwLock<CodecRegistry>,
    default_codec: Arc<dyn Codec>,
    services: ServiceMap,
    hooks: RwLock<Hooks>,
    allowed_methods: RwLock<HashSet<Method>>,
}

impl Server {
    /// Create a server that accepts `POST` only
    ///
    /// `default_codec` formats the error envelope for requests rejected before
    /// a codec could be negotiated (disallowed verb, unknown content type).
    pub fn new(default_codec: impl Codec + 'static) -> Self {
        Self {
            codecs: RwLock::new(CodecRegistry::new()),
            default_codec: Arc::new(default_codec),
            services: ServiceMap::new(),
            hooks: RwLock::new(Hooks::default()),
            allowed_methods: RwLock::new(HashSet::from([Method::POST])),
        }
    }

    /// Create a server whose verb allow-set comes from `config`
    pub fn with_config(
        default_codec: impl Codec + 'static,
        config: &ServerConfig,
    ) -> crate::error::Result<Self> {
        let allowed = config
            .allowed_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.as_bytes()).map_err(|_| {
                    crate::error::Error::custom(format!("invalid HTTP method {method:?}"))
                })
            })
            .collect::<crate::error::Result<HashSet<_>>>()?;

        let server = Self::new(default_codec);
        *server.allowed_methods.write() = allowed;
        Ok(server)
    }

    /// Register `codec` for requests whose `Content-Type` is `content_type`
    ///
    /// Any charset suffix on the request header is ignored when matching.
    pub fn register_codec(&self, codec: impl Codec + 'static, content_type: &str) {
        self.codecs.write().register(Arc::new(codec), content_type);
        info!(content_type, "registered codec");
    }

    /// Register a service whose methods take the inbound request first
    ///
    /// The name is inferred from the receiver's type when `name` is empty.
    /// Members are kept when they are exported and shaped
    /// `(request, args, reply)`; all others are ignored.
    pub fn register_service<S: Receiver>(&self, receiver: S, name: &str) -> Result<()> {
        self.services.register(Arc::new(receiver), name, true)?;
        Ok(())
    }

    /// Register a service whose methods take only `(args, reply)`
    pub fn register_transport_only_service<S: Receiver>(
        &self,
        receiver: S,
        name: &str,
    ) -> Result<()> {
        self.services.register(Arc::new(receiver), name, false)?;
        Ok(())
    }

    /// Returns true if the dotted `Service.Method` name is registered
    pub fn has_method(&self, method: &str) -> bool {
        self.services.contains(method)
    }

    pub fn resolve(&self, method: &str) -> Result<(Arc<Service>, Arc<MethodDescriptor>)> {
        self.services.resolve(method)
    }

    pub fn services(&self) -> &ServiceMap {
        &self.services
    }

    /// Set the hook that may replace the request before the call
    ///
    /// Only one function is kept; a later registration replaces it.
    pub fn register_intercept_hook<F>(&self, f: F)
    where
        F: Fn(&RequestInfo<'_>) -> Option<HttpRequest> + Send + Sync + 'static,
    {
        self.hooks.write().set_intercept(Arc::new(f));
    }

    /// Set the hook run before every call
    ///
    /// Only one function is kept; a later registration replaces it.
    pub fn register_before_hook<F>(&self, f: F)
    where
        F: Fn(&RequestInfo<'_>) + Send + Sync + 'static,
    {
        self.hooks.write().set_before(Arc::new(f));
    }

    /// Set the hook run after every successful call
    ///
    /// Only one function is kept; a later registration replaces it.
    pub fn register_after_hook<F>(&self, f: F)
    where
        F: Fn(&RequestInfo<'_>) + Send + Sync + 'static,
    {
        self.hooks.write().set_after(Arc::new(f));
    }

    /// Accept `method` as a request verb in addition to the current set
    pub fn add_allowed_method(&self, method: Method) {
        self.allowed_methods.write().insert(method);
    }

    /// Handle one HTTP request
    ///
    /// Transport-policy rejections use 405 and 415; every other outcome,
    /// including RPC-level errors, is reported with 200 inside the codec's
    /// envelope.
    pub fn serve(&self, request: HttpRequest) -> HttpResponse {
        let codec = match self.negotiate(request.method(), request.headers()) {
            Ok(codec) => codec,
            Err((status, error)) => return self.reject(&request, status, &error),
        };

        let mut response = HttpResponse::new(Bytes::new());
        let mut codec_req = codec.new_request(&request);
        if let Err(error) = self.dispatch(request, &mut *codec_req, &mut response) {
            handle_error_response(&mut response, StatusCode::OK, &mut *codec_req, &error);
        }
        response
    }

    /// Apply the verb allow-set and pick a codec from the headers alone
    ///
    /// Needs no body, so a transport can run it before reading one.
    pub(crate) fn negotiate(
        &self,
        method: &Method,
        headers: &HeaderMap,
    ) -> std::result::Result<Arc<dyn Codec>, (StatusCode, Error)> {
        if !self.allowed_methods.read().contains(method) {
            return Err((
                StatusCode::METHOD_NOT_ALLOWED,
                Error::MethodNotAllowed(method.to_string()),
            ));
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .map(|value| String::from_utf8_lossy(value.as_bytes()))
            .unwrap_or(Cow::Borrowed(""));

        self.codecs
            .read()
            .select(&content_type)
            .map_err(|error| (StatusCode::UNSUPPORTED_MEDIA_TYPE, error))
    }

    /// Answer a policy rejection through the default codec
    pub(crate) fn reject(
        &self,
        request: &HttpRequest,
        status: StatusCode,
        error: &Error,
    ) -> HttpResponse {
        let mut response = HttpResponse::new(Bytes::new());
        let mut codec_req = self.default_codec.new_request(request);
        handle_error_response(&mut response, status, &mut *codec_req, error);
        response
    }

    fn dispatch(
        &self,
        mut request: HttpRequest,
        codec_req: &mut dyn CodecRequest,
        response: &mut HttpResponse,
    ) -> Result<()> {
        let method = codec_req
            .method()
            .map_err(|e| Error::CodecRequestMethod(e.to_string()))?;
        let (service, descriptor) = self.services.resolve(&method)?;

        let mut call = descriptor.prepare();
        codec_req
            .read_request(call.args())
            .map_err(|e| Error::CodecReadRequest(e.to_string()))?;

        let hooks = self.hooks.read().clone();
        if let Some(intercept) = hooks.intercept() {
            let replacement = intercept(&RequestInfo::new(&method, &request));
            if let Some(replacement) = replacement {
                request = replacement;
            }
        }
        if let Some(before) = hooks.before() {
            before(&RequestInfo::new(&method, &request));
        }

        debug!(
            method = %method,
            args = descriptor.args_type(),
            pass_request = service.pass_request(),
            "calling service method"
        );
        let reply = call.call(&request).map_err(Error::Service)?;

        response
            .headers_mut()
            .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        codec_req
            .write_response(response, &*reply)
            .map_err(|e| Error::CodecWriteResponse(e.to_string()))?;

        if let Some(after) = hooks.after() {
            after(&RequestInfo {
                method: &method,
                request: &request,
                error: None,
                status: Some(StatusCode::OK),
            });
        }
        Ok(())
    }
}

/// Write the status line, then let the codec shape the error envelope
fn handle_error_response(
    response: &mut HttpResponse,
    status: StatusCode,
    codec_req: &mut dyn CodecRequest,
    error: &Error,
) {
    if status == StatusCode::OK {
        debug!(error = %error, "rpc call failed");
    } else {
        warn!(status = %status, error = %error, "rejected rpc request");
    }

    *response.status_mut() = status;
    codec_req.write_error_response(response, error);
}
