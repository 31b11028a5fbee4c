use thiserror::Error;

/// Boxed error produced by a codec or any other pluggable collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a service method itself.
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("rpc: {0} method not allowed")]
    MethodNotAllowed(String),

    #[error("rpc: unrecognized Content-Type: {0}")]
    UnsupportedMediaType(String),

    #[error("rpc: service/method request ill-formed: {0:?}")]
    MalformedMethodName(String),

    #[error("rpc: can't find service {0:?}")]
    ServiceNotFound(String),

    #[error("rpc: can't find method {0:?}")]
    MethodNotFound(String),

    #[error("{0}")]
    CodecRequestMethod(String),

    #[error("{0}")]
    CodecReadRequest(String),

    #[error("{0}")]
    CodecWriteResponse(String),

    #[error("rpc: invalid service name {0:?}")]
    InvalidServiceName(String),

    #[error("rpc: {0:?} has no exported methods of suitable type")]
    NoSuitableMethods(String),

    #[error("rpc: service already defined: {0:?}")]
    DuplicateServiceName(String),

    /// The method's own failure, passed through verbatim.
    #[error("{0}")]
    Service(ServiceError),
}

impl Error {
    pub fn service(err: impl Into<ServiceError>) -> Self {
        Self::Service(err.into())
    }

    /// True for failures raised while registering a service; these never
    /// reach an HTTP client.
    pub fn is_registration(&self) -> bool {
        matches!(
            self,
            Self::InvalidServiceName(_) | Self::NoSuitableMethods(_) | Self::DuplicateServiceName(_)
        )
    }

    /// True for failures produced while resolving a dotted method name.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::MalformedMethodName(_) | Self::ServiceNotFound(_) | Self::MethodNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
