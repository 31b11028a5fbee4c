use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use switchboard_core::name::SEPARATOR;
use switchboard_core::{is_exported, type_base_name, Error, MethodName, Result, ServiceError};

use crate::codec::{ArgsBuffer, ReplyBuffer};
use crate::HttpRequest;

/// A type whose methods can be registered as an RPC service
///
/// Implementors enumerate every member they want considered. Registration
/// keeps the members whose name and signature satisfy the shape contract and
/// silently drops the rest.
///
/// ```
/// use switchboard_fabric::service::{Member, Receiver};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Deserialize)]
/// struct AddArgs { a: i64, b: i64 }
///
/// #[derive(Default, Serialize)]
/// struct AddReply { sum: i64 }
///
/// struct Calc;
///
/// impl Calc {
///     fn add(&self, args: &AddArgs, reply: &mut AddReply) -> Result<(), String> {
///         reply.sum = args.a + args.b;
///         Ok(())
///     }
/// }
///
/// impl Receiver for Calc {
///     fn members() -> Vec<Member<Self>> {
///         vec![Member::method("Add", Calc::add)]
///     }
/// }
/// ```
pub trait Receiver: Send + Sync + Sized + 'static {
    /// Enumerate the members offered for registration
    fn members() -> Vec<Member<Self>>;
}

/// One parameter kind in a member's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// The inbound HTTP request
    Request,
    /// A structured payload, named by its Rust type
    Payload(&'static str),
}

/// Capability description of a member: its parameters after the receiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Match against the shape contract, returning the argument and reply
    /// type names on success
    ///
    /// Exactly two payloads are required, preceded by the request when
    /// `pass_request` is set. Members built with [`Member::method`] or
    /// [`Member::with_request`] always carry payload slots, since their
    /// argument and reply types are bound by serde at compile time; only
    /// hand-built signatures can fail the payload check.
    pub fn matches(&self, pass_request: bool) -> Option<(&'static str, &'static str)> {
        let (args, reply) = match (pass_request, self.params.as_slice()) {
            (true, [Param::Request, args, reply]) => (args, reply),
            (false, [args, reply]) => (args, reply),
            _ => return None,
        };

        match (args, reply) {
            (Param::Payload(args), Param::Payload(reply)) => Some((*args, *reply)),
            _ => None,
        }
    }
}

type Handler<S, A, R> =
    dyn Fn(&S, &HttpRequest, &A, &mut R) -> std::result::Result<(), ServiceError> + Send + Sync;

type Binder<S> = Box<dyn FnOnce(Arc<S>) -> Arc<dyn Invoke> + Send>;

/// A candidate callable offered by a [`Receiver`]
pub struct Member<S> {
    name: String,
    signature: Signature,
    bind: Binder<S>,
}

impl<S: Receiver> Member<S> {
    /// A member taking `(args, reply)`, for transport-only services
    pub fn method<A, R, E, F>(name: impl Into<String>, f: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Default + Send + 'static,
        E: Into<ServiceError> + 'static,
        F: Fn(&S, &A, &mut R) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        let handler = handler(move |receiver: &S, _request: &HttpRequest, args: &A, reply: &mut R| {
            f(receiver, args, reply).map_err(Into::into)
        });
        let params = vec![Param::Payload(type_name::<A>()), Param::Payload(type_name::<R>())];
        Self::from_handler(name.into(), params, handler)
    }

    /// A member taking `(request, args, reply)`
    pub fn with_request<A, R, E, F>(name: impl Into<String>, f: F) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Default + Send + 'static,
        E: Into<ServiceError> + 'static,
        F: Fn(&S, &HttpRequest, &A, &mut R) -> std::result::Result<(), E> + Send + Sync + 'static,
    {
        let handler = handler(move |receiver: &S, request: &HttpRequest, args: &A, reply: &mut R| {
            f(receiver, request, args, reply).map_err(Into::into)
        });
        let params = vec![
            Param::Request,
            Param::Payload(type_name::<A>()),
            Param::Payload(type_name::<R>()),
        ];
        Self::from_handler(name.into(), params, handler)
    }

    fn from_handler<A, R>(name: String, params: Vec<Param>, handler: Arc<Handler<S, A, R>>) -> Self
    where
        A: DeserializeOwned + Default + Send + 'static,
        R: Serialize + Default + Send + 'static,
    {
        Self {
            name,
            signature: Signature::new(params),
            bind: Box::new(move |receiver| Arc::new(Bound { receiver, handler }) as Arc<dyn Invoke>),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl<S> fmt::Debug for Member<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish()
    }
}

fn handler<S, A, R, F>(f: F) -> Arc<Handler<S, A, R>>
where
    F: Fn(&S, &HttpRequest, &A, &mut R) -> std::result::Result<(), ServiceError>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Uniform call surface over receivers of unrelated types
pub(crate) trait Invoke: Send + Sync {
    /// Allocate a fresh argument buffer bound to this method
    fn prepare(&self) -> Box<dyn PendingCall>;
}

/// A method call whose arguments are being decoded
pub(crate) trait PendingCall: Send {
    fn args(&mut self) -> &mut dyn ArgsBuffer;

    /// Run the method against a fresh reply buffer
    fn call(
        self: Box<Self>,
        request: &HttpRequest,
    ) -> std::result::Result<Box<dyn ReplyBuffer>, ServiceError>;
}

struct Bound<S, A, R> {
    receiver: Arc<S>,
    handler: Arc<Handler<S, A, R>>,
}

impl<S, A, R> Invoke for Bound<S, A, R>
where
    S: Receiver,
    A: DeserializeOwned + Default + Send + 'static,
    R: Serialize + Default + Send + 'static,
{
    fn prepare(&self) -> Box<dyn PendingCall> {
        Box::new(Pending {
            receiver: Arc::clone(&self.receiver),
            handler: Arc::clone(&self.handler),
            args: A::default(),
        })
    }
}

struct Pending<S, A, R> {
    receiver: Arc<S>,
    handler: Arc<Handler<S, A, R>>,
    args: A,
}

impl<S, A, R> PendingCall for Pending<S, A, R>
where
    S: Receiver,
    A: DeserializeOwned + Default + Send + 'static,
    R: Serialize + Default + Send + 'static,
{
    fn args(&mut self) -> &mut dyn ArgsBuffer {
        &mut self.args
    }

    fn call(
        self: Box<Self>,
        request: &HttpRequest,
    ) -> std::result::Result<Box<dyn ReplyBuffer>, ServiceError> {
        let mut reply = R::default();
        (self.handler)(&*self.receiver, request, &self.args, &mut reply)?;
        Ok(Box::new(reply))
    }
}

/// A validated method within a service
pub struct MethodDescriptor {
    name: String,
    args_type: &'static str,
    reply_type: &'static str,
    invoker: Arc<dyn Invoke>,
}

impl MethodDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args_type(&self) -> &'static str {
        self.args_type
    }

    pub fn reply_type(&self) -> &'static str {
        self.reply_type
    }

    pub(crate) fn prepare(&self) -> Box<dyn PendingCall> {
        self.invoker.prepare()
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("args_type", &self.args_type)
            .field("reply_type", &self.reply_type)
            .finish()
    }
}

/// A named receiver and its method table
///
/// The table is built once at registration and never mutated afterwards.
pub struct Service {
    name: String,
    receiver: Arc<dyn Any + Send + Sync>,
    pass_request: bool,
    methods: HashMap<String, Arc<MethodDescriptor>>,
}

impl Service {
    fn build<S: Receiver>(receiver: Arc<S>, name: &str, pass_request: bool) -> Result<Self> {
        let name = if name.is_empty() {
            let derived = type_base_name::<S>();
            if !is_exported(derived) {
                return Err(Error::InvalidServiceName(derived.to_string()));
            }
            derived
        } else {
            name
        };
        if name.is_empty() || name.contains(SEPARATOR) {
            return Err(Error::InvalidServiceName(name.to_string()));
        }

        let mut methods = HashMap::new();
        for member in S::members() {
            if !is_exported(&member.name) {
                debug!(service = %name, method = %member.name, "skipping unexported method");
                continue;
            }
            let Some((args_type, reply_type)) = member.signature.matches(pass_request) else {
                debug!(
                    service = %name,
                    method = %member.name,
                    signature = ?member.signature,
                    pass_request,
                    "skipping method of unsuitable shape"
                );
                continue;
            };

            let invoker = (member.bind)(Arc::clone(&receiver));
            methods.insert(
                member.name.clone(),
                Arc::new(MethodDescriptor {
                    name: member.name,
                    args_type,
                    reply_type,
                    invoker,
                }),
            );
        }

        if methods.is_empty() {
            return Err(Error::NoSuitableMethods(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            receiver,
            pass_request,
            methods,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether methods receive the inbound request as their first parameter
    pub fn pass_request(&self) -> bool {
        self.pass_request
    }

    /// The receiver this service was registered with, if it is an `S`
    pub fn receiver<S: Send + Sync + 'static>(&self) -> Option<Arc<S>> {
        Arc::clone(&self.receiver).downcast::<S>().ok()
    }

    pub fn method(&self, name: &str) -> Option<&Arc<MethodDescriptor>> {
        self.methods.get(name)
    }

    /// Method names, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("pass_request", &self.pass_request)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Registry of services keyed by name
///
/// Registration is append-only. The mutex covers only the top-level map;
/// method tables are read without locking once installed.
#[derive(Default)]
pub struct ServiceMap {
    services: Mutex<HashMap<String, Arc<Service>>>,
}

impl ServiceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `receiver`'s members and install it as a service
    ///
    /// `name` overrides the receiver's type name when non-empty.
    pub fn register<S: Receiver>(
        &self,
        receiver: Arc<S>,
        name: &str,
        pass_request: bool,
    ) -> Result<Arc<Service>> {
        let service = Arc::new(Service::build(receiver, name, pass_request)?);

        let mut services = self.services.lock();
        if services.contains_key(service.name()) {
            return Err(Error::DuplicateServiceName(service.name().to_string()));
        }
        services.insert(service.name().to_string(), Arc::clone(&service));
        drop(services);

        info!(
            service = %service.name(),
            methods = ?service.method_names(),
            pass_request,
            "registered service"
        );
        Ok(service)
    }

    /// Resolve a dotted `Service.Method` name
    pub fn resolve(&self, dotted: &str) -> Result<(Arc<Service>, Arc<MethodDescriptor>)> {
        let name: MethodName = dotted.parse()?;

        let service = self
            .services
            .lock()
            .get(name.service())
            .cloned()
            .ok_or_else(|| Error::ServiceNotFound(dotted.to_string()))?;

        let method = service
            .method(name.method())
            .cloned()
            .ok_or_else(|| Error::MethodNotFound(dotted.to_string()))?;

        Ok((service, method))
    }

    /// Check whether `dotted` resolves
    pub fn contains(&self, dotted: &str) -> bool {
        self.resolve(dotted).is_ok()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Service>> {
        self.services.lock().get(name).cloned()
    }

    /// Registered service names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.services.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }
}
