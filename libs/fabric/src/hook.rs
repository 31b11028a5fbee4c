use std::sync::Arc;

use http::StatusCode;

use switchboard_core::Error;

use crate::HttpRequest;

/// Information passed to every hook
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    /// Dotted method name as read from the wire
    pub method: &'a str,
    pub request: &'a HttpRequest,
    pub error: Option<&'a Error>,
    pub status: Option<StatusCode>,
}

impl<'a> RequestInfo<'a> {
    pub(crate) fn new(method: &'a str, request: &'a HttpRequest) -> Self {
        Self {
            method,
            request,
            error: None,
            status: None,
        }
    }
}

/// Runs before the call and may return a replacement request
pub type InterceptFn = dyn Fn(&RequestInfo<'_>) -> Option<HttpRequest> + Send + Sync;

/// Runs before the call, after any intercept
pub type BeforeFn = dyn Fn(&RequestInfo<'_>) + Send + Sync;

/// Runs after a fully successful call
pub type AfterFn = dyn Fn(&RequestInfo<'_>) + Send + Sync;

/// Hook slots; each holds at most one function and the last one set wins
#[derive(Default, Clone)]
pub struct Hooks {
    intercept: Option<Arc<InterceptFn>>,
    before: Option<Arc<BeforeFn>>,
    after: Option<Arc<AfterFn>>,
}

impl Hooks {
    pub fn set_intercept(&mut self, f: Arc<InterceptFn>) {
        self.intercept = Some(f);
    }

    pub fn set_before(&mut self, f: Arc<BeforeFn>) {
        self.before = Some(f);
    }

    pub fn set_after(&mut self, f: Arc<AfterFn>) {
        self.after = Some(f);
    }

    pub fn intercept(&self) -> Option<Arc<InterceptFn>> {
        self.intercept.clone()
    }

    pub fn before(&self) -> Option<Arc<BeforeFn>> {
        self.before.clone()
    }

    pub fn after(&self) -> Option<Arc<AfterFn>> {
        self.after.clone()
    }
}
