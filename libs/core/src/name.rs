use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Separator between the service and method components of a wire name.
pub const SEPARATOR: char = '.';

/// A parsed wire-level method name of the form `Service.Method`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodName {
    service: String,
    method: String,
}

impl MethodName {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for MethodName {
    type Err = Error;

    fn from_str(dotted: &str) -> Result<Self, Self::Err> {
        let mut parts = dotted.split(SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(service), Some(method), None) if !service.is_empty() && !method.is_empty() => {
                Ok(Self::new(service, method))
            }
            _ => Err(Error::MalformedMethodName(dotted.to_string())),
        }
    }
}

impl TryFrom<String> for MethodName {
    type Error = Error;

    fn try_from(dotted: String) -> Result<Self, Self::Error> {
        dotted.parse()
    }
}

impl From<MethodName> for String {
    fn from(name: MethodName) -> Self {
        name.to_string()
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.service, SEPARATOR, self.method)
    }
}

/// Returns true if `name` is exported, i.e. begins with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Unqualified name of `T` with any generic arguments removed.
///
/// `my_crate::api::Calc<u32>` becomes `Calc`.
pub fn type_base_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}
