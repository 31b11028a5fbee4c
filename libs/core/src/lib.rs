//! Switchboard Core - shared vocabulary for the RPC dispatcher
//!
//! Holds the error taxonomy reported by registration and dispatch, and the
//! naming rules (dotted `Service.Method` names, exported identifiers) that
//! both sides agree on.

pub mod error;
pub mod name;

pub use error::{BoxError, Error, Result, ServiceError};
pub use name::{is_exported, type_base_name, MethodName};
