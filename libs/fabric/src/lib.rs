//! Switchboard Fabric - HTTP-transported RPC dispatch
//!
//! Registers receiver types as named services, negotiates a codec from each
//! request's `Content-Type`, resolves the dotted `Service.Method` name the
//! codec reads, and runs the call with optional intercept, before and after
//! hooks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde::{Deserialize, Serialize};
//! use switchboard_fabric::service::{Member, Receiver};
//! use switchboard_fabric::transport::HttpTransport;
//! use switchboard_fabric::{Codec, Server};
//!
//! #[derive(Default, Deserialize)]
//! struct EchoArgs { text: String }
//!
//! #[derive(Default, Serialize)]
//! struct EchoReply { text: String }
//!
//! struct Echo;
//!
//! impl Receiver for Echo {
//!     fn members() -> Vec<Member<Self>> {
//!         vec![Member::method("Say", |_: &Echo, args: &EchoArgs, reply: &mut EchoReply| {
//!             reply.text = args.text.clone();
//!             Ok::<(), String>(())
//!         })]
//!     }
//! }
//!
//! # async fn example(codec: impl Codec + Clone + 'static) -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::new(codec.clone());
//! server.register_codec(codec, "application/json");
//! server.register_transport_only_service(Echo, "")?;
//!
//! let config = switchboard_fabric::config::Config::load("switchboard.toml")?;
//! HttpTransport::bind(Arc::new(server), &config.transport).await?.serve().await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod hook;
pub mod server;
pub mod service;
pub mod transport;

/// Inbound request as seen by codecs, hooks and service methods
pub type HttpRequest = http::Request<bytes::Bytes>;

/// Outbound response written by codecs
pub type HttpResponse = http::Response<bytes::Bytes>;

// Re-exports for convenience
pub use codec::{ArgsBuffer, Codec, CodecRegistry, CodecRequest, Document, ReplyBuffer};
pub use error::{Error, Result};
pub use hook::RequestInfo;
pub use server::Server;
pub use service::{Member, Receiver};
pub use switchboard_core::{BoxError, Error as RpcError, MethodName, ServiceError};
