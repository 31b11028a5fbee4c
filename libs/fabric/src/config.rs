use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// Prefix for environment overrides, e.g. `SWITCHBOARD_TRANSPORT__BODY_LIMIT`
pub const ENV_PREFIX: &str = "SWITCHBOARD";

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP verbs accepted by the dispatcher
    pub allowed_methods: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec![http::Method::POST.to_string()],
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub address: SocketAddr,
    /// Route the dispatcher is mounted on
    pub path: String,
    /// Largest request body accepted, in bytes
    pub body_limit: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            path: "/rpc".to_string(),
            body_limit: 4 * 1024 * 1024,
        }
    }
}

/// Top-level configuration file layout
///
/// ```toml
/// [server]
/// allowed_methods = ["POST", "PUT"]
///
/// [transport]
/// address = "0.0.0.0:9000"
/// path = "/rpc"
/// body_limit = 1048576
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub transport: TransportConfig,
}

impl Config {
    /// Load from a TOML file, then apply `SWITCHBOARD_*` environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    /// Defaults with `SWITCHBOARD_*` environment overrides only
    pub fn from_env() -> Result<Self> {
        let config = ::config::Config::builder()
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

fn environment() -> ::config::Environment {
    ::config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
