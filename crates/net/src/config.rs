// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fluent server and client configuration.

use std::path::PathBuf;
use std::time::Duration;

use berth_wire::UnitBuilder;

use crate::error::NetError;
use crate::transport::{DialEndpoint, ListenEndpoint};

/// Default read-chunk size requested from the transport.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP server configuration; obtained from [`Server::configurate_tcp`](crate::Server::configurate_tcp).
pub struct TcpServerConfig {
    pub(crate) address: String,
    pub(crate) port: u16,
    pub(crate) protocol: Option<Box<dyn UnitBuilder>>,
    pub(crate) reuse_address: bool,
    pub(crate) chunk_size: usize,
    pub(crate) worker_threads: usize,
    pub(crate) worker_name: String,
    pub(crate) timeout: Option<Duration>,
}

impl TcpServerConfig {
    pub(crate) fn new() -> Self {
        Self {
            address: String::new(),
            port: 0,
            protocol: None,
            reuse_address: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            worker_threads: 1,
            worker_name: "server".to_string(),
            timeout: None,
        }
    }

    /// Bind address; empty means every interface.
    pub fn set_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Protocol template, cloned for every accepted connection.
    pub fn set_protocol(mut self, protocol: impl UnitBuilder + 'static) -> Self {
        self.protocol = Some(Box::new(protocol));
        self
    }

    pub fn set_reuse_address(mut self, reuse_address: bool) -> Self {
        self.reuse_address = reuse_address;
        self
    }

    pub fn set_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn set_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn set_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    /// Per-operation I/O deadline; expiry disconnects the connection.
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn validate(&self) -> Result<(), NetError> {
        if self.port == 0 {
            return Err(NetError::InvalidConfig("port must not be zero".into()));
        }
        validate_common(self.protocol.is_some(), self.chunk_size, self.worker_threads)
    }
}

/// Unix local stream server configuration.
pub struct UnixServerConfig {
    pub(crate) socket_file: PathBuf,
    pub(crate) protocol: Option<Box<dyn UnitBuilder>>,
    pub(crate) chunk_size: usize,
    pub(crate) worker_threads: usize,
    pub(crate) worker_name: String,
    pub(crate) timeout: Option<Duration>,
}

impl UnixServerConfig {
    pub(crate) fn new() -> Self {
        Self {
            socket_file: PathBuf::new(),
            protocol: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            worker_threads: 1,
            worker_name: "server".to_string(),
            timeout: None,
        }
    }

    /// Filesystem path to bind; removed again when the server stops.
    pub fn set_socket_file(mut self, socket_file: impl Into<PathBuf>) -> Self {
        self.socket_file = socket_file.into();
        self
    }

    pub fn set_protocol(mut self, protocol: impl UnitBuilder + 'static) -> Self {
        self.protocol = Some(Box::new(protocol));
        self
    }

    pub fn set_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn set_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn set_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn validate(&self) -> Result<(), NetError> {
        if self.socket_file.as_os_str().is_empty() {
            return Err(NetError::InvalidConfig("socket file must be set".into()));
        }
        validate_common(self.protocol.is_some(), self.chunk_size, self.worker_threads)
    }
}

/// Either family of server configuration.
pub enum ServerConfig {
    Tcp(TcpServerConfig),
    UnixLocal(UnixServerConfig),
}

impl ServerConfig {
    pub(crate) fn validate(&self) -> Result<(), NetError> {
        match self {
            ServerConfig::Tcp(config) => config.validate(),
            ServerConfig::UnixLocal(config) => config.validate(),
        }
    }

    pub(crate) fn into_parts(self) -> ServerParts {
        match self {
            ServerConfig::Tcp(config) => ServerParts {
                endpoint: ListenEndpoint::Tcp {
                    address: config.address,
                    port: config.port,
                    reuse_address: config.reuse_address,
                },
                // validate() ran before into_parts
                protocol: config.protocol.unwrap_or_else(|| unreachable!()),
                chunk_size: config.chunk_size,
                worker_threads: config.worker_threads,
                worker_name: config.worker_name,
                timeout: config.timeout,
            },
            ServerConfig::UnixLocal(config) => ServerParts {
                endpoint: ListenEndpoint::Unix { path: config.socket_file },
                protocol: config.protocol.unwrap_or_else(|| unreachable!()),
                chunk_size: config.chunk_size,
                worker_threads: config.worker_threads,
                worker_name: config.worker_name,
                timeout: config.timeout,
            },
        }
    }
}

pub(crate) struct ServerParts {
    pub endpoint: ListenEndpoint,
    pub protocol: Box<dyn UnitBuilder>,
    pub chunk_size: usize,
    pub worker_threads: usize,
    pub worker_name: String,
    pub timeout: Option<Duration>,
}

impl From<TcpServerConfig> for ServerConfig {
    fn from(config: TcpServerConfig) -> Self {
        ServerConfig::Tcp(config)
    }
}

impl From<UnixServerConfig> for ServerConfig {
    fn from(config: UnixServerConfig) -> Self {
        ServerConfig::UnixLocal(config)
    }
}

/// TCP client configuration; obtained from [`Client::configurate_tcp`](crate::Client::configurate_tcp).
pub struct TcpClientConfig {
    pub(crate) address: String,
    pub(crate) port: u16,
    pub(crate) protocol: Option<Box<dyn UnitBuilder>>,
    pub(crate) chunk_size: usize,
    pub(crate) timeout_connect: Duration,
    pub(crate) worker_name: String,
}

impl TcpClientConfig {
    pub(crate) fn new() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 0,
            protocol: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_connect: DEFAULT_CONNECT_TIMEOUT,
            worker_name: "client".to_string(),
        }
    }

    pub fn set_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn set_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn set_protocol(mut self, protocol: impl UnitBuilder + 'static) -> Self {
        self.protocol = Some(Box::new(protocol));
        self
    }

    pub fn set_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn set_timeout_connect(mut self, timeout_connect: Duration) -> Self {
        self.timeout_connect = timeout_connect;
        self
    }

    pub fn set_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    fn validate(&self) -> Result<(), NetError> {
        if self.port == 0 {
            return Err(NetError::InvalidConfig("port must not be zero".into()));
        }
        if self.address.is_empty() {
            return Err(NetError::InvalidConfig("address must be set".into()));
        }
        if self.timeout_connect.is_zero() {
            return Err(NetError::InvalidConfig("connect timeout must not be zero".into()));
        }
        validate_common(self.protocol.is_some(), self.chunk_size, 1)
    }
}

/// Unix local stream client configuration.
pub struct UnixClientConfig {
    pub(crate) socket_file: PathBuf,
    pub(crate) protocol: Option<Box<dyn UnitBuilder>>,
    pub(crate) chunk_size: usize,
    pub(crate) timeout_connect: Duration,
    pub(crate) worker_name: String,
}

impl UnixClientConfig {
    pub(crate) fn new() -> Self {
        Self {
            socket_file: PathBuf::new(),
            protocol: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout_connect: DEFAULT_CONNECT_TIMEOUT,
            worker_name: "client".to_string(),
        }
    }

    pub fn set_socket_file(mut self, socket_file: impl Into<PathBuf>) -> Self {
        self.socket_file = socket_file.into();
        self
    }

    pub fn set_protocol(mut self, protocol: impl UnitBuilder + 'static) -> Self {
        self.protocol = Some(Box::new(protocol));
        self
    }

    pub fn set_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn set_timeout_connect(mut self, timeout_connect: Duration) -> Self {
        self.timeout_connect = timeout_connect;
        self
    }

    pub fn set_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = worker_name.into();
        self
    }

    fn validate(&self) -> Result<(), NetError> {
        if self.socket_file.as_os_str().is_empty() {
            return Err(NetError::InvalidConfig("socket file must be set".into()));
        }
        if self.timeout_connect.is_zero() {
            return Err(NetError::InvalidConfig("connect timeout must not be zero".into()));
        }
        validate_common(self.protocol.is_some(), self.chunk_size, 1)
    }
}

/// Either family of client configuration.
pub enum ClientConfig {
    Tcp(TcpClientConfig),
    UnixLocal(UnixClientConfig),
}

impl ClientConfig {
    pub(crate) fn validate(&self) -> Result<(), NetError> {
        match self {
            ClientConfig::Tcp(config) => config.validate(),
            ClientConfig::UnixLocal(config) => config.validate(),
        }
    }

    pub(crate) fn into_parts(self) -> ClientParts {
        match self {
            ClientConfig::Tcp(config) => ClientParts {
                endpoint: DialEndpoint::Tcp { address: config.address, port: config.port },
                protocol: config.protocol.unwrap_or_else(|| unreachable!()),
                chunk_size: config.chunk_size,
                timeout_connect: config.timeout_connect,
                worker_name: config.worker_name,
            },
            ClientConfig::UnixLocal(config) => ClientParts {
                endpoint: DialEndpoint::Unix { path: config.socket_file },
                protocol: config.protocol.unwrap_or_else(|| unreachable!()),
                chunk_size: config.chunk_size,
                timeout_connect: config.timeout_connect,
                worker_name: config.worker_name,
            },
        }
    }
}

pub(crate) struct ClientParts {
    pub endpoint: DialEndpoint,
    pub protocol: Box<dyn UnitBuilder>,
    pub chunk_size: usize,
    pub timeout_connect: Duration,
    pub worker_name: String,
}

impl From<TcpClientConfig> for ClientConfig {
    fn from(config: TcpClientConfig) -> Self {
        ClientConfig::Tcp(config)
    }
}

impl From<UnixClientConfig> for ClientConfig {
    fn from(config: UnixClientConfig) -> Self {
        ClientConfig::UnixLocal(config)
    }
}

fn validate_common(
    has_protocol: bool,
    chunk_size: usize,
    worker_threads: usize,
) -> Result<(), NetError> {
    if !has_protocol {
        return Err(NetError::InvalidConfig("protocol must be set".into()));
    }
    if chunk_size == 0 {
        return Err(NetError::InvalidConfig("chunk size must not be zero".into()));
    }
    if worker_threads == 0 {
        return Err(NetError::InvalidConfig("worker threads must not be zero".into()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
