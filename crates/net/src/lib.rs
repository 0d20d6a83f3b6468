// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berth-net: transport-agnostic connections, servers, and clients.
//!
//! A [`Server`] accepts byte-stream connections (TCP or Unix local) on its own
//! pooled event loop, wraps each in a [`Connection`] that runs the configured
//! wire protocol, and tracks them until disconnect. A [`Client`] dials once
//! and holds the resulting connection.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod server;
mod transport;

pub use client::Client;
pub use config::{
    ClientConfig, ServerConfig, TcpClientConfig, TcpServerConfig, UnixClientConfig,
    UnixServerConfig, DEFAULT_CHUNK_SIZE,
};
pub use connection::Connection;
pub use error::NetError;
pub use server::Server;
