// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing client: dials once and holds the resulting connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::{ClientConfig, TcpClientConfig, UnixClientConfig};
use crate::connection::Connection;
use crate::error::NetError;
use crate::transport::{Dialer, FailCallback};

type ConnectCallback = Arc<dyn Fn(&Arc<Connection>) + Send + Sync>;

/// Owns at most one connection on its own single-threaded loop.
///
/// A new `connect` tears down any previous attempt first; a dial aborted that
/// way never fires its callbacks.
#[derive(Default)]
pub struct Client {
    dialer: Mutex<Option<Dialer>>,
    connection: Arc<Mutex<Option<Arc<Connection>>>>,
    next_connection_id: AtomicU64,
    on_connect: Mutex<Option<ConnectCallback>>,
    on_fail: Mutex<Option<FailCallback>>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configurate_tcp() -> TcpClientConfig {
        TcpClientConfig::new()
    }

    pub fn configurate_unix_local() -> UnixClientConfig {
        UnixClientConfig::new()
    }

    /// Callback invoked with the established connection, before its first read.
    pub fn on_connect(&self, callback: impl Fn(&Arc<Connection>) + Send + Sync + 'static) -> &Self {
        *self.on_connect.lock() = Some(Arc::new(callback));
        self
    }

    /// Callback invoked when the dial fails or times out.
    pub fn on_fail(&self, callback: impl Fn(&str) + Send + Sync + 'static) -> &Self {
        *self.on_fail.lock() = Some(Arc::new(callback));
        self
    }

    /// Start dialing. The outcome arrives through `on_connect` / `on_fail`.
    pub fn connect(&self, config: impl Into<ClientConfig>) -> Result<(), NetError> {
        let config = config.into();
        config.validate()?;

        self.disconnect();

        let parts = config.into_parts();
        let dialer = Dialer::new(&parts.worker_name);
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(id = connection_id, "attempting to connect");

        let protocol = parts.protocol;
        let slot = Arc::clone(&self.connection);
        let user_callback = self.on_connect.lock().clone();
        dialer.connect(
            parts.endpoint,
            connection_id,
            parts.chunk_size,
            parts.timeout_connect,
            Box::new(move |raw| {
                let connection = Connection::wrap(raw, protocol.as_ref());

                // Release the slot when the connection goes away. Weak, so
                // the connection does not keep itself alive through the slot.
                let slot_weak = Arc::downgrade(&slot);
                connection.on_disconnect_with_id(move |id| {
                    if let Some(slot) = slot_weak.upgrade() {
                        let mut held = slot.lock();
                        if held.as_ref().map(|c| c.id()) == Some(id) {
                            held.take();
                            trace!(id, "client connection released");
                        }
                    }
                });

                *slot.lock() = Some(Arc::clone(&connection));
                if let Some(callback) = &user_callback {
                    callback(&connection);
                }
                connection.async_read();
            }),
            self.on_fail.lock().clone(),
        )?;

        *self.dialer.lock() = Some(dialer);
        Ok(())
    }

    /// The held connection, if any.
    pub fn connection(&self) -> Option<Arc<Connection>> {
        self.connection.lock().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection().is_some_and(|connection| connection.is_connected())
    }

    /// Inject a task onto the client's worker loop.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(dialer) = self.dialer.lock().as_ref() {
            dialer.worker().post(task);
        }
    }

    /// Abort a pending dial, disconnect the held connection, and join the
    /// worker loop. Must not be called from the worker itself.
    pub fn disconnect(&self) {
        let dialer = self.dialer.lock().take();
        if let Some(dialer) = &dialer {
            dialer.abort();
        }
        if let Some(connection) = self.connection.lock().take() {
            connection.disconnect();
        }
        if let Some(dialer) = dialer {
            dialer.stop();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let on_own_worker =
            self.dialer.lock().as_ref().is_some_and(|dialer| dialer.worker().is_this_loop());
        if !on_own_worker {
            self.disconnect();
        }
    }
}
