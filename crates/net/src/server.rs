// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing server: accepts, tracks, and supervises connections.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use berth_core::{EventLoop, Task};

use crate::config::{ServerConfig, TcpServerConfig, UnixServerConfig};
use crate::connection::Connection;
use crate::error::NetError;
use crate::transport::{Acceptor, FailCallback, NewConnCallback};

type NewConnectionCallback = Arc<dyn Fn(&Arc<Connection>) + Send + Sync>;

struct Active {
    acceptor: Arc<Acceptor>,
}

/// Accepts transport connections on a pooled loop and tracks the resulting
/// [`Connection`]s by id.
///
/// For every accepted connection, the server registers its own table-removal
/// disconnect handler, inserts the connection into the table, invokes the
/// user's `on_new_connection` callback, and only then issues the first read.
/// User code can therefore attach `on_receive` before any bytes arrive.
#[derive(Default)]
pub struct Server {
    active: Mutex<Option<Active>>,
    connections: Arc<Mutex<HashMap<u64, Arc<Connection>>>>,
    on_start: Mutex<Option<Task>>,
    on_new_connection: Mutex<Option<NewConnectionCallback>>,
    on_fail: Mutex<Option<FailCallback>>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configurate_tcp() -> TcpServerConfig {
        TcpServerConfig::new()
    }

    pub fn configurate_unix_local() -> UnixServerConfig {
        UnixServerConfig::new()
    }

    /// Callback invoked on a worker once the listener is bound.
    pub fn on_start(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        *self.on_start.lock() = Some(Box::new(callback));
        self
    }

    /// Callback invoked for every accepted connection, before its first read.
    pub fn on_new_connection(
        &self,
        callback: impl Fn(&Arc<Connection>) + Send + Sync + 'static,
    ) -> &Self {
        *self.on_new_connection.lock() = Some(Arc::new(callback));
        self
    }

    /// Callback invoked with bind and accept failures.
    pub fn on_fail(&self, callback: impl Fn(&str) + Send + Sync + 'static) -> &Self {
        *self.on_fail.lock() = Some(Arc::new(callback));
        self
    }

    pub fn start(&self, config: impl Into<ServerConfig>) -> Result<(), NetError> {
        let config = config.into();
        config.validate()?;
        {
            if self.active.lock().is_some() {
                return Err(NetError::AlreadyRunning);
            }
        }

        let parts = config.into_parts();
        let acceptor = Arc::new(Acceptor::new(parts.worker_threads, &parts.worker_name));

        let protocol = parts.protocol;
        let connections = Arc::clone(&self.connections);
        let user_callback = self.on_new_connection.lock().clone();
        let handler: NewConnCallback = Arc::new(move |raw| {
            let connection = Connection::wrap(raw, protocol.as_ref());

            // Registered first so it runs last among the id observers, after
            // any the user attaches in `on_new_connection`.
            let table = Arc::clone(&connections);
            connection.on_disconnect_with_id(move |id| {
                let remaining = {
                    let mut table = table.lock();
                    table.remove(&id);
                    table.len()
                };
                trace!(id, remaining, "connection removed");
            });

            let total = {
                let mut table = connections.lock();
                table.insert(connection.id(), Arc::clone(&connection));
                table.len()
            };
            debug!(id = connection.id(), total, "new connection");

            if let Some(callback) = &user_callback {
                callback(&connection);
            }
            connection.async_read();
        });

        acceptor.start(
            parts.endpoint,
            parts.chunk_size,
            parts.timeout,
            self.on_start.lock().take(),
            handler,
            self.on_fail.lock().clone(),
        )?;

        *self.active.lock() = Some(Active { acceptor });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().as_ref().is_some_and(|active| active.acceptor.is_running())
    }

    /// Stop accepting, disconnect tracked connections, join the worker pool.
    ///
    /// With `wait_for_removal`, every tracked connection is disconnected (and
    /// its observers run) before the pool stops; otherwise connections are
    /// simply dropped. Must not be called from one of the pool's workers.
    pub fn stop(&self, wait_for_removal: bool) {
        let Some(active) = self.active.lock().take() else { return };
        debug!("stopping server");

        active.acceptor.close();

        let tracked: Vec<Arc<Connection>> = {
            let mut table = self.connections.lock();
            table.drain().map(|(_, connection)| connection).collect()
        };
        if wait_for_removal {
            for connection in &tracked {
                connection.disconnect();
            }
        }
        drop(tracked);

        active.acceptor.stop_workers();
        debug!("server stopped");
    }

    /// Block until started; with `until_stop`, block until stopped as well.
    ///
    /// Returns false when the server is not running.
    pub fn wait(&self, until_stop: bool) -> bool {
        let workers = {
            let active = self.active.lock();
            match active.as_ref() {
                Some(active) => active.acceptor.workers().clone(),
                None => return false,
            }
        };
        workers.wait_started();
        if until_stop {
            workers.wait_stopped();
        }
        true
    }

    /// Inject a task onto the server's worker loop.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(active) = self.active.lock().as_ref() {
            active.acceptor.workers().post(task);
        }
    }

    /// The server's worker loop, while running.
    pub fn workers(&self) -> Option<EventLoop> {
        self.active.lock().as_ref().map(|active| active.acceptor.workers().clone())
    }

    /// Number of currently tracked connections.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Look up a tracked connection by id.
    pub fn connection(&self, id: u64) -> Option<Arc<Connection>> {
        self.connections.lock().get(&id).cloned()
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let on_own_worker = self
            .active
            .lock()
            .as_ref()
            .is_some_and(|active| active.acceptor.workers().is_this_loop());
        if !on_own_worker {
            self.stop(false);
        }
    }
}
