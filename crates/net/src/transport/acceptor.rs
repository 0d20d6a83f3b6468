// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listening side of the transport: bind, accept, hand off connections.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpSocket, UnixListener};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use berth_core::{EventLoop, Task};

use crate::error::NetError;
use crate::transport::conn::Conn;
use crate::transport::{FailCallback, ListenEndpoint, NewConnCallback};

const LISTEN_BACKLOG: u32 = 1024;

/// Owns the pooled worker loop and the accept task.
pub(crate) struct Acceptor {
    workers: EventLoop,
    scope: CancellationToken,
    next_connection_id: Arc<AtomicU64>,
    unix_path: Mutex<Option<PathBuf>>,
}

impl Acceptor {
    pub fn new(worker_threads: usize, worker_name: &str) -> Self {
        let workers = EventLoop::pooled(worker_threads);
        workers.change_thread_name(worker_name);
        Self {
            workers,
            scope: CancellationToken::new(),
            next_connection_id: Arc::new(AtomicU64::new(0)),
            unix_path: Mutex::new(None),
        }
    }

    pub fn workers(&self) -> &EventLoop {
        &self.workers
    }

    pub fn is_running(&self) -> bool {
        self.workers.is_running()
    }

    /// Start the workers and the accept task.
    ///
    /// Binding happens on a worker; a bind failure surfaces through
    /// `on_fail`. Accept errors other than cancellation also surface through
    /// `on_fail`, and accepting continues.
    pub fn start(
        &self,
        endpoint: ListenEndpoint,
        chunk_size: usize,
        io_timeout: Option<Duration>,
        on_start: Option<Task>,
        on_new_connection: NewConnCallback,
        on_fail: Option<FailCallback>,
    ) -> Result<(), NetError> {
        self.workers.start()?;

        let scope = self.scope.clone();
        let ids = Arc::clone(&self.next_connection_id);
        let workers = self.workers.clone();

        match endpoint {
            ListenEndpoint::Tcp { address, port, reuse_address } => {
                self.workers.spawn(async move {
                    let listener = match bind_tcp(&address, port, reuse_address).await {
                        Ok(listener) => listener,
                        Err(error) => {
                            error!(%address, port, %error, "failed to bind");
                            if let Some(on_fail) = &on_fail {
                                on_fail(&error.to_string());
                            }
                            return;
                        }
                    };
                    debug!(%address, port, "listening");
                    if let Some(on_start) = on_start {
                        on_start();
                    }
                    accept_tcp(listener, scope, ids, workers, chunk_size, io_timeout,
                        on_new_connection, on_fail).await;
                });
            }
            ListenEndpoint::Unix { path } => {
                *self.unix_path.lock() = Some(path.clone());
                self.workers.spawn(async move {
                    // A stale socket file from an unclean shutdown blocks the
                    // bind; replace it.
                    if path.exists() {
                        let _ = std::fs::remove_file(&path);
                    }
                    let listener = match UnixListener::bind(&path) {
                        Ok(listener) => listener,
                        Err(error) => {
                            error!(path = %path.display(), %error, "failed to bind");
                            if let Some(on_fail) = &on_fail {
                                on_fail(&error.to_string());
                            }
                            return;
                        }
                    };
                    debug!(path = %path.display(), "listening");
                    if let Some(on_start) = on_start {
                        on_start();
                    }
                    accept_unix(listener, path, scope, ids, workers, chunk_size, io_timeout,
                        on_new_connection, on_fail).await;
                });
            }
        }
        Ok(())
    }

    /// Stop accepting: cancel the accept task and remove a Unix socket file.
    pub fn close(&self) {
        self.scope.cancel();
        if let Some(path) = self.unix_path.lock().take() {
            let _ = std::fs::remove_file(&path);
        }
    }

    /// Join the worker pool. Must not run on one of its own workers.
    pub fn stop_workers(&self) {
        self.workers.stop();
    }
}

async fn bind_tcp(address: &str, port: u16, reuse_address: bool) -> std::io::Result<TcpListener> {
    let ip: IpAddr = if address.is_empty() {
        IpAddr::from([0u8, 0, 0, 0])
    } else {
        match address.parse() {
            Ok(ip) => ip,
            Err(_) => {
                // Hostname: resolve and take the first address.
                let mut addrs = tokio::net::lookup_host((address, port)).await?;
                match addrs.next() {
                    Some(addr) => addr.ip(),
                    None => {
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::NotFound,
                            "address did not resolve",
                        ))
                    }
                }
            }
        }
    };
    let addr = SocketAddr::new(ip, port);
    let socket = if addr.is_ipv6() { TcpSocket::new_v6()? } else { TcpSocket::new_v4()? };
    socket.set_reuseaddr(reuse_address)?;
    socket.bind(addr)?;
    socket.listen(LISTEN_BACKLOG)
}

#[allow(clippy::too_many_arguments)]
async fn accept_tcp(
    listener: TcpListener,
    scope: CancellationToken,
    ids: Arc<AtomicU64>,
    workers: EventLoop,
    chunk_size: usize,
    io_timeout: Option<Duration>,
    on_new_connection: NewConnCallback,
    on_fail: Option<FailCallback>,
) {
    loop {
        tokio::select! {
            _ = scope.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, peer)) => {
                    let id = ids.fetch_add(1, Ordering::SeqCst) + 1;
                    let _ = stream.set_nodelay(true);
                    let (reader, writer) = stream.into_split();
                    let conn = Conn::new(
                        Box::new(reader),
                        Box::new(writer),
                        id,
                        peer.to_string(),
                        chunk_size,
                        io_timeout,
                        workers.clone(),
                    );
                    trace!(id, peer = %peer, "accepted");
                    on_new_connection(conn);
                }
                Err(error) => {
                    error!(%error, "accept failed");
                    if let Some(on_fail) = &on_fail {
                        on_fail(&error.to_string());
                    }
                }
            }
        }
    }
    trace!("acceptor closed");
}

#[allow(clippy::too_many_arguments)]
async fn accept_unix(
    listener: UnixListener,
    path: PathBuf,
    scope: CancellationToken,
    ids: Arc<AtomicU64>,
    workers: EventLoop,
    chunk_size: usize,
    io_timeout: Option<Duration>,
    on_new_connection: NewConnCallback,
    on_fail: Option<FailCallback>,
) {
    loop {
        tokio::select! {
            _ = scope.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, _)) => {
                    let id = ids.fetch_add(1, Ordering::SeqCst) + 1;
                    let (reader, writer) = stream.into_split();
                    let conn = Conn::new(
                        Box::new(reader),
                        Box::new(writer),
                        id,
                        path.display().to_string(),
                        chunk_size,
                        io_timeout,
                        workers.clone(),
                    );
                    trace!(id, "accepted");
                    on_new_connection(conn);
                }
                Err(error) => {
                    error!(%error, "accept failed");
                    if let Some(on_fail) = &on_fail {
                        on_fail(&error.to_string());
                    }
                }
            }
        }
    }
    trace!("acceptor closed");
}
