// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dialing side of the transport: resolve, connect, hand off one connection.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpStream, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use berth_core::EventLoop;

use crate::error::NetError;
use crate::transport::conn::{Conn, Reader, Writer};
use crate::transport::{DialEndpoint, FailCallback};

pub(crate) type ConnectCallback = Box<dyn FnOnce(Arc<Conn>) + Send + 'static>;

/// Owns the client's single-threaded worker loop and one dial attempt.
///
/// Aborting the dialer cancels a pending attempt; its callbacks never fire
/// afterwards.
pub(crate) struct Dialer {
    worker: EventLoop,
    scope: CancellationToken,
}

impl Dialer {
    pub fn new(worker_name: &str) -> Self {
        let worker = EventLoop::new();
        worker.change_thread_name(worker_name);
        Self { worker, scope: CancellationToken::new() }
    }

    pub fn worker(&self) -> &EventLoop {
        &self.worker
    }

    pub fn connect(
        &self,
        endpoint: DialEndpoint,
        connection_id: u64,
        chunk_size: usize,
        timeout_connect: Duration,
        on_connect: ConnectCallback,
        on_fail: Option<FailCallback>,
    ) -> Result<(), NetError> {
        self.worker.start()?;

        let scope = self.scope.clone();
        let worker = self.worker.clone();
        self.worker.spawn(async move {
            let dialed = tokio::select! {
                _ = scope.cancelled() => return,
                result = tokio::time::timeout(timeout_connect, dial(&endpoint)) => result,
            };
            let outcome = match dialed {
                Err(_) => Err("connect timed out".to_string()),
                Ok(Err(error)) => Err(error.to_string()),
                Ok(Ok(parts)) => Ok(parts),
            };
            match outcome {
                Err(message) => {
                    debug!(%message, "connect failed");
                    if let Some(on_fail) = &on_fail {
                        on_fail(&message);
                    }
                }
                Ok((reader, writer, remote)) => {
                    // The caller may have aborted while the dial was in flight.
                    if scope.is_cancelled() {
                        trace!("connect aborted");
                        return;
                    }
                    let conn = Conn::new(
                        reader,
                        writer,
                        connection_id,
                        remote,
                        chunk_size,
                        None,
                        worker,
                    );
                    trace!(id = connection_id, "connected");
                    on_connect(conn);
                }
            }
        });
        Ok(())
    }

    /// Cancel a pending dial; no callbacks fire afterwards.
    pub fn abort(&self) {
        self.scope.cancel();
    }

    /// Join the worker loop. Must not run on the worker itself.
    pub fn stop(&self) {
        self.worker.stop();
    }
}

async fn dial(endpoint: &DialEndpoint) -> std::io::Result<(Reader, Writer, String)> {
    match endpoint {
        DialEndpoint::Tcp { address, port } => {
            let stream = TcpStream::connect((address.as_str(), *port)).await?;
            let _ = stream.set_nodelay(true);
            let remote = stream
                .peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|_| format!("{address}:{port}"));
            let (reader, writer) = stream.into_split();
            Ok((Box::new(reader), Box::new(writer), remote))
        }
        DialEndpoint::Unix { path } => {
            let stream = UnixStream::connect(path).await?;
            let remote = path.display().to_string();
            let (reader, writer) = stream.into_split();
            Ok((Box::new(reader), Box::new(writer), remote))
        }
    }
}
