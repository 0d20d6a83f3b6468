// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single byte-stream endpoint.
//!
//! All I/O runs as futures on the owning loop's workers. The scope token is
//! the connection's latch: `disconnect()` cancels it, and every in-flight
//! operation checks it so stale completions abort cleanly instead of touching
//! a torn-down connection.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use berth_core::EventLoop;

pub(crate) type Reader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Outcome of one `async_read`.
pub(crate) struct ReadResult {
    pub success: bool,
    pub buffer: Vec<u8>,
}

pub(crate) type ReadCallback = Box<dyn FnOnce(ReadResult) + Send + 'static>;
pub(crate) type WriteCallback = Box<dyn FnOnce(bool, usize) + Send + 'static>;

pub(crate) struct Conn {
    id: u64,
    remote: String,
    chunk_size: usize,
    io_timeout: Option<Duration>,
    workers: EventLoop,
    reader: Arc<AsyncMutex<Option<Reader>>>,
    writer: Arc<AsyncMutex<Option<Writer>>>,
    scope: CancellationToken,
    connected: AtomicBool,
    disconnect_callbacks: Mutex<Vec<Box<dyn FnOnce(u64) + Send>>>,
}

impl Conn {
    pub fn new(
        reader: Reader,
        writer: Writer,
        id: u64,
        remote: String,
        chunk_size: usize,
        io_timeout: Option<Duration>,
        workers: EventLoop,
    ) -> Arc<Self> {
        trace!(id, remote = %remote, "transport connection created");
        Arc::new(Self {
            id,
            remote,
            chunk_size,
            io_timeout,
            workers,
            reader: Arc::new(AsyncMutex::new(Some(reader))),
            writer: Arc::new(AsyncMutex::new(Some(writer))),
            scope: CancellationToken::new(),
            connected: AtomicBool::new(true),
            disconnect_callbacks: Mutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn remote_endpoint(&self) -> &str {
        &self.remote
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Register a disconnect callback. Callbacks run exactly once, in reverse
    /// registration order.
    pub fn on_disconnect(&self, callback: impl FnOnce(u64) + Send + 'static) {
        self.disconnect_callbacks.lock().push(Box::new(callback));
    }

    /// Read up to `size` bytes. At most one read may be outstanding; the
    /// caller re-issues after handling each chunk.
    pub fn async_read(self: &Arc<Self>, size: usize, callback: ReadCallback) {
        if !self.is_connected() {
            return;
        }
        let this = Arc::clone(self);
        self.workers.spawn(async move {
            let mut guard = this.reader.lock().await;
            let Some(reader) = guard.as_mut() else { return };

            let mut buffer = vec![0u8; size];
            let outcome = tokio::select! {
                _ = this.scope.cancelled() => None,
                result = read_with_deadline(reader, &mut buffer, this.io_timeout) => Some(result),
            };
            drop(guard);

            match outcome {
                // Disconnected while the read was pending.
                None => {}
                Some(Ok(n)) if n > 0 => {
                    buffer.truncate(n);
                    callback(ReadResult { success: true, buffer });
                }
                Some(Ok(_)) => {
                    trace!(id = this.id, "peer closed the stream");
                    this.disconnect();
                    callback(ReadResult { success: false, buffer: Vec::new() });
                }
                Some(Err(error)) => {
                    debug!(id = this.id, %error, "read failed");
                    this.disconnect();
                    callback(ReadResult { success: false, buffer: Vec::new() });
                }
            }
        });
    }

    /// Write the whole buffer. Writes are serialized per connection.
    pub fn async_write(self: &Arc<Self>, buffer: Vec<u8>, callback: Option<WriteCallback>) {
        if !self.is_connected() {
            return;
        }
        let this = Arc::clone(self);
        self.workers.spawn(async move {
            let mut guard = this.writer.lock().await;
            let Some(writer) = guard.as_mut() else { return };

            let outcome = tokio::select! {
                _ = this.scope.cancelled() => None,
                result = write_with_deadline(writer, &buffer, this.io_timeout) => Some(result),
            };
            drop(guard);

            match outcome {
                None => {}
                Some(Ok(())) => {
                    if let Some(callback) = callback {
                        callback(true, buffer.len());
                    }
                }
                Some(Err(error)) => {
                    debug!(id = this.id, %error, "write failed");
                    this.disconnect();
                    if let Some(callback) = callback {
                        callback(false, 0);
                    }
                }
            }
        });
    }

    /// Sever the connection. Idempotent; runs the disconnect callbacks and
    /// cancels outstanding I/O.
    pub fn disconnect(self: &Arc<Self>) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        trace!(id = self.id, "disconnect");
        self.scope.cancel();

        // Closing the halves sends FIN once in-flight operations release them.
        let reader = Arc::clone(&self.reader);
        let writer = Arc::clone(&self.writer);
        self.workers.spawn(async move {
            reader.lock().await.take();
            let mut writer = writer.lock().await;
            if let Some(writer) = writer.as_mut() {
                let _ = writer.shutdown().await;
            }
            writer.take();
        });

        let callbacks = std::mem::take(&mut *self.disconnect_callbacks.lock());
        for callback in callbacks.into_iter().rev() {
            callback(self.id);
        }
    }
}

async fn read_with_deadline(
    reader: &mut Reader,
    buffer: &mut [u8],
    deadline: Option<Duration>,
) -> io::Result<usize> {
    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, reader.read(buffer)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "read timed out")),
        },
        None => reader.read(buffer).await,
    }
}

async fn write_with_deadline(
    writer: &mut Writer,
    buffer: &[u8],
    deadline: Option<Duration>,
) -> io::Result<()> {
    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, writer.write_all(buffer)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out")),
        },
        None => writer.write_all(buffer).await,
    }
}

#[cfg(test)]
#[path = "conn_tests.rs"]
mod tests;
