// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user-facing connection: framing, send buffering, and observers.
//!
//! Wraps a transport connection with a per-connection clone of the protocol
//! template. Received chunks are fed to the units-builder manager and every
//! completed unit is dispatched to the receive observers, in arrival order,
//! one chunk at a time. Outgoing units accumulate in the send buffer until
//! `commit()` flushes them in a single write.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, trace};

use berth_core::Observable;
use berth_wire::{FramingError, Unit, UnitBuilder, UnitBuilderManager};

use crate::transport::{Conn, ReadResult};

type ReceiveCallback = dyn Fn(&Arc<Connection>, &Unit) + Send + Sync;
type DisconnectWithIdCallback = dyn Fn(u64) + Send + Sync;
type DisconnectCallback = dyn Fn() + Send + Sync;

pub struct Connection {
    transport: Arc<Conn>,
    protocol: Mutex<UnitBuilderManager>,
    send_buffer: Mutex<Vec<u8>>,
    receive_observers: Observable<ReceiveCallback>,
    disconnect_with_id_observers: Observable<DisconnectWithIdCallback>,
    disconnect_observers: Observable<DisconnectCallback>,
}

impl Connection {
    /// Wrap a transport connection with a fresh clone of `protocol`.
    pub(crate) fn wrap(transport: Arc<Conn>, protocol: &dyn UnitBuilder) -> Arc<Self> {
        let connection = Arc::new(Self {
            transport: Arc::clone(&transport),
            protocol: Mutex::new(UnitBuilderManager::new(protocol.clone_box())),
            send_buffer: Mutex::new(Vec::new()),
            receive_observers: Observable::new(),
            disconnect_with_id_observers: Observable::new(),
            disconnect_observers: Observable::new(),
        });
        let weak = Arc::downgrade(&connection);
        transport.on_disconnect(move |_| {
            if let Some(connection) = weak.upgrade() {
                connection.on_transport_disconnected();
            }
        });
        trace!(id = connection.id(), "connection created");
        connection
    }

    pub fn id(&self) -> u64 {
        self.transport.id()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn remote_endpoint(&self) -> String {
        self.transport.remote_endpoint().to_string()
    }

    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    /// Build the outgoing unit for `payload` with this connection's protocol.
    pub fn create(&self, payload: &[u8]) -> Result<Unit, FramingError> {
        self.protocol.lock().builder().create(payload)
    }

    /// Append a unit's wire form to the send buffer. No I/O happens here.
    pub fn post(&self, unit: &Unit) -> &Self {
        self.send_buffer.lock().extend(unit.to_network_string());
        trace!(id = self.id(), "stored unit");
        self
    }

    /// Frame `payload` with the connection's protocol and buffer it.
    pub fn post_bytes(&self, payload: &[u8]) -> Result<&Self, FramingError> {
        let unit = self.create(payload)?;
        Ok(self.post(&unit))
    }

    /// Flush every buffered unit in one write.
    pub fn commit(&self) -> &Self {
        let buffer = std::mem::take(&mut *self.send_buffer.lock());
        if buffer.is_empty() {
            return self;
        }
        trace!(id = self.id(), bytes = buffer.len(), "committing send buffer");
        self.transport.async_write(buffer, None);
        self
    }

    /// Subscribe to received units. Multiple subscribers are supported.
    pub fn on_receive(
        &self,
        callback: impl Fn(&Arc<Connection>, &Unit) + Send + Sync + 'static,
    ) -> &Self {
        self.receive_observers.subscribe(Arc::new(callback));
        self
    }

    /// Subscribe to disconnect with the connection id.
    pub fn on_disconnect_with_id(&self, callback: impl Fn(u64) + Send + Sync + 'static) -> &Self {
        self.disconnect_with_id_observers.subscribe(Arc::new(callback));
        self
    }

    /// Subscribe to disconnect.
    pub fn on_disconnect(&self, callback: impl Fn() + Send + Sync + 'static) -> &Self {
        self.disconnect_observers.subscribe(Arc::new(callback));
        self
    }

    /// Request the next chunk from the transport.
    ///
    /// The server and client call this once after the user attached their
    /// observers; afterwards the connection re-issues it itself.
    pub(crate) fn async_read(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let chunk_size = self.transport.chunk_size();
        self.transport.async_read(
            chunk_size,
            Box::new(move |result| {
                if let Some(connection) = weak.upgrade() {
                    connection.on_raw_receive(result);
                }
            }),
        );
    }

    fn on_raw_receive(self: &Arc<Self>, result: ReadResult) {
        if !result.success {
            return;
        }
        {
            let mut protocol = self.protocol.lock();
            if let Err(framing) = protocol.feed(&result.buffer) {
                drop(protocol);
                error!(id = self.id(), error = %framing, "invalid frame, disconnecting");
                self.transport.disconnect();
                return;
            }
        }

        while self.is_connected() {
            let unit = self.protocol.lock().pop_front();
            let Some(unit) = unit else { break };
            trace!(id = self.id(), "unit fully built");
            for observer in self.receive_observers.snapshot() {
                // A panicking observer must not take the transport down.
                let dispatch = std::panic::AssertUnwindSafe(|| observer(self, &unit));
                if std::panic::catch_unwind(dispatch).is_err() {
                    error!(id = self.id(), "receive observer panicked");
                }
            }
        }

        self.async_read();
    }

    fn on_transport_disconnected(&self) {
        trace!(id = self.id(), "has been disconnected");
        self.send_buffer.lock().clear();

        let id = self.id();
        for observer in self.disconnect_with_id_observers.take_all().into_iter().rev() {
            observer(id);
        }
        for observer in self.disconnect_observers.take_all().into_iter().rev() {
            observer();
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
