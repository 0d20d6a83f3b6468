// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscribe/notify list for callback observers.

use std::sync::Arc;

use parking_lot::Mutex;

/// An ordered list of shared observers.
///
/// `T` is typically an unsized callback type such as
/// `dyn Fn(&Event) + Send + Sync`. Notification iterates over a snapshot, so
/// an observer may subscribe further observers without deadlocking.
pub struct Observable<T: ?Sized> {
    subscribers: Mutex<Vec<Arc<T>>>,
}

impl<T: ?Sized> Observable<T> {
    pub fn new() -> Self {
        Self { subscribers: Mutex::new(Vec::new()) }
    }

    pub fn subscribe(&self, observer: Arc<T>) {
        self.subscribers.lock().push(observer);
    }

    /// Copy of the current subscriber list, in subscription order.
    pub fn snapshot(&self) -> Vec<Arc<T>> {
        self.subscribers.lock().clone()
    }

    /// Remove and return every subscriber, in subscription order.
    ///
    /// Used for lists that must fire exactly once (disconnect observers).
    pub fn take_all(&self) -> Vec<Arc<T>> {
        std::mem::take(&mut *self.subscribers.lock())
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl<T: ?Sized> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
