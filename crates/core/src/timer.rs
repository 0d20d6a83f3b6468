// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot and periodic timers bound to an event loop.
//!
//! Callbacks are dispatched through the loop's strand. Stopping a timer
//! before its callback fires guarantees the callback will not run afterwards;
//! the token is re-checked at dispatch, on the loop itself.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::event_loop::EventLoop;

/// A one-shot timer. Re-arming replaces the previous schedule.
pub struct Timer {
    el: EventLoop,
    armed: Mutex<Option<CancellationToken>>,
}

impl Timer {
    pub fn new(el: &EventLoop) -> Self {
        Self { el: el.clone(), armed: Mutex::new(None) }
    }

    /// Arm the timer; `callback` fires once on a worker of the loop.
    pub fn start(&self, duration: Duration, callback: impl FnOnce() + Send + 'static) {
        assert!(
            duration >= Duration::from_millis(1),
            "1 millisecond is minimum timer accuracy"
        );
        self.stop();

        let token = CancellationToken::new();
        *self.armed.lock() = Some(token.clone());

        let target = self.el.downgrade();
        let fire = token.clone();
        self.el.spawn(async move {
            tokio::select! {
                _ = fire.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    let check = fire.clone();
                    if let Some(target) = target.upgrade() {
                        target.post(move || {
                            if !check.is_cancelled() {
                                callback();
                            }
                        });
                    }
                }
            }
        });
    }

    /// Cancel a pending schedule. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.armed.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A timer that re-arms itself when its callback completes (no catch-up).
pub struct PeriodicTimer {
    el: EventLoop,
    armed: Mutex<Option<CancellationToken>>,
}

impl PeriodicTimer {
    pub fn new(el: &EventLoop) -> Self {
        Self { el: el.clone(), armed: Mutex::new(None) }
    }

    /// Arm the timer; `callback` fires every `period` after the previous
    /// invocation completed.
    pub fn start(&self, period: Duration, callback: impl Fn() + Send + Sync + 'static) {
        assert!(
            period >= Duration::from_millis(1),
            "1 millisecond is minimum timer accuracy"
        );
        self.stop();

        let token = CancellationToken::new();
        *self.armed.lock() = Some(token.clone());

        let target = self.el.downgrade();
        let callback = Arc::new(callback);
        self.el.spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(period) => {}
                }
                let Some(dispatch) = target.upgrade() else { break };
                let (done_tx, done_rx) = tokio::sync::oneshot::channel();
                let check = token.clone();
                let callback = Arc::clone(&callback);
                dispatch.post(move || {
                    if !check.is_cancelled() {
                        callback();
                    }
                    let _ = done_tx.send(());
                });
                // Re-arm only after the callback completed; bail out when the
                // loop dropped the dispatch.
                if done_rx.await.is_err() {
                    break;
                }
            }
        });
    }

    /// Cancel the schedule. Idempotent.
    pub fn stop(&self) {
        if let Some(token) = self.armed.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
