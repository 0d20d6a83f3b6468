// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The distinguished event loop that runs on the process's initial thread
//! and owns the process exit code.

use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::LoopError;
use crate::event_loop::{EventLoop, Task};

/// An event loop plus a stored exit callback and an exit-code slot.
///
/// `start()` runs the loop inline on the calling thread and blocks until
/// [`MainLoop::exit`] (or [`MainLoop::stop`]) closes the queue.
pub struct MainLoop {
    el: EventLoop,
    exit_code: AtomicI32,
    exit_callback: Mutex<Option<Task>>,
}

impl MainLoop {
    pub fn new(name: &str) -> Self {
        let el = EventLoop::with_workers(1, true);
        el.change_thread_name(name);
        Self { el, exit_code: AtomicI32::new(0), exit_callback: Mutex::new(None) }
    }

    /// The underlying event loop, for attaching timers and servers.
    pub fn event_loop(&self) -> &EventLoop {
        &self.el
    }

    pub fn set_exit_callback(&self, callback: impl FnOnce() + Send + 'static) {
        *self.exit_callback.lock() = Some(Box::new(callback));
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code.load(Ordering::SeqCst)
    }

    /// Run the loop on the calling thread until `exit` is requested.
    pub fn start(&self) -> Result<(), LoopError> {
        self.el.run_inline()
    }

    /// Record `code`, run the exit callback on the loop, and let the queue
    /// drain. Callable from any thread, including the loop's own workers.
    pub fn exit(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
        if !self.el.is_running() {
            debug!(code, "exit requested before the main loop started");
            return;
        }
        if let Some(callback) = self.exit_callback.lock().take() {
            self.el.post(callback);
        }
        self.el.close_queue();
    }

    /// Stop without changing the recorded exit code.
    pub fn stop(&self) {
        self.exit(self.exit_code());
    }

    pub fn is_running(&self) -> bool {
        self.el.is_running()
    }

    pub fn is_this_loop(&self) -> bool {
        self.el.is_this_loop()
    }

    pub fn queue_size(&self) -> u64 {
        self.el.queue_size()
    }

    pub fn change_thread_name(&self, name: &str) -> &Self {
        self.el.change_thread_name(name);
        self
    }

    pub fn on_start(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        self.el.on_start(callback);
        self
    }

    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.el.post(task);
    }

    pub fn wait(&self, callable: impl FnOnce() + Send + 'static, timeout: Option<Duration>) -> bool {
        self.el.wait(callable, timeout)
    }

    pub fn wait_result<R>(
        &self,
        initial: R,
        callable: impl FnOnce() -> R + Send + 'static,
        timeout: Option<Duration>,
    ) -> R
    where
        R: Send + 'static,
    {
        self.el.wait_result(initial, callable, timeout)
    }

    /// Block until the loop reports started.
    pub fn wait_started(&self) {
        self.el.wait_started();
    }
}

#[cfg(test)]
#[path = "main_loop_tests.rs"]
mod tests;
