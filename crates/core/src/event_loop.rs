// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative task scheduler with an owned worker pool.
//!
//! An `EventLoop` owns one worker thread (or a pool of N) draining a shared
//! task queue. Tasks submitted through [`EventLoop::post`] are serialized
//! through the loop's strand: no two posted tasks run concurrently, and tasks
//! from one submitter run in submission order. Futures submitted through
//! [`EventLoop::spawn`] are strand-free and may run in parallel across
//! workers of a pooled loop.
//!
//! Tasks posted before `start()` are held and drain once the loop starts.

use std::cell::Cell;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::bridge;
use crate::error::LoopError;

/// A unit of work scheduled onto an event loop.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

thread_local! {
    static CURRENT_LOOP: Cell<u64> = const { Cell::new(0) };
}

static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

struct Chan {
    tx: Option<UnboundedSender<Task>>,
    rx: Option<UnboundedReceiver<Task>>,
}

impl Chan {
    fn fresh() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx: Some(tx), rx: Some(rx) }
    }
}

pub(crate) struct LoopCore {
    id: u64,
    workers: usize,
    is_main: bool,
    name: Mutex<String>,
    running: AtomicBool,
    queue_depth: Arc<AtomicU64>,
    chan: Mutex<Chan>,
    handle: Mutex<Option<Handle>>,
    runtime: Mutex<Option<Runtime>>,
    drained: Mutex<Option<std::sync::mpsc::Receiver<()>>>,
    start_notify: Mutex<Option<Task>>,
    stop_notify: Mutex<Option<Task>>,
    // Serializes start/stop against each other; never held while draining.
    lifecycle: Mutex<()>,
    state: Mutex<bool>,
    state_cv: Condvar,
}

/// A cooperative task scheduler with timers and a synchronous wait bridge.
///
/// Cloning yields another handle to the same loop. Dropping the last handle
/// shuts the loop down.
#[derive(Clone)]
pub struct EventLoop {
    core: Arc<LoopCore>,
}

impl EventLoop {
    /// Create an inert single-threaded loop.
    pub fn new() -> Self {
        Self::with_workers(1, false)
    }

    /// Create an inert loop with a pool of `worker_threads` workers.
    pub fn pooled(worker_threads: usize) -> Self {
        assert!(worker_threads >= 1, "a loop needs at least one worker thread");
        Self::with_workers(worker_threads, false)
    }

    pub(crate) fn with_workers(workers: usize, is_main: bool) -> Self {
        let core = LoopCore {
            id: NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed),
            workers,
            is_main,
            name: Mutex::new(String::from("loop")),
            running: AtomicBool::new(false),
            queue_depth: Arc::new(AtomicU64::new(0)),
            chan: Mutex::new(Chan::fresh()),
            handle: Mutex::new(None),
            runtime: Mutex::new(None),
            drained: Mutex::new(None),
            start_notify: Mutex::new(None),
            stop_notify: Mutex::new(None),
            lifecycle: Mutex::new(()),
            state: Mutex::new(false),
            state_cv: Condvar::new(),
        };
        Self { core: Arc::new(core) }
    }

    /// True only on the process's original thread.
    pub fn is_main_thread() -> bool {
        std::thread::current().name() == Some("main")
    }

    /// Rename worker threads. Applies to workers created by the next `start()`.
    pub fn change_thread_name(&self, name: &str) -> &Self {
        *self.core.name.lock() = name.to_string();
        self
    }

    pub fn name(&self) -> String {
        self.core.name.lock().clone()
    }

    pub fn is_main(&self) -> bool {
        self.core.is_main
    }

    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::SeqCst)
    }

    /// True only inside a worker of this loop.
    pub fn is_this_loop(&self) -> bool {
        CURRENT_LOOP.with(|c| c.get()) == self.core.id
    }

    /// Number of posted tasks not yet completed.
    pub fn queue_size(&self) -> u64 {
        self.core.queue_depth.load(Ordering::Relaxed)
    }

    /// Callback invoked on a worker when the loop has started.
    pub fn on_start(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        *self.core.start_notify.lock() = Some(Box::new(callback));
        self
    }

    /// Callback invoked after all workers have drained and exited.
    pub fn on_stop(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        *self.core.stop_notify.lock() = Some(Box::new(callback));
        self
    }

    /// Enqueue a task to run on a worker of this loop.
    ///
    /// Tasks submitted from one thread run in submission order; no two posted
    /// tasks run concurrently.
    pub fn post(&self, task: impl FnOnce() + Send + 'static) {
        self.post_task(Box::new(task));
    }

    pub(crate) fn post_task(&self, task: Task) {
        self.core.queue_depth.fetch_add(1, Ordering::Relaxed);
        let sent = {
            let chan = self.core.chan.lock();
            match &chan.tx {
                Some(tx) => tx.send(task).is_ok(),
                None => false,
            }
        };
        if !sent {
            // Loop is stopping; the task will never run.
            self.core.queue_depth.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Submit a strand-free future onto the loop's workers.
    ///
    /// Dropped silently when the loop is not running.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.core.handle.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.spawn(future);
        }
    }

    /// Launch the worker pool.
    pub fn start(&self) -> Result<(), LoopError> {
        let _lifecycle = self.core.lifecycle.lock();
        if self.is_running() {
            return Err(LoopError::AlreadyRunning);
        }

        let rx = match self.core.chan.lock().rx.take() {
            Some(rx) => rx,
            None => return Err(LoopError::AlreadyRunning),
        };

        let id = self.core.id;
        let runtime = Builder::new_multi_thread()
            .worker_threads(self.core.workers)
            .thread_name(self.core.name.lock().clone())
            .enable_all()
            .on_thread_start(move || CURRENT_LOOP.with(|c| c.set(id)))
            .on_thread_stop(|| CURRENT_LOOP.with(|c| c.set(0)))
            .build()
            .map_err(LoopError::Spawn)?;

        *self.core.handle.lock() = Some(runtime.handle().clone());
        let depth = Arc::clone(&self.core.queue_depth);
        let stop_notify = self.core.stop_notify.lock().take();
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let _ = runtime.spawn(drive(rx, depth, stop_notify, Some(done_tx)));
        *self.core.drained.lock() = Some(done_rx);
        *self.core.runtime.lock() = Some(runtime);

        self.mark_running(true);

        if let Some(callback) = self.core.start_notify.lock().take() {
            self.post_task(callback);
        }
        Ok(())
    }

    /// Stop the loop: close the strand, drain queued tasks, join workers.
    ///
    /// Idempotent. Must not be called from one of the loop's own workers.
    pub fn stop(&self) {
        assert!(
            !self.is_this_loop(),
            "cannot stop an event loop from one of its own workers"
        );
        assert!(!self.core.is_main, "the main loop stops through its exit path");

        let _lifecycle = self.core.lifecycle.lock();
        if !self.is_running() {
            return;
        }

        // Dropping the sender lets the driver drain what is queued and exit.
        self.core.chan.lock().tx = None;

        let runtime = self.core.runtime.lock().take();
        let drained = self.core.drained.lock().take();
        self.core.handle.lock().take();

        if let Some(drained) = drained {
            let _ = drained.recv_timeout(Duration::from_secs(5));
        }
        if let Some(runtime) = runtime {
            shutdown_runtime(runtime);
        }

        *self.core.chan.lock() = Chan::fresh();
        self.core.queue_depth.store(0, Ordering::Relaxed);
        self.mark_running(false);
    }

    /// Run the loop inline on the calling thread until the strand closes.
    pub(crate) fn run_inline(&self) -> Result<(), LoopError> {
        let rx = {
            let _lifecycle = self.core.lifecycle.lock();
            if self.is_running() {
                return Err(LoopError::AlreadyRunning);
            }
            match self.core.chan.lock().rx.take() {
                Some(rx) => rx,
                None => return Err(LoopError::AlreadyRunning),
            }
        };

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(LoopError::Spawn)?;
        *self.core.handle.lock() = Some(runtime.handle().clone());

        CURRENT_LOOP.with(|c| c.set(self.core.id));
        self.mark_running(true);

        if let Some(callback) = self.core.start_notify.lock().take() {
            self.post_task(callback);
        }

        let depth = Arc::clone(&self.core.queue_depth);
        let stop_notify = self.core.stop_notify.lock().take();
        runtime.block_on(drive(rx, depth, stop_notify, None));

        CURRENT_LOOP.with(|c| c.set(0));
        self.core.handle.lock().take();
        drop(runtime);

        *self.core.chan.lock() = Chan::fresh();
        self.core.queue_depth.store(0, Ordering::Relaxed);
        self.mark_running(false);
        Ok(())
    }

    /// Close the strand without joining; the driver drains and exits.
    pub(crate) fn close_queue(&self) {
        self.core.chan.lock().tx = None;
    }

    /// Block until the loop reports started.
    pub fn wait_started(&self) {
        let mut started = self.core.state.lock();
        while !*started {
            self.core.state_cv.wait(&mut started);
        }
    }

    /// Block until the loop reports stopped.
    pub fn wait_stopped(&self) {
        let mut started = self.core.state.lock();
        while *started {
            self.core.state_cv.wait(&mut started);
        }
    }

    /// One-shot timer firing `callback` on a worker of this loop.
    ///
    /// The timer is canceled by dropping the returned handle.
    pub fn start_timer(
        &self,
        duration: Duration,
        callback: impl FnOnce() + Send + 'static,
    ) -> TimerHandle {
        assert!(
            duration >= Duration::from_millis(1),
            "1 millisecond is minimum timer accuracy"
        );
        let token = CancellationToken::new();
        let armed = token.clone();
        let target = self.downgrade();
        self.spawn(async move {
            tokio::select! {
                _ = armed.cancelled() => {}
                _ = tokio::time::sleep(duration) => {
                    let check = armed.clone();
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
        TimerHandle { token }
    }

    /// Post `callable` and block until it completed or `timeout` elapsed.
    ///
    /// Returns whether the callable ran before the timeout. A late completion
    /// is discarded without touching caller state.
    pub fn wait(&self, callable: impl FnOnce() + Send + 'static, timeout: Option<Duration>) -> bool {
        assert!(
            !self.is_this_loop(),
            "cannot wait on an event loop from one of its own workers"
        );
        bridge::wait_async(|task| self.post_task(task), callable, timeout)
    }

    /// Post `callable` and block for its return value.
    ///
    /// Returns `initial` when the timeout elapses first. A panic inside the
    /// callable is re-raised in the caller.
    pub fn wait_result<R>(
        &self,
        initial: R,
        callable: impl FnOnce() -> R + Send + 'static,
        timeout: Option<Duration>,
    ) -> R
    where
        R: Send + 'static,
    {
        assert!(
            !self.is_this_loop(),
            "cannot wait on an event loop from one of its own workers"
        );
        bridge::wait_async_result(initial, |task| self.post_task(task), callable, timeout)
    }

    /// Weak handle for closures that live on the loop's own runtime.
    ///
    /// Futures spawned onto the runtime must not keep the loop alive, or the
    /// runtime and its tasks form a reference cycle that outlives every user
    /// handle.
    pub(crate) fn downgrade(&self) -> WeakLoop {
        WeakLoop(Arc::downgrade(&self.core))
    }

    fn mark_running(&self, value: bool) {
        self.core.running.store(value, Ordering::SeqCst);
        let mut started = self.core.state.lock();
        *started = value;
        self.core.state_cv.notify_all();
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for LoopCore {
    fn drop(&mut self) {
        // Best-effort teardown; queued tasks are lost.
        self.chan.lock().tx = None;
        if let Some(runtime) = self.runtime.lock().take() {
            shutdown_runtime(runtime);
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Shut a runtime down from any thread.
///
/// A blocking shutdown panics inside another runtime's context, so there the
/// runtime is released in the background instead of joined.
fn shutdown_runtime(runtime: Runtime) {
    if Handle::try_current().is_ok() {
        runtime.shutdown_background();
    } else {
        runtime.shutdown_timeout(Duration::from_secs(5));
    }
}

#[derive(Clone)]
pub(crate) struct WeakLoop(std::sync::Weak<LoopCore>);

impl WeakLoop {
    pub(crate) fn upgrade(&self) -> Option<EventLoop> {
        self.0.upgrade().map(|core| EventLoop { core })
    }
}

/// Cancelable handle to a one-shot timer; dropping it cancels the timer.
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn drive(
    mut rx: UnboundedReceiver<Task>,
    depth: Arc<AtomicU64>,
    stop_notify: Option<Task>,
    done: Option<std::sync::mpsc::Sender<()>>,
) {
    while let Some(task) = rx.recv().await {
        run_task(task);
        depth.fetch_sub(1, Ordering::Relaxed);
    }
    if let Some(callback) = stop_notify {
        run_task(callback);
    }
    if let Some(done) = done {
        let _ = done.send(());
    }
}

fn run_task(task: Task) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!("task panicked in event loop worker");
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;
