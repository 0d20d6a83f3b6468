// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous waiting on asynchronous completions.
//!
//! `caller` is any facility that will eventually run a task (typically
//! [`EventLoop::post`](crate::EventLoop::post)). The bridge hands the task a
//! one-shot channel sender; the caller blocks on the receiver with an optional
//! timeout. When the timeout elapses first, the receiver is gone and the late
//! completion's publish fails silently, so the result is discarded instead of
//! being written into an abandoned caller frame.

use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::time::Duration;

use crate::event_loop::Task;

/// Wait for `asynch_func` to run via `caller_func`, returning its result.
///
/// Returns `initial_result` when the callable could not be invoked before the
/// timeout. A panic raised inside the callable is re-raised in the caller.
pub fn wait_async_result<R, C, F>(
    initial_result: R,
    caller_func: C,
    asynch_func: F,
    timeout: Option<Duration>,
) -> R
where
    R: Send + 'static,
    C: FnOnce(Task),
    F: FnOnce() -> R + Send + 'static,
{
    if let Some(timeout) = timeout {
        assert!(
            timeout >= Duration::from_millis(1),
            "1 millisecond is minimum waiting accuracy"
        );
    }

    let (tx, rx) = mpsc::sync_channel::<std::thread::Result<R>>(1);
    caller_func(Box::new(move || {
        let result = catch_unwind(AssertUnwindSafe(asynch_func));
        // Send fails when the caller timed out; the result is abandoned.
        let _ = tx.send(result);
    }));

    let received = match timeout {
        Some(timeout) => rx.recv_timeout(timeout).ok(),
        None => rx.recv().ok(),
    };
    match received {
        Some(Ok(value)) => value,
        Some(Err(payload)) => resume_unwind(payload),
        None => initial_result,
    }
}

/// Wait for `asynch_func` to run via `caller_func`.
///
/// Returns whether the callable ran before the timeout.
pub fn wait_async<C, F>(caller_func: C, asynch_func: F, timeout: Option<Duration>) -> bool
where
    C: FnOnce(Task),
    F: FnOnce() + Send + 'static,
{
    wait_async_result(
        false,
        caller_func,
        move || {
            asynch_func();
            true
        },
        timeout,
    )
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
