// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! berth-core: concurrency substrate for long-lived network daemons.
//!
//! Provides the event loop (single-threaded and pooled), the distinguished
//! main loop that owns process exit, timers bound to a loop, and the wait
//! bridge that turns asynchronous completions into synchronous calls.

pub mod bridge;
pub mod error;
pub mod event_loop;
pub mod main_loop;
pub mod observer;
pub mod timer;

pub use bridge::{wait_async, wait_async_result};
pub use error::LoopError;
pub use event_loop::{EventLoop, Task, TimerHandle};
pub use main_loop::MainLoop;
pub use observer::Observable;
pub use timer::{PeriodicTimer, Timer};
