// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berth-app: process-lifecycle supervision for daemons.
//!
//! The [`Application`] is a once-initializable process singleton. It owns the
//! main loop, a dedicated signal thread, and the crash-dump capture path, and
//! fans OS signals into exit / fail / control callbacks on the main loop.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod config;
mod dump;
pub mod env;
pub mod error;
pub mod logging;
pub mod signal;

pub use application::{Application, EXIT_CODE_ERROR, EXIT_CODE_OK};
pub use config::AppConfig;
pub use error::AppError;
pub use signal::{ControlSignal, SignalEvent, SignalSource};

#[cfg(any(test, feature = "test-support"))]
pub use signal::{FakeSignalHandle, FakeSignalSource};
