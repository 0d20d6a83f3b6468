// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event loop errors.

use thiserror::Error;

/// Errors from event loop lifecycle operations.
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("event loop is already running")]
    AlreadyRunning,

    #[error("event loop failed to start workers: {0}")]
    Spawn(#[source] std::io::Error),
}
