// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Network façade errors.

use thiserror::Error;

use berth_core::LoopError;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("already running")]
    AlreadyRunning,

    #[error("not running")]
    NotRunning,

    #[error(transparent)]
    Loop(#[from] LoopError),
}
