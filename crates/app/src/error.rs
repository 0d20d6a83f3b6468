// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("application is already initialized")]
    AlreadyInitialized,

    #[error("application must be initialized from the process's initial thread")]
    NotMainThread,

    #[error(
        "application must be initialized before any other thread exists \
         ({0} threads found)"
    )]
    ThreadsAlreadyRunning(usize),

    #[error("failed to configure signal handling: {0}")]
    SignalSetup(#[source] nix::Error),

    #[error("failed to raise the core file limit: {0}")]
    CoreLimit(#[source] nix::Error),

    #[error("failed to daemonize: {0}")]
    Daemonize(#[source] nix::Error),
}
