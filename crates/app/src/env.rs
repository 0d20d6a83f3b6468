// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the application crate.

use std::path::PathBuf;
use std::time::Duration;

/// Default crash-dump path: `BERTH_STDUMP_PATH` or `./stdump.txt`.
pub fn default_stdump_path() -> PathBuf {
    std::env::var("BERTH_STDUMP_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("stdump.txt"))
}

/// How long the signal thread waits for the exit callback to finish on the
/// main loop (default 5s, `BERTH_EXIT_TIMEOUT_MS`).
pub fn exit_dispatch_timeout() -> Duration {
    std::env::var("BERTH_EXIT_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
