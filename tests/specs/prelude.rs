// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the spec tests.

use std::time::{Duration, Instant};

/// Ceiling for any single asynchronous expectation.
pub const SPEC_WAIT: Duration = Duration::from_secs(10);

/// Poll `predicate` until it holds or `max` elapses.
pub fn wait_for(max: Duration, predicate: impl Fn() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < max {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

/// An ephemeral TCP port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener =
        std::net::TcpListener::bind(("127.0.0.1", 0)).expect("could not probe for a free port");
    listener.local_addr().expect("listener has no local address").port()
}
