// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wait bridge under timeout: an abandoned payload completes harmlessly
//! and later waits still succeed.

use std::time::Duration;

use berth_core::EventLoop;

#[test]
fn bridge_timeout_leaves_the_loop_usable() {
    let el = EventLoop::new();
    el.change_thread_name("bridge-spec");
    el.start().expect("start failed");

    let slow_task = || std::thread::sleep(Duration::from_millis(1000));
    assert!(!el.wait(slow_task, Some(Duration::from_millis(500))));

    // The abandoned task is still draining on the worker; a second wait with
    // room to spare queues behind it and completes.
    let quick_task = || {};
    assert!(el.wait(quick_task, Some(Duration::from_millis(1500))));

    el.stop();
}

#[test]
fn bridge_result_timeout_returns_the_initial_value() {
    let el = EventLoop::new();
    el.start().expect("start failed");

    let payload = || {
        std::thread::sleep(Duration::from_millis(800));
        "done"
    };
    assert_eq!(el.wait_result("initial", payload, Some(Duration::from_millis(100))), "initial");
    assert_eq!(el.wait_result("initial", || "fast", Some(Duration::from_millis(2000))), "fast");

    el.stop();
}
