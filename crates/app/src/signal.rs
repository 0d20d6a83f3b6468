// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Signal classification and the signal-wait source.
//!
//! All handled signals are blocked on every thread (the mask is installed on
//! the initial thread before any other exists and inherited from there). The
//! dedicated signal thread is the only consumer: it sits in the platform
//! signal-wait primitive and routes whatever arrives.

use std::path::PathBuf;

use nix::sys::signal::{SigSet, Signal};
use parking_lot::Mutex;

/// User-controlled signals routed to the control callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Usr1,
    Usr2,
}

/// The last signal observed by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SignalEvent {
    #[default]
    Empty,
    Exit {
        signo: i32,
    },
    Control(ControlSignal),
    Fail {
        signo: i32,
        dump_path: Option<PathBuf>,
    },
}

/// Handling discipline for a delivered signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalClass {
    Fail,
    Exit,
    Control,
}

pub(crate) const FAIL_SIGNALS: [Signal; 9] = [
    Signal::SIGSEGV,
    Signal::SIGFPE,
    Signal::SIGABRT,
    Signal::SIGILL,
    Signal::SIGBUS,
    Signal::SIGSYS,
    Signal::SIGPIPE,
    Signal::SIGXCPU,
    Signal::SIGXFSZ,
];

pub(crate) const EXIT_SIGNALS: [Signal; 4] =
    [Signal::SIGTERM, Signal::SIGINT, Signal::SIGHUP, Signal::SIGQUIT];

pub(crate) const CONTROL_SIGNALS: [Signal; 2] = [Signal::SIGUSR1, Signal::SIGUSR2];

pub(crate) fn classify(signo: i32) -> Option<SignalClass> {
    let signal = Signal::try_from(signo).ok()?;
    if FAIL_SIGNALS.contains(&signal) {
        Some(SignalClass::Fail)
    } else if EXIT_SIGNALS.contains(&signal) {
        Some(SignalClass::Exit)
    } else if CONTROL_SIGNALS.contains(&signal) {
        Some(SignalClass::Control)
    } else {
        None
    }
}

pub(crate) fn handled_set() -> SigSet {
    let mut set = SigSet::empty();
    for signal in FAIL_SIGNALS.iter().chain(&EXIT_SIGNALS).chain(&CONTROL_SIGNALS) {
        set.add(*signal);
    }
    set
}

/// Block every handled signal on the calling thread.
pub(crate) fn block_handled_signals() -> nix::Result<()> {
    handled_set().thread_block()
}

/// What the signal thread blocks in.
///
/// The production source wraps the platform signal wait; tests substitute a
/// channel-backed fake.
pub trait SignalSource: Send + Sync {
    /// Block until a handled signal is delivered; returns its number.
    fn wait(&self) -> Option<i32>;

    /// Deliver a synthetic terminate to unblock a pending `wait`.
    fn interrupt(&self);

    /// Invoked once from the signal thread before the first `wait`.
    fn attach(&self, thread: nix::sys::pthread::Pthread) {
        let _ = thread;
    }
}

/// Blocks in `sigwait` on the handled signal set.
pub(crate) struct SigwaitSource {
    set: SigSet,
    thread: Mutex<Option<nix::sys::pthread::Pthread>>,
}

impl SigwaitSource {
    pub fn new() -> Self {
        Self { set: handled_set(), thread: Mutex::new(None) }
    }
}

impl SignalSource for SigwaitSource {
    fn wait(&self) -> Option<i32> {
        self.set.wait().ok().map(|signal| signal as i32)
    }

    fn interrupt(&self) {
        // Signals are blocked everywhere else, so the terminate must target
        // the signal thread itself.
        if let Some(thread) = *self.thread.lock() {
            let _ = nix::sys::pthread::pthread_kill(thread, Signal::SIGTERM);
        }
    }

    fn attach(&self, thread: nix::sys::pthread::Pthread) {
        *self.thread.lock() = Some(thread);
    }
}

/// Channel-backed signal source for tests.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeSignalSource {
    tx: Mutex<std::sync::mpsc::Sender<i32>>,
    rx: Mutex<std::sync::mpsc::Receiver<i32>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeSignalSource {
    pub fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self { tx: Mutex::new(tx), rx: Mutex::new(rx) }
    }

    /// A handle for raising signals into the source.
    pub fn handle(&self) -> FakeSignalHandle {
        FakeSignalHandle { tx: self.tx.lock().clone() }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeSignalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl SignalSource for FakeSignalSource {
    fn wait(&self) -> Option<i32> {
        self.rx.lock().recv().ok()
    }

    fn interrupt(&self) {
        let _ = self.tx.lock().send(Signal::SIGTERM as i32);
    }
}

/// Raises synthetic signals into a [`FakeSignalSource`].
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone)]
pub struct FakeSignalHandle {
    tx: std::sync::mpsc::Sender<i32>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeSignalHandle {
    pub fn raise(&self, signal: Signal) {
        let _ = self.tx.send(signal as i32);
    }

    pub fn raise_signo(&self, signo: i32) {
        let _ = self.tx.send(signo);
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
