// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-singleton application supervisor.
//!
//! `init` must run on the process's initial thread before any other thread
//! exists: the handled signal set is blocked there and inherited by every
//! thread spawned afterwards, which is what makes a dedicated signal-wait
//! thread safe in a multithreaded process. `run` spawns that signal thread
//! and then parks the calling thread inside the main loop until an exit
//! signal or an explicit [`Application::stop`] ends it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use nix::sys::signal::Signal;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};

use berth_core::{EventLoop, MainLoop};

use crate::config::AppConfig;
use crate::dump;
use crate::env;
use crate::error::AppError;
use crate::signal::{self, ControlSignal, SignalClass, SignalEvent, SignalSource, SigwaitSource};

pub const EXIT_CODE_OK: i32 = 0;
pub const EXIT_CODE_ERROR: i32 = 1;

type StartCallback = Box<dyn FnOnce() + Send>;
type ExitCallback = Box<dyn FnOnce(i32) + Send>;
type FailCallback = Box<dyn FnOnce(i32, Option<PathBuf>) + Send>;
type ControlCallback = std::sync::Arc<dyn Fn(ControlSignal) + Send + Sync>;

static APPLICATION: OnceLock<Application> = OnceLock::new();

/// Process-wide supervisor owning the main loop and the signal thread.
pub struct Application {
    config: AppConfig,
    main_loop: MainLoop,
    source: Box<dyn SignalSource>,
    signal_thread: Mutex<Option<std::thread::JoinHandle<()>>>,
    signal_thread_initiated: AtomicBool,
    signal_thread_terminating: AtomicBool,
    last_signal: Mutex<SignalEvent>,
    start_callback: Mutex<Option<StartCallback>>,
    exit_callback: Mutex<Option<ExitCallback>>,
    fail_callback: Mutex<Option<FailCallback>>,
    control_callback: Mutex<Option<ControlCallback>>,
}

impl Application {
    /// Initialize the singleton. Errors on a second call, off the initial
    /// thread, or when other threads already exist.
    pub fn init(config: AppConfig) -> Result<&'static Application, AppError> {
        Self::init_impl(config, Box::new(SigwaitSource::new()))
    }

    /// Initialize with a substitute signal source.
    #[cfg(any(test, feature = "test-support"))]
    pub fn init_with_source(
        config: AppConfig,
        source: impl SignalSource + 'static,
    ) -> Result<&'static Application, AppError> {
        Self::init_impl(config, Box::new(source))
    }

    fn init_impl(
        config: AppConfig,
        source: Box<dyn SignalSource>,
    ) -> Result<&'static Application, AppError> {
        if config.enforce_main_thread {
            if !EventLoop::is_main_thread() {
                return Err(AppError::NotMainThread);
            }
            ensure_single_threaded()?;
        }

        signal::block_handled_signals().map_err(AppError::SignalSetup)?;

        if config.enable_corefile {
            dump::raise_core_limit().map_err(AppError::CoreLimit)?;
            if let Some(archived) = dump::archive_existing_core(std::path::Path::new(".")) {
                info!(archived = %archived.display(), "archived previous core file");
            }
        }

        if config.daemonize {
            nix::unistd::daemon(true, config.lock_io).map_err(AppError::Daemonize)?;
        }

        let application = Application {
            main_loop: MainLoop::new(&executable_name()),
            source,
            signal_thread: Mutex::new(None),
            signal_thread_initiated: AtomicBool::new(false),
            signal_thread_terminating: AtomicBool::new(false),
            last_signal: Mutex::new(SignalEvent::Empty),
            start_callback: Mutex::new(None),
            exit_callback: Mutex::new(None),
            fail_callback: Mutex::new(None),
            control_callback: Mutex::new(None),
            config,
        };
        if APPLICATION.set(application).is_err() {
            return Err(AppError::AlreadyInitialized);
        }
        Ok(Self::instance_static())
    }

    /// The initialized singleton, if any.
    pub fn instance() -> Option<&'static Application> {
        APPLICATION.get()
    }

    fn instance_static() -> &'static Application {
        match APPLICATION.get() {
            Some(application) => application,
            // set() succeeded just above
            None => unreachable!(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.main_loop.is_running()
    }

    /// Callback invoked on the main loop when the application has started.
    pub fn on_start(&self, callback: impl FnOnce() + Send + 'static) -> &Self {
        assert!(!self.is_running(), "call before running");
        *self.start_callback.lock() = Some(Box::new(callback));
        self
    }

    /// Callback invoked once, on the main loop, when an exit signal arrives
    /// (or on the run thread after an explicit stop).
    pub fn on_exit(&self, callback: impl FnOnce(i32) + Send + 'static) -> &Self {
        assert!(!self.is_running(), "call before running");
        *self.exit_callback.lock() = Some(Box::new(callback));
        self
    }

    /// Callback invoked from signal-thread context after the crash dump was
    /// written; the process aborts when it returns.
    pub fn on_fail(
        &self,
        callback: impl FnOnce(i32, Option<PathBuf>) + Send + 'static,
    ) -> &Self {
        assert!(!self.is_running(), "call before running");
        *self.fail_callback.lock() = Some(Box::new(callback));
        self
    }

    /// Callback invoked on the main loop for USR1/USR2.
    pub fn on_control(&self, callback: impl Fn(ControlSignal) + Send + Sync + 'static) -> &Self {
        assert!(!self.is_running(), "call before running");
        *self.control_callback.lock() = Some(std::sync::Arc::new(callback));
        self
    }

    /// Run the main loop on the calling thread; returns the exit code.
    pub fn run(&self) -> i32 {
        let Some(app) = APPLICATION.get() else { return EXIT_CODE_ERROR };
        if app.main_loop.is_running() {
            return EXIT_CODE_ERROR;
        }

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        let spawned = std::thread::Builder::new().name("signal".to_string()).spawn(move || {
            app.signal_thread_main(ready_tx);
        });
        match spawned {
            Ok(handle) => *app.signal_thread.lock() = Some(handle),
            Err(error) => {
                warn!(%error, "failed to spawn the signal thread");
                return EXIT_CODE_ERROR;
            }
        }
        // The signal thread has published "initiated".
        let _ = ready_rx.recv();

        if let Some(callback) = app.start_callback.lock().take() {
            app.main_loop.on_start(move || {
                debug!("application has started");
                callback();
            });
        } else {
            app.main_loop.on_start(|| debug!("application has started"));
        }

        if app.main_loop.start().is_err() {
            return EXIT_CODE_ERROR;
        }

        debug!("application is stopping");
        if !app.signal_thread_terminating.load(Ordering::SeqCst) {
            // The stop came from user code; unblock the signal wait.
            trace!("notifying the signal thread");
            app.source.interrupt();
        }
        if let Some(handle) = app.signal_thread.lock().take() {
            let _ = handle.join();
        }

        // An exit signal consumed the callback on its own path; an explicit
        // stop leaves it for here.
        if let Some(callback) = app.exit_callback.lock().take() {
            callback(0);
        }

        info!("application has stopped");
        app.cleanup();
        app.main_loop.exit_code()
    }

    /// Stop the main loop with `exit_code`.
    pub fn stop(&self, exit_code: i32) {
        self.main_loop.exit(exit_code);
    }

    /// Block until the application reports started.
    pub fn wait(&self) {
        self.main_loop.wait_started();
    }

    pub fn main_loop(&self) -> &MainLoop {
        &self.main_loop
    }

    /// The most recent signal event observed by the supervisor.
    pub fn last_signal(&self) -> SignalEvent {
        self.last_signal.lock().clone()
    }

    fn signal_thread_main(&self, ready_tx: std::sync::mpsc::Sender<()>) {
        trace!("signal thread has started");
        self.source.attach(nix::sys::pthread::pthread_self());
        self.signal_thread_initiated.store(true, Ordering::SeqCst);
        let _ = ready_tx.send(());

        loop {
            let Some(signo) = self.source.wait() else {
                warn!("signal wait failed; signal thread exiting");
                break;
            };
            info!(signo, "got signal in signal thread");

            match signal::classify(signo) {
                Some(SignalClass::Fail) => self.process_fail(signo),
                Some(SignalClass::Exit) => {
                    self.signal_thread_terminating.store(true, Ordering::SeqCst);
                    self.process_exit(signo);
                }
                Some(SignalClass::Control) => self.process_control(signo),
                None => debug!(signo, "unclassified signal ignored"),
            }

            if self.signal_thread_terminating.load(Ordering::SeqCst) {
                break;
            }
        }
        trace!("signal thread has stopped");
    }

    /// Write the stack dump, fan out the fail callback, abort.
    fn process_fail(&self, signo: i32) -> ! {
        let dump_path = self.config.stdump_file_path.as_ref().and_then(|path| {
            dump::save_stack_dump(
                path,
                signo,
                !self.config.corefile_disable_excl_policy,
                self.config.corefile_fail_thread_only,
            )
            .ok()
        });
        *self.last_signal.lock() = SignalEvent::Fail { signo, dump_path: dump_path.clone() };

        if let Some(callback) = self.fail_callback.lock().take() {
            callback(signo, dump_path);
        }
        std::process::abort();
    }

    fn process_exit(&self, signo: i32) {
        *self.last_signal.lock() = SignalEvent::Exit { signo };
        if !self.main_loop.is_running() {
            return;
        }
        if let Some(callback) = self.exit_callback.lock().take() {
            self.main_loop.wait(move || callback(signo), Some(env::exit_dispatch_timeout()));
        }
        self.main_loop.exit(128 + signo);
    }

    fn process_control(&self, signo: i32) {
        let which = if signo == Signal::SIGUSR1 as i32 {
            ControlSignal::Usr1
        } else {
            ControlSignal::Usr2
        };
        *self.last_signal.lock() = SignalEvent::Control(which);

        match self.control_callback.lock().clone() {
            Some(callback) => self.main_loop.post(move || callback(which)),
            None => trace!("control signal ignored"),
        }
    }

    fn cleanup(&self) {
        self.signal_thread_initiated.store(false, Ordering::SeqCst);
        self.signal_thread_terminating.store(false, Ordering::SeqCst);
    }
}

fn executable_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "MAIN".to_string())
}

#[cfg(target_os = "linux")]
fn ensure_single_threaded() -> Result<(), AppError> {
    let threads = std::fs::read_dir("/proc/self/task")
        .map(|entries| entries.count())
        .unwrap_or(1);
    if threads > 1 {
        return Err(AppError::ThreadsAlreadyRunning(threads));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn ensure_single_threaded() -> Result<(), AppError> {
    Ok(())
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
