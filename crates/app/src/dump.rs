// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-dump capture and core-file housekeeping.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

/// Write a text stack dump for `signo` to `path`.
///
/// With `exclusive`, an existing file at the path is preserved and the dump
/// fails; otherwise it is overwritten. Unless `current_thread_only`, the dump
/// also lists the process's live threads.
pub(crate) fn save_stack_dump(
    path: &Path,
    signo: i32,
    exclusive: bool,
    current_thread_only: bool,
) -> io::Result<PathBuf> {
    let mut options = OpenOptions::new();
    options.write(true);
    if exclusive {
        options.create_new(true);
    } else {
        options.create(true).truncate(true);
    }
    let mut file = options.open(path)?;

    writeln!(file, "signal {} at {}", signo, Utc::now().to_rfc3339())?;
    writeln!(file, "{}", std::backtrace::Backtrace::force_capture())?;
    if !current_thread_only {
        write_thread_listing(&mut file)?;
    }
    file.sync_all()?;
    Ok(path.to_path_buf())
}

#[cfg(target_os = "linux")]
fn write_thread_listing(file: &mut std::fs::File) -> io::Result<()> {
    writeln!(file, "threads:")?;
    for entry in std::fs::read_dir("/proc/self/task")? {
        let entry = entry?;
        let tid = entry.file_name();
        let comm = std::fs::read_to_string(entry.path().join("comm")).unwrap_or_default();
        writeln!(file, "  {} {}", tid.to_string_lossy(), comm.trim_end())?;
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn write_thread_listing(_file: &mut std::fs::File) -> io::Result<()> {
    Ok(())
}

/// Rename a pre-existing `core` file in `dir` so a fresh dump is not
/// overwritten. Returns the archive path when a rename happened.
pub(crate) fn archive_existing_core(dir: &Path) -> Option<PathBuf> {
    let core = dir.join("core");
    if !core.exists() {
        return None;
    }
    let stamp = Utc::now().format("%Y%m%dT%H%M%S");
    let target = dir.join(format!("core.{stamp}"));
    std::fs::rename(&core, &target).ok()?;
    Some(target)
}

/// Raise the core-file size limit to unlimited.
pub(crate) fn raise_core_limit() -> nix::Result<()> {
    use nix::sys::resource::{setrlimit, Resource, RLIM_INFINITY};
    setrlimit(Resource::RLIMIT_CORE, RLIM_INFINITY, RLIM_INFINITY)
}

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;
