// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Append-only file sink with millisecond timestamps.
//!
//! Explicit lifecycle: construct with [`FileLogger::open`], pass it (behind
//! an `Arc`) to whatever owns the timer, and [`FileLogger::close`] it when
//! the owning component shuts down. No process-global state.
//!
//! Delivery is best-effort by contract: a write failure, or a `log` after
//! `close`, is surfaced through the `log` facade and otherwise swallowed —
//! it never propagates into timer control flow.

use chrono::Local;
use metron_core::LogSink;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Errors from opening a [`FileLogger`].
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The log file could not be created or opened for appending.
    #[error("failed to open log file: {0}")]
    Open(#[from] std::io::Error),
}

/// A thread-safe, append-only, timestamped file logger.
///
/// Each entry is written as `YYYY-MM-DD HH:MM:SS.mmm [INFO] message`, local
/// time, millisecond resolution, one line per call, flushed per entry.
/// Writers from any number of threads are serialized by an internal mutex.
pub struct FileLogger {
    // `None` once closed; later log calls are dropped.
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileLogger {
    /// Opens (or creates) `path` in append mode.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoggerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())?;
        log::debug!("FileLogger opened at {:?}.", path.as_ref());
        Ok(Self {
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Flushes and closes the underlying file.
    ///
    /// Idempotent. Entries logged after this point are dropped with a debug
    /// note; concurrent `log` calls racing the close are either written or
    /// dropped, never torn.
    pub fn close(&self) {
        let mut writer = self.lock_writer();
        if let Some(mut w) = writer.take() {
            if let Err(e) = w.flush() {
                log::warn!("FileLogger flush on close failed: {e}");
            }
            log::debug!("FileLogger closed.");
        }
    }

    /// Whether the logger still has an open file.
    pub fn is_open(&self) -> bool {
        self.lock_writer().is_some()
    }

    fn lock_writer(&self) -> MutexGuard<'_, Option<BufWriter<File>>> {
        // Formatting and writing cannot panic mid-update, so a poisoned
        // guard still holds a usable writer.
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for FileLogger {
    fn log(&self, message: &str) {
        let mut writer = self.lock_writer();
        let Some(w) = writer.as_mut() else {
            log::debug!("FileLogger already closed, dropping entry: {message}");
            return;
        };
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        if let Err(e) = writeln!(w, "{timestamp} [INFO] {message}").and_then(|()| w.flush()) {
            // Best-effort contract: never escalate a sink failure.
            log::warn!("FileLogger write failed: {e}");
        }
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.close();
    }
}
