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

//! The re-armable recurring timer.
//!
//! One worker thread per timer runs the wait → sleep → invoke → reschedule
//! cycle; any number of controller threads may call [`RecurringTimer::start`]
//! and [`RecurringTimer::stop`] concurrently. All shared state lives behind a
//! single mutex paired with a condition variable — no atomics, so every
//! observation of the state machine is a consistent one.
//!
//! The timed sleep itself runs with the lock released, otherwise a pending
//! delay would block every controller for its full duration. The flip side is
//! the cancellation contract: `stop()` issued mid-sleep cannot abort the
//! sleep, it only suppresses the callback that would follow it. A `stop` may
//! therefore take up to one full delay to be observed.

use crate::sink::LogSink;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Run state of the timer, as seen by controllers and the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// No cycle is scheduled; the worker is idle-waiting.
    Stopped,
    /// A sleep → invoke cycle is scheduled or in progress.
    Running,
}

/// The callback + delay pair the worker will consume next.
///
/// Replaced wholesale by every `start`; the worker only ever clones the
/// callback handle out of it, never mutates it in place (aside from the
/// delay rewrite after a rescheduling callback returns).
struct PendingTask {
    callback: Arc<dyn Fn() -> i64 + Send + Sync>,
    delay: Duration,
}

/// Everything the lock protects.
struct Inner {
    state: TimerState,
    task: Option<PendingTask>,
    /// Cleared exactly once, at teardown. Distinct from `state`: it tells the
    /// worker "exit permanently" rather than "stopped, may be restarted".
    alive: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    cv: Condvar,
}

impl Shared {
    /// Acquires the state lock.
    ///
    /// A poisoned guard is recovered rather than unwrapped: the lock is never
    /// held across a panic site (the callback runs behind `catch_unwind`), so
    /// the protected state cannot be half-updated, and the worker must
    /// outlive any single failure.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, Inner>) -> MutexGuard<'a, Inner> {
        self.cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
    }
}

/// A single-worker interval timer that re-arms itself from its callback's
/// return value.
///
/// The callback contract: return the next delay in milliseconds (`> 0`) to
/// run again, or any value `<= 0` to stop. A panicking callback is caught at
/// the worker boundary, reported to the injected [`LogSink`], and stops the
/// timer exactly as a non-positive return would — the worker thread survives
/// and the timer can be started again.
///
/// Dropping the timer (or calling [`shutdown`](Self::shutdown)) blocks until
/// the worker has fully exited; no callback invocation begins after that
/// point. A callback already executing is allowed to finish naturally first.
///
/// The callback must not call back into this timer's control operations; the
/// state lock is held while it runs.
pub struct RecurringTimer {
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RecurringTimer {
    /// Creates the timer and spawns its worker thread immediately.
    ///
    /// The worker idles until the first [`start`](Self::start). Callback
    /// failures are reported through `sink`; ordinary diagnostics go through
    /// the `log` facade.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: TimerState::Stopped,
                task: None,
                alive: true,
            }),
            cv: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || worker_loop(&worker_shared, sink.as_ref()));

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Installs `callback` and `delay` as the pending task and wakes the
    /// worker.
    ///
    /// Callable from any thread at any time. If the timer is already running,
    /// the pending task is replaced; a sleep already in flight still completes
    /// with the previously captured callback and delay, and the replacement
    /// takes effect from the following cycle. After teardown has begun this is
    /// a silent no-op.
    pub fn start<F>(&self, callback: F, delay: Duration)
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        let mut inner = self.shared.lock();
        if !inner.alive {
            return;
        }
        if inner.state == TimerState::Running {
            log::debug!("Timer already running, resetting with new parameters.");
        }
        inner.task = Some(PendingTask {
            callback: Arc::new(callback),
            delay,
        });
        inner.state = TimerState::Running;
        self.shared.cv.notify_one();
        log::trace!("Timer started with delay {delay:?}.");
    }

    /// Sets the timer to [`TimerState::Stopped`] and wakes the worker.
    ///
    /// Idempotent; cannot fail. Cooperative: a sleep already in progress runs
    /// to completion, but the callback that would follow it is suppressed.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        inner.state = TimerState::Stopped;
        self.shared.cv.notify_one();
        log::trace!("Timer stop requested.");
    }

    /// Returns the current run state.
    pub fn state(&self) -> TimerState {
        self.shared.lock().state
    }

    /// Tears the timer down and joins the worker thread.
    ///
    /// Blocks until the worker has fully exited; a callback mid-execution
    /// finishes naturally first. Guarantees no callback invocation starts
    /// after this returns. Called automatically on drop.
    pub fn shutdown(&mut self) {
        {
            let mut inner = self.shared.lock();
            inner.alive = false;
            inner.state = TimerState::Stopped;
            self.shared.cv.notify_one();
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
            log::debug!("Timer worker thread joined.");
        }
    }
}

impl Drop for RecurringTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The worker's wait → sleep → invoke → reschedule loop.
fn worker_loop(shared: &Shared, sink: &dyn LogSink) {
    log::debug!("Timer worker thread started.");
    loop {
        // Idle: wait until a cycle is scheduled or teardown begins, then
        // snapshot the pending task so the sleep can run unlocked.
        let (callback, delay) = {
            let mut inner = shared.lock();
            loop {
                if !inner.alive {
                    log::debug!("Timer worker thread exiting.");
                    return;
                }
                if inner.state == TimerState::Running {
                    break;
                }
                inner = shared.wait(inner);
            }
            match inner.task.as_ref() {
                Some(task) => (Arc::clone(&task.callback), task.delay),
                None => {
                    // Running with no task installed is unreachable through
                    // the public API; settle back to Stopped.
                    debug_assert!(false, "timer running without a pending task");
                    inner.state = TimerState::Stopped;
                    continue;
                }
            }
        };

        thread::sleep(delay);
        log::trace!("Timer woke up after {delay:?}.");

        let mut inner = shared.lock();
        if inner.state == TimerState::Stopped || !inner.alive {
            log::trace!("Timer was stopped during sleep; skipping callback.");
            continue;
        }

        // Invoking: still under the lock, so a concurrent `stop` is ordered
        // either before this cycle (observed above) or after the reschedule
        // decision below — never lost in between.
        match panic::catch_unwind(AssertUnwindSafe(|| (*callback)())) {
            Ok(interval) if interval > 0 => {
                if let Some(task) = inner.task.as_mut() {
                    task.delay = Duration::from_millis(interval as u64);
                }
                inner.state = TimerState::Running;
            }
            Ok(_) => {
                inner.state = TimerState::Stopped;
                log::trace!("Callback requested stop.");
            }
            Err(_) => {
                sink.log("callback failed: panic caught at timer worker boundary, timer stopped");
                inner.state = TimerState::Stopped;
            }
        }
    }
}
