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

//! # Metron Core
//!
//! A re-armable recurring timer: one dedicated worker thread runs a
//! sleep → invoke → reschedule loop while any number of controller threads
//! call [`RecurringTimer::start`] and [`RecurringTimer::stop`] concurrently.
//!
//! The callback decides its own future: it returns the next delay in
//! milliseconds, or a non-positive value to stop the timer. Cancellation is
//! cooperative — stopping takes effect at the next post-sleep checkpoint,
//! never mid-sleep.

#![warn(missing_docs)]

pub mod sink;
pub mod timer;

pub use sink::{FacadeSink, LogSink, NullSink};
pub use timer::{RecurringTimer, TimerState};
