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

//! The narrow logging capability the timer requires from its owner.
//!
//! The timer does not own a logger; it is handed one at construction.
//! Implementations must be safe to call from the worker thread and any
//! controller thread simultaneously, and should treat delivery as
//! best-effort — the timer never blocks on, or reacts to, a sink failure.

/// A thread-safe, append-only message sink.
///
/// The timer reports callback failures through this trait. Anything else it
/// has to say goes through the `log` facade as ordinary diagnostics.
pub trait LogSink: Send + Sync {
    /// Records one message. Must not panic; failures are the sink's problem.
    fn log(&self, message: &str);
}

/// Sink that forwards every message to the `log` facade at error level.
///
/// Useful when the embedding application already routes the `log` crate
/// somewhere sensible and no dedicated file is wanted.
#[derive(Debug, Default)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, message: &str) {
        log::error!("{message}");
    }
}

/// Sink that discards every message.
#[derive(Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn sinks_are_object_safe() {
        let sinks: Vec<Arc<dyn LogSink>> = vec![Arc::new(FacadeSink), Arc::new(NullSink)];
        for sink in &sinks {
            sink.log("smoke");
        }
    }
}
