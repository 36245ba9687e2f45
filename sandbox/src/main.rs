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

//! Demo: one recurring timer, many controller threads.
//!
//! Spawns a handful of controllers that randomly start (with a random delay)
//! or stop a shared timer for a few seconds, while the timer's callback
//! reports each tick to a file logger. Run it and inspect `metron.log`.

use anyhow::Result;
use metron_core::{LogSink, RecurringTimer};
use metron_telemetry::FileLogger;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const CONTROLLERS: usize = 8;
const RUN_FOR: Duration = Duration::from_secs(5);

fn main() -> Result<()> {
    env_logger::init();

    let logger = Arc::new(FileLogger::open("metron.log")?);
    let timer = Arc::new(RecurringTimer::new(
        Arc::clone(&logger) as Arc<dyn LogSink>
    ));
    let ticks = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(CONTROLLERS);
    for id in 0..CONTROLLERS {
        let timer = Arc::clone(&timer);
        let logger = Arc::clone(&logger);
        let ticks = Arc::clone(&ticks);
        handles.push(thread::spawn(move || {
            let mut rng = rand::thread_rng();
            let deadline = Instant::now() + RUN_FOR;
            let mut ops = 0usize;
            while Instant::now() < deadline {
                if rng.gen_bool(0.5) {
                    let tick_logger = Arc::clone(&logger);
                    let tick_counter = Arc::clone(&ticks);
                    timer.start(
                        move || {
                            let n = tick_counter.fetch_add(1, Ordering::SeqCst) + 1;
                            tick_logger.log(&format!("tick {n}"));
                            20
                        },
                        Duration::from_millis(rng.gen_range(0..=100)),
                    );
                } else {
                    timer.stop();
                }
                ops += 1;
                thread::sleep(Duration::from_millis(rng.gen_range(1..=10)));
            }
            logger.log(&format!("controller {id} issued {ops} operations"));
        }));
    }

    for handle in handles {
        if handle.join().is_err() {
            log::error!("A controller thread panicked.");
        }
    }

    timer.stop();
    // Let a cycle that was mid-sleep at the stop drain before reporting.
    thread::sleep(Duration::from_millis(200));
    logger.log(&format!(
        "run completed: {} ticks",
        ticks.load(Ordering::SeqCst)
    ));

    drop(timer); // joins the worker
    logger.close();
    println!("Done. Log written to metron.log");
    Ok(())
}
