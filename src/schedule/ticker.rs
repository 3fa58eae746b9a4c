use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::foundation::error::{PressError, PressResult};

/// Background thread calling a closure at a fixed interval until stopped or dropped.
///
/// The first call happens one interval after spawning.
pub struct RepeatingTask {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl RepeatingTask {
    /// Start calling `tick` every `interval`.
    pub fn spawn<F>(name: &str, interval: Duration, mut tick: F) -> PressResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(PressError::validation("repeating task interval must be non-zero"));
        }

        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                let (lock, cv) = &*flag;
                let mut stopped = lock.lock();
                while !*stopped {
                    let timed_out = cv.wait_for(&mut stopped, interval).timed_out();
                    if timed_out && !*stopped {
                        MutexGuard::unlocked(&mut stopped, || tick());
                    }
                }
            })
            .with_context(|| format!("spawn repeating task '{name}'"))?;

        tracing::debug!(task = name, interval_ms = interval.as_millis() as u64, "repeating task started");
        Ok(Self {
            stop,
            handle: Some(handle),
            interval,
        })
    }

    /// Interval between calls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the thread and wait for an in-progress call to finish.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        {
            let (lock, cv) = &*self.stop;
            *lock.lock() = true;
            cv.notify_all();
        }
        if handle.join().is_err() {
            tracing::warn!("repeating task panicked");
        }
    }
}

impl std::fmt::Debug for RepeatingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTask")
            .field("interval", &self.interval)
            .field("running", &self.handle.is_some())
            .finish()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/ticker.rs"]
mod tests;
