//! Single-slot render gate.
//!
//! At most one render runs at a time. Requests arriving while busy overwrite a single pending
//! slot, so a burst of edits collapses into the render in flight plus the newest request.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;
use parking_lot::{Condvar, Mutex};

use crate::foundation::error::PressResult;

/// Work performed for one accepted request.
pub type RenderHandler<R> = Box<dyn Fn(R) -> PressResult<()> + Send + Sync>;

/// What [`RenderScheduler::submit`] did with a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The scheduler was idle and a drain thread started with this request.
    Started,
    /// A render is in flight; the request replaced the pending slot.
    Coalesced,
}

/// Counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct SchedulerStats {
    /// Requests passed to `submit`.
    pub submitted: u64,
    /// Requests the handler completed successfully.
    pub rendered: u64,
    /// Requests the handler rejected.
    pub failed: u64,
    /// Requests overwritten in the pending slot before they ran.
    pub dropped: u64,
}

struct Gate<R> {
    rendering: bool,
    pending: Option<R>,
}

struct Inner<R> {
    gate: Mutex<Gate<R>>,
    idle: Condvar,
    handler: RenderHandler<R>,
    submitted: AtomicU64,
    rendered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Coalescing render gate; cheap to clone, clones share one gate.
pub struct RenderScheduler<R> {
    inner: Arc<Inner<R>>,
    name: Arc<str>,
}

impl<R> Clone for RenderScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            name: Arc::clone(&self.name),
        }
    }
}

impl<R> std::fmt::Debug for RenderScheduler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("name", &self.name)
            .field("rendering", &self.is_rendering())
            .finish_non_exhaustive()
    }
}

impl<R: Send + 'static> RenderScheduler<R> {
    /// Gate around `handler`; `name` prefixes the drain thread name.
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(R) -> PressResult<()> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                gate: Mutex::new(Gate {
                    rendering: false,
                    pending: None,
                }),
                idle: Condvar::new(),
                handler: Box::new(handler),
                submitted: AtomicU64::new(0),
                rendered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
            name: Arc::from(name.into()),
        }
    }

    /// Hand `request` to the gate without blocking on the render.
    ///
    /// When idle, the gate is marked busy before this returns and a drain thread starts with
    /// `request`. When busy, `request` replaces any pending request.
    pub fn submit(&self, request: R) -> PressResult<SubmitOutcome> {
        self.inner.submitted.fetch_add(1, Ordering::Relaxed);
        {
            let mut gate = self.inner.gate.lock();
            if gate.rendering {
                if gate.pending.replace(request).is_some() {
                    self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                }
                tracing::trace!(scheduler = %self.name, "render request coalesced");
                return Ok(SubmitOutcome::Coalesced);
            }
            gate.rendering = true;
        }

        let inner = Arc::clone(&self.inner);
        let name = Arc::clone(&self.name);
        let spawned = std::thread::Builder::new()
            .name(format!("{}-render", self.name))
            .spawn(move || drain(&inner, &name, request))
            .context("spawn render drain thread");

        if let Err(e) = spawned {
            let mut gate = self.inner.gate.lock();
            gate.rendering = false;
            self.inner.idle.notify_all();
            return Err(e.into());
        }
        Ok(SubmitOutcome::Started)
    }
}

impl<R> RenderScheduler<R> {
    /// `true` while a drain thread owns the gate.
    pub fn is_rendering(&self) -> bool {
        self.inner.gate.lock().rendering
    }

    /// Block until no render is in flight and nothing is pending.
    pub fn wait_idle(&self) {
        let mut gate = self.inner.gate.lock();
        while gate.rendering {
            self.inner.idle.wait(&mut gate);
        }
    }

    /// Counter snapshot.
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            submitted: self.inner.submitted.load(Ordering::Relaxed),
            rendered: self.inner.rendered.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Releases the gate if the handler panics, so later submits can start a new drain.
struct ReleaseOnPanic<'a, R>(&'a Inner<R>);

impl<R> Drop for ReleaseOnPanic<'_, R> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            let mut gate = self.0.gate.lock();
            gate.rendering = false;
            gate.pending = None;
            self.0.idle.notify_all();
        }
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(scheduler = %name))]
fn drain<R>(inner: &Inner<R>, name: &str, first: R) {
    let _release = ReleaseOnPanic(inner);
    let mut next = Some(first);

    while let Some(request) = next {
        match (inner.handler)(request) {
            Ok(()) => {
                inner.rendered.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                inner.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(error = %e, "render failed; frame dropped");
            }
        }

        let mut gate = inner.gate.lock();
        next = gate.pending.take();
        if next.is_none() {
            gate.rendering = false;
            inner.idle.notify_all();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/scheduler.rs"]
mod tests;
