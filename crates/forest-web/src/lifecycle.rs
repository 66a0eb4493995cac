//! Frame-loop bookkeeping across `pagehide`/`pageshow`, free of DOM types.

use std::cell::Cell;

/// Whether frames should run and whether an animation-frame request is
/// already outstanding. At most one request is outstanding at a time.
#[derive(Debug)]
pub struct LoopGate {
    running: Cell<bool>,
    scheduled: Cell<bool>,
}

impl Default for LoopGate {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopGate {
    pub fn new() -> Self {
        Self {
            running: Cell::new(true),
            scheduled: Cell::new(false),
        }
    }

    /// Called at the top of a frame callback. The pending request has been
    /// consumed; returns whether the frame should run.
    pub fn begin_frame(&self) -> bool {
        self.scheduled.set(false);
        self.running.get()
    }

    /// Issue `request` unless one is pending. `request` reports success.
    pub fn schedule(&self, request: impl FnOnce() -> bool) -> bool {
        if self.scheduled.get() {
            return false;
        }
        let issued = request();
        self.scheduled.set(issued);
        issued
    }

    pub fn pause(&self) {
        self.running.set(false);
    }

    /// Handle `pageshow`. Returns true when a paused loop restored from the
    /// back/forward cache should resume; first loads and live pages return
    /// false.
    pub fn show(&self, persisted: bool) -> bool {
        if !persisted || self.running.get() {
            return false;
        }
        self.running.set(true);
        true
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }
}
