//! Per-frame callback scheduling
//!
//! Widgets never drive their own redraw loop. Each one registers a callback
//! with a [`FrameScheduler`] handed to it by the host and asks for a frame
//! whenever its data changed. The scheduler coalesces any number of requests
//! into at most one invocation per callback per frame, so a drag that edits a
//! curve fifty times between two frames still rebuilds its buffers once.
//!
//! ```ignore
//! let mut frames = FrameLoop::new();
//! let id = frames.register("control-lines", Box::new(move |frame| editor.borrow_mut().on_frame(frame)));
//! frames.request_frame(id);
//! frames.run_frame(Instant::now()); // editor.on_frame runs exactly once
//! ```

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Handle for a registered frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameCallbackId(u64);

/// Timing information passed to frame callbacks
#[derive(Debug, Clone, Copy)]
pub struct FrameInfo {
    /// Monotonic frame counter, starting at 1
    pub frame: u64,
    /// Time the frame started
    pub now: Instant,
    /// Time since the previous frame (zero for the first one)
    pub delta: Duration,
}

/// A callback invoked once per frame in which it was requested
pub type FrameCallback = Box<dyn FnMut(&FrameInfo)>;

/// Scheduler interface injected into widgets
pub trait FrameScheduler {
    /// Register a callback; `name` is only used for logging
    fn register(&mut self, name: &str, callback: FrameCallback) -> FrameCallbackId;

    /// Remove a callback. Returns false if the id was unknown.
    fn unregister(&mut self, id: FrameCallbackId) -> bool;

    /// Ask for the callback to run in the next frame
    fn request_frame(&mut self, id: FrameCallbackId);
}

struct Registration {
    name: String,
    callback: FrameCallback,
    requested: bool,
}

/// Single-threaded [`FrameScheduler`] driven by the host's render tick
#[derive(Default)]
pub struct FrameLoop {
    next_id: u64,
    frame: u64,
    last_frame: Option<Instant>,
    registrations: BTreeMap<FrameCallbackId, Registration>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered callbacks
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// True if at least one callback asked for a frame
    pub fn has_pending(&self) -> bool {
        self.registrations.values().any(|r| r.requested)
    }

    /// Run every callback that requested a frame, in registration order
    ///
    /// Returns the number of callbacks invoked.
    pub fn run_frame(&mut self, now: Instant) -> usize {
        if !self.has_pending() {
            return 0;
        }

        self.frame += 1;
        let delta = self
            .last_frame
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_frame = Some(now);

        let info = FrameInfo {
            frame: self.frame,
            now,
            delta,
        };

        let mut invoked = 0;
        for registration in self.registrations.values_mut() {
            if registration.requested {
                registration.requested = false;
                (registration.callback)(&info);
                invoked += 1;
            }
        }
        invoked
    }
}

impl FrameScheduler for FrameLoop {
    fn register(&mut self, name: &str, callback: FrameCallback) -> FrameCallbackId {
        let id = FrameCallbackId(self.next_id);
        self.next_id += 1;
        log::debug!("FrameLoop: registered {:?} as '{}'", id, name);
        self.registrations.insert(
            id,
            Registration {
                name: name.to_string(),
                callback,
                requested: false,
            },
        );
        id
    }

    fn unregister(&mut self, id: FrameCallbackId) -> bool {
        match self.registrations.remove(&id) {
            Some(registration) => {
                log::debug!("FrameLoop: unregistered '{}'", registration.name);
                true
            }
            None => false,
        }
    }

    fn request_frame(&mut self, id: FrameCallbackId) {
        if let Some(registration) = self.registrations.get_mut(&id) {
            registration.requested = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, FrameCallback) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, Box::new(move |_| inner.set(inner.get() + 1)))
    }

    #[test]
    fn test_requests_are_coalesced() {
        let mut frames = FrameLoop::new();
        let (count, callback) = counter();
        let id = frames.register("editor", callback);

        for _ in 0..50 {
            frames.request_frame(id);
        }
        assert_eq!(frames.run_frame(Instant::now()), 1);
        assert_eq!(count.get(), 1);

        // Nothing requested, nothing runs
        assert_eq!(frames.run_frame(Instant::now()), 0);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_only_requesting_callbacks_run() {
        let mut frames = FrameLoop::new();
        let (a_count, a) = counter();
        let (b_count, b) = counter();
        let a_id = frames.register("a", a);
        let _b_id = frames.register("b", b);

        frames.request_frame(a_id);
        frames.run_frame(Instant::now());

        assert_eq!(a_count.get(), 1);
        assert_eq!(b_count.get(), 0);
    }

    #[test]
    fn test_unregister() {
        let mut frames = FrameLoop::new();
        let (count, callback) = counter();
        let id = frames.register("gone", callback);

        frames.request_frame(id);
        assert!(frames.unregister(id));
        assert!(!frames.unregister(id));
        assert!(frames.is_empty());

        frames.run_frame(Instant::now());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_frame_delta() {
        let mut frames = FrameLoop::new();
        let seen = Rc::new(Cell::new(Duration::ZERO));
        let inner = seen.clone();
        let id = frames.register("timing", Box::new(move |info| inner.set(info.delta)));

        let start = Instant::now();
        frames.request_frame(id);
        frames.run_frame(start);
        assert_eq!(seen.get(), Duration::ZERO);

        frames.request_frame(id);
        frames.run_frame(start + Duration::from_millis(16));
        assert_eq!(seen.get(), Duration::from_millis(16));
    }
}
