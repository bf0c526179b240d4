//! Frame Scheduler - "run on the next display refresh" as a first-class operation.
//!
//! The host drives the scheduler by calling [`FrameScheduler::tick`] once per
//! refresh (a terminal loop at 60 FPS, a browser's animation frame, a test).
//!
//! # Pattern
//!
//! - `request_frame(f)` queues `f` for the next tick and returns its id
//! - `cancel_frame(id)` drops a queued callback, even one in the batch that
//!   is currently running
//! - Callbacks requested during a tick run on the following tick
//!
//! # Example
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let id = scheduler.request_frame(|| println!("next frame"));
//!
//! scheduler.cancel_frame(id);
//! assert_eq!(scheduler.tick(), 0);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

/// Identifier of a queued frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequestId(u64);

type FrameCallback = Box<dyn FnOnce()>;

#[derive(Default)]
struct SchedulerState {
    /// Callbacks for the next tick.
    queued: Vec<(FrameRequestId, FrameCallback)>,
    /// Callbacks of the tick in progress that have not run yet.
    running: VecDeque<(FrameRequestId, FrameCallback)>,
    next_id: u64,
    frame: u64,
}

/// Single-threaded frame scheduler. Cloning shares the queue.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FrameScheduler")
            .field("frame", &state.frame)
            .field("queued", &state.queued.len())
            .field("running", &state.running.len())
            .finish()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `callback` for the next tick.
    pub fn request_frame(&self, callback: impl FnOnce() + 'static) -> FrameRequestId {
        let mut state = self.state.borrow_mut();
        let id = FrameRequestId(state.next_id);
        state.next_id += 1;
        state.queued.push((id, Box::new(callback)));
        id
    }

    /// Drop a queued callback. Returns `false` if it already ran or was never queued.
    pub fn cancel_frame(&self, id: FrameRequestId) -> bool {
        let mut state = self.state.borrow_mut();

        if let Some(pos) = state.queued.iter().position(|(queued, _)| *queued == id) {
            state.queued.remove(pos);
            return true;
        }
        if let Some(pos) = state.running.iter().position(|(queued, _)| *queued == id) {
            state.running.remove(pos);
            return true;
        }
        false
    }

    /// Run one frame. Returns the number of callbacks that ran.
    pub fn tick(&self) -> usize {
        let frame = {
            let mut state = self.state.borrow_mut();
            let queued = std::mem::take(&mut state.queued);
            state.running.extend(queued);
            state.frame += 1;
            state.frame
        };

        let mut ran = 0;
        loop {
            // Release the borrow before running, callbacks re-enter the scheduler.
            let next = self.state.borrow_mut().running.pop_front();
            let Some((_, callback)) = next else { break };
            callback();
            ran += 1;
        }

        trace!(frame, ran, "frame tick");
        ran
    }

    /// Tick until nothing is queued or `max_frames` ticks have run.
    ///
    /// Returns the number of ticks that ran.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.tick();
            frames += 1;
        }
        frames
    }

    /// Callbacks waiting for a future tick.
    pub fn pending(&self) -> usize {
        self.state.borrow().queued.len()
    }

    /// Ticks run so far.
    pub fn frame_count(&self) -> u64 {
        self.state.borrow().frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_callbacks_wait_for_tick() {
        let scheduler = FrameScheduler::new();
        let ran = Rc::new(Cell::new(false));

        let ran_clone = ran.clone();
        scheduler.request_frame(move || ran_clone.set(true));

        assert!(!ran.get());
        assert_eq!(scheduler.pending(), 1);

        assert_eq!(scheduler.tick(), 1);
        assert!(ran.get());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn test_requests_during_tick_run_next_frame() {
        let scheduler = FrameScheduler::new();
        let frames = Rc::new(RefCell::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let frames_clone = frames.clone();
        scheduler.request_frame(move || {
            frames_clone.borrow_mut().push(inner_scheduler.frame_count());
            let frames_inner = frames_clone.clone();
            let nested = inner_scheduler.clone();
            inner_scheduler.request_frame(move || {
                frames_inner.borrow_mut().push(nested.frame_count());
            });
        });

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*frames.borrow(), vec![1]);

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(*frames.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_cancel_queued() {
        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let id = scheduler.request_frame(move || count_clone.set(count_clone.get() + 1));

        assert!(scheduler.cancel_frame(id));
        assert!(!scheduler.cancel_frame(id));
        assert_eq!(scheduler.tick(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_cancel_within_running_batch() {
        let scheduler = FrameScheduler::new();
        let count = Rc::new(Cell::new(0));
        let victim: Rc<Cell<Option<FrameRequestId>>> = Rc::new(Cell::new(None));

        let canceller = scheduler.clone();
        let victim_clone = victim.clone();
        scheduler.request_frame(move || {
            if let Some(id) = victim_clone.get() {
                assert!(canceller.cancel_frame(id));
            }
        });

        let count_clone = count.clone();
        victim.set(Some(
            scheduler.request_frame(move || count_clone.set(count_clone.get() + 1)),
        ));

        assert_eq!(scheduler.tick(), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_run_until_idle() {
        let scheduler = FrameScheduler::new();
        let remaining = Rc::new(Cell::new(3));

        fn chain(scheduler: FrameScheduler, remaining: Rc<Cell<u32>>) {
            let next = scheduler.clone();
            scheduler.request_frame(move || {
                remaining.set(remaining.get() - 1);
                if remaining.get() > 0 {
                    chain(next, remaining);
                }
            });
        }

        chain(scheduler.clone(), remaining.clone());
        assert_eq!(scheduler.run_until_idle(10), 3);
        assert_eq!(remaining.get(), 0);

        // Bounded when work never settles.
        fn forever(scheduler: FrameScheduler) {
            let next = scheduler.clone();
            scheduler.request_frame(move || forever(next));
        }
        forever(scheduler.clone());
        assert_eq!(scheduler.run_until_idle(5), 5);
    }
}
