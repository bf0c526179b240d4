//! Smooth Motion - exponential easing of a scalar towards a target.
//!
//! Turns discrete scroll position updates into a continuously animated
//! visual offset, one step per frame:
//!
//! ```text
//! velocity = (target - current) * smooth_factor
//! current += velocity
//! ```
//!
//! The loop stops once `|velocity| < 0.1`. Starting a new motion cancels the
//! frame of the previous one, so at most one loop runs per instance.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let motion = SmoothMotion::new(scheduler.clone(), 0.0, DEFAULT_SMOOTH_FACTOR);
//!
//! motion.set_value(400.0, |offset| println!("offset {offset}"), true);
//! scheduler.run_until_idle(1000);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use super::frame::{FrameRequestId, FrameScheduler};

/// Default exponential-decay constant.
pub const DEFAULT_SMOOTH_FACTOR: f64 = 0.05;

/// Stopping epsilon for the per-frame velocity.
pub const SETTLE_VELOCITY: f64 = 0.1;

#[derive(Debug, Default)]
struct MotionState {
    current: f64,
    target: f64,
    velocity: f64,
    pending: Option<FrameRequestId>,
}

/// Critically-damped-looking interpolator driven by a [`FrameScheduler`].
#[derive(Debug, Clone)]
pub struct SmoothMotion {
    state: Rc<RefCell<MotionState>>,
    scheduler: FrameScheduler,
    smooth_factor: f64,
}

impl SmoothMotion {
    pub fn new(scheduler: FrameScheduler, initial: f64, smooth_factor: f64) -> Self {
        Self {
            state: Rc::new(RefCell::new(MotionState {
                current: initial,
                target: initial,
                ..MotionState::default()
            })),
            scheduler,
            smooth_factor,
        }
    }

    /// Move towards `target`, reporting every intermediate value to `update`.
    ///
    /// With `smooth == false` the value snaps and `update` runs once,
    /// synchronously.
    pub fn set_value(&self, target: f64, update: impl Fn(f64) + 'static, smooth: bool) {
        self.cancel_pending();

        if !smooth {
            let current = {
                let mut state = self.state.borrow_mut();
                state.target = target;
                state.current = target;
                state.velocity = 0.0;
                state.current
            };
            update(current);
            return;
        }

        self.state.borrow_mut().target = target;
        let id = schedule_step(
            self.state.clone(),
            self.scheduler.clone(),
            self.smooth_factor,
            Rc::new(update),
        );
        self.state.borrow_mut().pending = Some(id);
    }

    /// Reset the baseline without reporting it. Cancels any running loop.
    pub fn jump_to(&self, target: f64) {
        self.cancel_pending();
        let mut state = self.state.borrow_mut();
        state.current = target;
        state.target = target;
        state.velocity = 0.0;
    }

    pub fn current(&self) -> f64 {
        self.state.borrow().current
    }

    pub fn target(&self) -> f64 {
        self.state.borrow().target
    }

    pub fn velocity(&self) -> f64 {
        self.state.borrow().velocity
    }

    pub fn smooth_factor(&self) -> f64 {
        self.smooth_factor
    }

    /// Whether a frame of the loop is queued.
    pub fn is_animating(&self) -> bool {
        self.state.borrow().pending.is_some()
    }

    fn cancel_pending(&self) {
        let pending = self.state.borrow_mut().pending.take();
        if let Some(id) = pending {
            self.scheduler.cancel_frame(id);
        }
    }
}

fn schedule_step(
    state: Rc<RefCell<MotionState>>,
    scheduler: FrameScheduler,
    smooth_factor: f64,
    update: Rc<dyn Fn(f64)>,
) -> FrameRequestId {
    let next_scheduler = scheduler.clone();
    scheduler.request_frame(move || {
        let (current, settled) = {
            let mut s = state.borrow_mut();
            s.pending = None;
            s.velocity = (s.target - s.current) * smooth_factor;
            s.current += s.velocity;
            (s.current, s.velocity.abs() < SETTLE_VELOCITY)
        };

        update(current);

        // `update` may have started a new loop; that one owns the motion now.
        if settled || state.borrow().pending.is_some() {
            trace!(current, settled, "motion loop finished");
            return;
        }

        let id = schedule_step(state.clone(), next_scheduler, smooth_factor, update);
        state.borrow_mut().pending = Some(id);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn setup(initial: f64) -> (FrameScheduler, SmoothMotion) {
        let scheduler = FrameScheduler::new();
        let motion = SmoothMotion::new(scheduler.clone(), initial, DEFAULT_SMOOTH_FACTOR);
        (scheduler, motion)
    }

    #[test]
    fn test_snap_is_synchronous() {
        let (scheduler, motion) = setup(0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        motion.set_value(250.0, move |v| seen_clone.borrow_mut().push(v), false);

        assert_eq!(*seen.borrow(), vec![250.0]);
        assert_eq!(motion.current(), 250.0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_first_frame_step() {
        let (scheduler, motion) = setup(0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        motion.set_value(100.0, move |v| seen_clone.borrow_mut().push(v), true);
        assert!(seen.borrow().is_empty());
        assert!(motion.is_animating());

        scheduler.tick();
        assert_eq!(seen.borrow().len(), 1);
        assert!((seen.borrow()[0] - 5.0).abs() < 1e-9);
        assert!((motion.velocity() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_converges_and_stops() {
        let (scheduler, motion) = setup(0.0);
        let last = Rc::new(Cell::new(0.0));

        let last_clone = last.clone();
        motion.set_value(500.0, move |v| last_clone.set(v), true);

        let frames = scheduler.run_until_idle(10_000);
        assert!(frames > 1);
        assert!(frames < 10_000);
        assert!(!motion.is_animating());

        // Stops once a step is under the epsilon: within 0.1 / 0.05 of target.
        assert!((500.0 - last.get()).abs() < SETTLE_VELOCITY / DEFAULT_SMOOTH_FACTOR);
        assert!(motion.velocity().abs() < SETTLE_VELOCITY);
    }

    #[test]
    fn test_monotonic_approach() {
        let (scheduler, motion) = setup(0.0);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_clone = seen.clone();
        motion.set_value(-300.0, move |v| seen_clone.borrow_mut().push(v), true);
        scheduler.run_until_idle(10_000);

        let seen = seen.borrow();
        assert!(seen.windows(2).all(|pair| pair[1] < pair[0]));
        assert!(seen.iter().all(|v| *v > -300.0));
    }

    #[test]
    fn test_restart_cancels_previous_loop() {
        let (scheduler, motion) = setup(0.0);
        let first = Rc::new(Cell::new(0));
        let second = Rc::new(Cell::new(0));

        let first_clone = first.clone();
        motion.set_value(1000.0, move |_| first_clone.set(first_clone.get() + 1), true);
        scheduler.tick();
        assert_eq!(first.get(), 1);

        let second_clone = second.clone();
        motion.set_value(0.0, move |_| second_clone.set(second_clone.get() + 1), true);

        // Only one loop is queued at a time.
        assert_eq!(scheduler.pending(), 1);
        scheduler.run_until_idle(10_000);

        assert_eq!(first.get(), 1);
        assert!(second.get() > 0);
    }

    #[test]
    fn test_jump_to_resets_without_update() {
        let (scheduler, motion) = setup(0.0);
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        motion.set_value(800.0, move |_| count_clone.set(count_clone.get() + 1), true);
        scheduler.tick();
        assert_eq!(count.get(), 1);

        motion.jump_to(0.0);
        assert!(!motion.is_animating());
        assert_eq!(motion.current(), 0.0);
        assert_eq!(motion.target(), 0.0);

        scheduler.run_until_idle(100);
        assert_eq!(count.get(), 1);
    }
}
