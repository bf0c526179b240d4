//! State renderer - effects with explicit, static dependency lists.
//!
//! Unlike an auto-tracking effect, the dependencies are declared once when
//! the renderer is created. Every cell the effect reads must be listed;
//! reads of unlisted cells never re-trigger it.
//!
//! Built on `spark_signals::effect_sync`: each run tracks the listed
//! sources, then runs the body inside `untrack`.
//!
//! # Example
//!
//! ```ignore
//! let scroll = ReactiveCell::new(0.0);
//! let height = ReactiveCell::new(800.0);
//!
//! let (s, h) = (scroll.clone(), height.clone());
//! let renderer = create_state_renderer(
//!     move || println!("{} / {}", s.get(), h.get()),
//!     &[&scroll, &height],
//! );
//!
//! scroll.set(40.0); // effect runs again
//! renderer.stop();
//! ```

use std::rc::Rc;

use spark_signals::{effect_sync, track_read, untrack, AnySource};

use super::reactive::Observable;

/// Handle for an effect created by [`create_state_renderer`].
///
/// The effect lives as long as the handle. Dropping it or calling
/// [`StateRenderer::stop`] detaches the effect from every dependency.
pub struct StateRenderer {
    stop_effect: Option<Box<dyn FnOnce()>>,
    dependencies: usize,
}

impl StateRenderer {
    /// Detach the effect from every dependency.
    pub fn stop(mut self) {
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }
    }

    /// Number of dependencies the effect is attached to.
    pub fn dependency_count(&self) -> usize {
        self.dependencies
    }
}

impl Drop for StateRenderer {
    fn drop(&mut self) {
        if let Some(stop) = self.stop_effect.take() {
            stop();
        }
    }
}

/// Run `effect` once now, then again after every `set()` on a dependency.
///
/// Each run reads exactly the listed sources; the body itself runs
/// untracked, so the dependency list never grows.
pub fn create_state_renderer(
    effect: impl Fn() + 'static,
    dependencies: &[&dyn Observable],
) -> StateRenderer {
    let sources: Vec<Rc<dyn AnySource>> = dependencies
        .iter()
        .map(|dependency| dependency.source())
        .collect();
    let count = sources.len();

    let stop = effect_sync(move || {
        for source in &sources {
            track_read(source.clone());
        }
        untrack(&effect);
    });

    StateRenderer {
        stop_effect: Some(Box::new(stop)),
        dependencies: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ReactiveCell;
    use std::cell::{Cell, RefCell};

    #[test]
    fn test_runs_immediately() {
        let count = Rc::new(Cell::new(0));
        let count_clone = count.clone();

        let cell = ReactiveCell::new(0);
        let _renderer = create_state_renderer(
            move || count_clone.set(count_clone.get() + 1),
            &[&cell],
        );

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_reruns_on_each_dependency() {
        let a = ReactiveCell::new(1);
        let b = ReactiveCell::new(10);
        let flag = ReactiveCell::new(false);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (a_read, b_read, seen_clone) = (a.clone(), b.clone(), seen.clone());
        let renderer = create_state_renderer(
            move || seen_clone.borrow_mut().push(a_read.get() + b_read.get()),
            &[&a, &b, &flag],
        );
        assert_eq!(renderer.dependency_count(), 3);

        a.set(2);
        b.set(20);
        flag.set(true);
        assert_eq!(*seen.borrow(), vec![11, 12, 22, 22]);
    }

    #[test]
    fn test_unlisted_dependency_is_ignored() {
        let listed = ReactiveCell::new(0);
        let unlisted = ReactiveCell::new(0);
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let unlisted_read = unlisted.clone();
        let _renderer = create_state_renderer(
            move || {
                let _ = unlisted_read.get();
                count_clone.set(count_clone.get() + 1);
            },
            &[&listed],
        );

        unlisted.set(5);
        assert_eq!(count.get(), 1);

        listed.set(1);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_stop_detaches() {
        let cell = ReactiveCell::new(0);
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let renderer = create_state_renderer(
            move || count_clone.set(count_clone.get() + 1),
            &[&cell],
        );

        renderer.stop();
        cell.set(3);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_drop_detaches() {
        let cell = ReactiveCell::new(0);
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let renderer = create_state_renderer(
            move || count_clone.set(count_clone.get() + 1),
            &[&cell],
        );
        cell.set(1);
        assert_eq!(count.get(), 2);

        drop(renderer);
        cell.set(2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_equal_value_still_notifies() {
        let cell = ReactiveCell::new(4);
        let count = Rc::new(Cell::new(0));

        let count_clone = count.clone();
        let _renderer = create_state_renderer(
            move || count_clone.set(count_clone.get() + 1),
            &[&cell],
        );

        cell.set(4);
        cell.set(4);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_subscribers_run_before_effect() {
        let cell = ReactiveCell::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log_clone = log.clone();
        cell.on_change(move |value| log_clone.borrow_mut().push(format!("subscriber:{value}")));

        let (reader, log_clone) = (cell.clone(), log.clone());
        let _renderer = create_state_renderer(
            move || log_clone.borrow_mut().push(format!("effect:{}", reader.get())),
            &[&cell],
        );

        cell.set(1);
        assert_eq!(*log.borrow(), vec!["effect:0", "subscriber:1", "effect:1"]);
    }
}
