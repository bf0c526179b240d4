//! Reactive Cell - Observable value with synchronous change notification.
//!
//! A `ReactiveCell<T>` is a shared handle (cloning shares the value) over a
//! `spark_signals` source. On top of the signal it keeps the previous value
//! and an ordered list of change subscribers.
//!
//! # Pattern
//!
//! - `set()` records the previous value, writes the signal, then notifies
//! - Every `set()` notifies, equal values included
//! - Subscribers run synchronously, in subscription order
//! - No borrow is held while subscribers run, so a subscriber may read the
//!   cell or call `set()` again (the nested round completes first)
//! - Signal effects depending on the cell run after the outermost `set()`
//!   has notified all of its subscribers
//!
//! # Example
//!
//! ```ignore
//! use daybreak_grid::state::ReactiveCell;
//!
//! let scroll = ReactiveCell::new(0.0);
//! let id = scroll.on_change(|value| println!("scrolled to {value}"));
//!
//! scroll.set(120.0);
//! assert_eq!(scroll.prev(), 0.0);
//!
//! scroll.unobserve_change(id);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{batch, mutable_source, untrack, AnySource, Signal};

/// Handle identifying one subscription on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct CellInner<T> {
    value: Signal<T>,
    prev_value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriberId, Subscriber<T>)>>,
    next_id: Cell<u64>,
}

/// Mutable value holder with synchronous, ordered change notification.
pub struct ReactiveCell<T> {
    inner: Rc<CellInner<T>>,
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: fmt::Debug + Clone + 'static> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveCell")
            .field("value", &self.inner.value)
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: Clone + 'static> ReactiveCell<T> {
    /// Create a cell. The previous value starts out equal to `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            inner: Rc::new(CellInner {
                prev_value: RefCell::new(initial.clone()),
                value: mutable_source(initial),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Current value. Tracked when read inside a signal effect.
    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Value before the most recent `set()`.
    pub fn prev(&self) -> T {
        self.inner.prev_value.borrow().clone()
    }

    /// Borrow the current value without cloning.
    ///
    /// Do not call `set()` on the same cell from inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.value.with(f)
    }

    /// Store a new value and notify every subscriber with it.
    pub fn set(&self, new_value: T) {
        batch(|| {
            let previous = untrack(|| self.inner.value.get());
            *self.inner.prev_value.borrow_mut() = previous;
            self.inner.value.set(new_value.clone());

            // Snapshot so subscribers can (un)subscribe while being notified.
            let subscribers: Vec<Subscriber<T>> = self
                .inner
                .subscribers
                .borrow()
                .iter()
                .map(|(_, subscriber)| subscriber.clone())
                .collect();

            for subscriber in subscribers {
                subscriber(&new_value);
            }
        });
    }

    /// Derive the next value from the current one, then `set()` it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Register a subscriber. Returns the handle used to remove it.
    pub fn on_change(&self, subscriber: impl Fn(&T) + 'static) -> SubscriberId {
        let id = SubscriberId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(subscriber)));
        id
    }

    /// Remove a subscriber. Returns `false` if it was not registered.
    pub fn unobserve_change(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(subscriber_id, _)| *subscriber_id != id);
        subscribers.len() != before
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone + Default + 'static> Default for ReactiveCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// =============================================================================
// Type-erased observation (used by the effect scheduler)
// =============================================================================

/// Anything an effect can depend on.
pub trait Observable {
    /// The signal source a state renderer tracks.
    fn source(&self) -> Rc<dyn AnySource>;
}

impl<T: Clone + 'static> Observable for ReactiveCell<T> {
    fn source(&self) -> Rc<dyn AnySource> {
        self.inner.value.as_any_source()
    }
}
