//! Tiered shuffle - importance-weighted, cyclic content distribution.
//!
//! Items are bucketed by integer importance tier, each bucket is shuffled on
//! its own, and the buckets are concatenated in ascending tier order. Reading
//! with [`ShuffledGridData::next`] cycles over that fixed order forever, so
//! low tiers come up first in every cycle.
//!
//! # Example
//!
//! ```ignore
//! let mut data = shuffle_grid_data(vec![
//!     ShuffleItem::new(0, "hero"),
//!     ShuffleItem::new(1, "feature"),
//!     ShuffleItem::new(2, "filler"),
//! ])?;
//!
//! assert_eq!(data.next(), Some(&"hero"));
//! ```

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{GridError, Result};

/// One content item with its importance tier.
///
/// The tier is a float so catalogs read from loosely typed sources can be
/// validated; it must be a non-negative whole number.
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffleItem<T> {
    pub importance: f64,
    pub data: T,
}

impl<T> ShuffleItem<T> {
    pub fn new(importance: impl Into<f64>, data: T) -> Self {
        Self {
            importance: importance.into(),
            data,
        }
    }
}

/// Flattened, tier-ordered content with a wrapping read cursor.
#[derive(Debug, Clone)]
pub struct ShuffledGridData<T> {
    data: Vec<T>,
    read_next: usize,
}

/// Build a distributor using the thread-local RNG.
pub fn shuffle_grid_data<T>(items: impl IntoIterator<Item = ShuffleItem<T>>) -> Result<ShuffledGridData<T>> {
    shuffle_grid_data_with_rng(items, &mut rand::thread_rng())
}

/// Build a distributor with a caller-supplied RNG (seeded for reproducible order).
pub fn shuffle_grid_data_with_rng<T, R: Rng + ?Sized>(
    items: impl IntoIterator<Item = ShuffleItem<T>>,
    rng: &mut R,
) -> Result<ShuffledGridData<T>> {
    let mut tiers: BTreeMap<u32, Vec<T>> = BTreeMap::new();

    for item in items {
        let tier = validate_importance(item.importance)?;
        tiers.entry(tier).or_default().push(item.data);
    }

    let data = tiers
        .into_values()
        .flat_map(|mut bucket| {
            bucket.shuffle(&mut *rng);
            bucket
        })
        .collect();

    Ok(ShuffledGridData { data, read_next: 0 })
}

fn validate_importance(importance: f64) -> Result<u32> {
    let whole = importance.is_finite() && importance.fract() == 0.0;
    if !whole || importance < 0.0 || importance > u32::MAX as f64 {
        return Err(GridError::InvalidImportance(importance));
    }
    Ok(importance as u32)
}

fn advance<'a, T>(data: &'a [T], cursor: &mut usize) -> Option<&'a T> {
    if data.is_empty() {
        return None;
    }
    let index = *cursor;
    *cursor = (index + 1) % data.len();
    data.get(index)
}

impl<T> ShuffledGridData<T> {
    /// Item at the cursor, then advance (wrapping). `None` only when empty.
    ///
    /// The distributor never ends, so it is not an `Iterator` itself; use
    /// [`ShuffledGridData::cycle`] for iterator combinators.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&T> {
        advance(&self.data, &mut self.read_next)
    }

    /// Endless iterator from the cursor, advancing it with every item.
    /// Yields nothing when the distributor is empty.
    pub fn cycle(&mut self) -> impl Iterator<Item = &T> + '_ {
        let data = self.data.as_slice();
        let cursor = &mut self.read_next;
        std::iter::from_fn(move || advance(data, cursor))
    }

    /// Flattened order, fixed for the life of the distributor.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Index the next read will return.
    pub fn cursor(&self) -> usize {
        self.read_next
    }

    /// Restart the cycle from the first item.
    pub fn reset(&mut self) {
        self.read_next = 0;
    }
}
