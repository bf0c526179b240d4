//! Page Registry - generational arena holding the live pages.
//!
//! Manages the lifecycle of page slots:
//! - Free slot pool for O(1) reuse
//! - Generation counters so a stale `PageId` never resolves to a newer page
//! - Spatial links (`next` is the page below, `prev` the page above)
//!
//! # Pattern
//!
//! Pages appended in the forward region are linked after the spatial tail,
//! pages prepended in the backward region before the spatial head. Removing
//! a page excises it: `prev.next = next` and `next.prev = prev`.
//!
//! ```text
//!   head                              tail
//!   [B2] <-> [B1] <-> [F1] <-> [F2] <-> [F3]
//!   backward pages    forward pages
//! ```

use super::page::Page;

// =============================================================================
// Handles
// =============================================================================

/// Generational handle to a page slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    index: u32,
    generation: u32,
}

impl PageId {
    /// Slot index, stable for the life of the page.
    pub fn index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    next: Option<PageId>,
    prev: Option<PageId>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

// =============================================================================
// Registry
// =============================================================================

/// Arena of linked pages.
#[derive(Debug)]
pub struct PageRegistry<T = Page> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: Option<PageId>,
    tail: Option<PageId>,
    len: usize,
}

impl<T> Default for PageRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PageRegistry<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Store a value in a fresh or reused slot. The page starts unlinked.
    pub fn insert(&mut self, value: T) -> PageId {
        let entry = Entry {
            value,
            next: None,
            prev: None,
        };
        self.len += 1;

        // Reuse free slot or grow
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(entry);
            return PageId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        PageId {
            index,
            generation: 0,
        }
    }

    /// Remove a page, excising it from the spatial chain.
    ///
    /// Returns `None` if the handle is stale.
    pub fn remove(&mut self, id: PageId) -> Option<T> {
        self.entry(id)?;
        self.unlink(id);

        let slot = &mut self.slots[id.index as usize];
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(entry.value)
    }

    pub fn get(&self, id: PageId) -> Option<&T> {
        self.entry(id).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, id: PageId) -> Option<&mut T> {
        self.entry_mut(id).map(|entry| &mut entry.value)
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.entry(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // =========================================================================
    // Spatial links
    // =========================================================================

    /// Topmost page.
    pub fn head(&self) -> Option<PageId> {
        self.head
    }

    /// Bottommost page.
    pub fn tail(&self) -> Option<PageId> {
        self.tail
    }

    /// Page directly below `id`.
    pub fn next(&self, id: PageId) -> Option<PageId> {
        self.entry(id).and_then(|entry| entry.next)
    }

    /// Page directly above `id`.
    pub fn prev(&self, id: PageId) -> Option<PageId> {
        self.entry(id).and_then(|entry| entry.prev)
    }

    /// Link an unlinked page below the current tail.
    pub fn link_after_tail(&mut self, id: PageId) {
        if !self.contains(id) {
            return;
        }
        let old_tail = self.tail;
        if let Some(tail) = old_tail {
            if let Some(entry) = self.entry_mut(tail) {
                entry.next = Some(id);
            }
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.prev = old_tail;
            entry.next = None;
        }
        self.tail = Some(id);
        if self.head.is_none() {
            self.head = Some(id);
        }
    }

    /// Link an unlinked page above the current head.
    pub fn link_before_head(&mut self, id: PageId) {
        if !self.contains(id) {
            return;
        }
        let old_head = self.head;
        if let Some(head) = old_head {
            if let Some(entry) = self.entry_mut(head) {
                entry.prev = Some(id);
            }
        }
        if let Some(entry) = self.entry_mut(id) {
            entry.next = old_head;
            entry.prev = None;
        }
        self.head = Some(id);
        if self.tail.is_none() {
            self.tail = Some(id);
        }
    }

    /// Page handles from head to tail.
    pub fn spatial_order(&self) -> Vec<PageId> {
        let mut order = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(id) = cursor {
            order.push(id);
            cursor = self.next(id);
        }
        order
    }

    fn unlink(&mut self, id: PageId) {
        let Some(entry) = self.entry(id) else { return };
        let (prev, next) = (entry.prev, entry.next);

        match prev {
            Some(prev) => {
                if let Some(entry) = self.entry_mut(prev) {
                    entry.next = next;
                }
            }
            None if self.head == Some(id) => self.head = next,
            None => {}
        }
        match next {
            Some(next) => {
                if let Some(entry) = self.entry_mut(next) {
                    entry.prev = prev;
                }
            }
            None if self.tail == Some(id) => self.tail = prev,
            None => {}
        }

        if let Some(entry) = self.entry_mut(id) {
            entry.prev = None;
            entry.next = None;
        }
    }

    fn entry(&self, id: PageId) -> Option<&Entry<T>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, id: PageId) -> Option<&mut Entry<T>> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PageRegistry<&'static str>, PageId, PageId, PageId) {
        let mut registry = PageRegistry::new();
        let a = registry.insert("a");
        registry.link_after_tail(a);
        let b = registry.insert("b");
        registry.link_after_tail(b);
        let c = registry.insert("c");
        registry.link_after_tail(c);
        (registry, a, b, c)
    }

    #[test]
    fn test_link_after_tail() {
        let (registry, a, b, c) = setup();
        assert_eq!(registry.head(), Some(a));
        assert_eq!(registry.tail(), Some(c));
        assert_eq!(registry.next(a), Some(b));
        assert_eq!(registry.prev(c), Some(b));
        assert_eq!(registry.spatial_order(), vec![a, b, c]);
    }

    #[test]
    fn test_remove_middle_relinks_neighbours() {
        let (mut registry, a, b, c) = setup();

        assert_eq!(registry.remove(b), Some("b"));
        assert_eq!(registry.next(a), Some(c));
        assert_eq!(registry.prev(c), Some(a));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.spatial_order(), vec![a, c]);
    }

    #[test]
    fn test_remove_ends_moves_head_and_tail() {
        let (mut registry, a, b, c) = setup();

        registry.remove(a);
        assert_eq!(registry.head(), Some(b));
        assert_eq!(registry.prev(b), None);

        registry.remove(c);
        assert_eq!(registry.tail(), Some(b));
        assert_eq!(registry.next(b), None);

        registry.remove(b);
        assert!(registry.is_empty());
        assert_eq!(registry.head(), None);
        assert_eq!(registry.tail(), None);
    }

    #[test]
    fn test_link_before_head() {
        let mut registry = PageRegistry::new();
        let forward = registry.insert(1);
        registry.link_after_tail(forward);
        let up1 = registry.insert(2);
        registry.link_before_head(up1);
        let up2 = registry.insert(3);
        registry.link_before_head(up2);

        assert_eq!(registry.spatial_order(), vec![up2, up1, forward]);
        assert_eq!(registry.prev(forward), Some(up1));
        assert_eq!(registry.tail(), Some(forward));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut registry = PageRegistry::new();
        let old = registry.insert("old");
        registry.remove(old);

        let new = registry.insert("new");
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert_eq!(registry.get(old), None);
        assert_eq!(registry.get(new), Some(&"new"));
        assert_eq!(registry.remove(old), None);
    }

    #[test]
    fn test_get_mut() {
        let (mut registry, a, _, _) = setup();
        if let Some(value) = registry.get_mut(a) {
            *value = "changed";
        }
        assert_eq!(registry.get(a), Some(&"changed"));
    }
}
