//! Surface - the host's visual-element interface.
//!
//! The engine never creates or styles visual elements itself. A host (a DOM
//! binding, a terminal renderer, the in-memory [`LayoutSurface`]) implements
//! this trait and the engine drives it through opaque [`ElementId`]s.
//!
//! [`LayoutSurface`]: super::LayoutSurface

use crate::types::{Bounds, ElementId, Region};

pub trait Surface {
    /// Create the container for a new page with `cols` grid columns.
    ///
    /// Forward pages are mounted below the last forward page, backward pages
    /// above the topmost backward page.
    fn create_page(&mut self, region: Region, cols: usize) -> ElementId;

    /// Create one cell element inside a page container (row-major order).
    fn create_cell(&mut self, page: ElementId) -> ElementId;

    /// Remove an element. Removing a page removes its cells.
    fn remove(&mut self, element: ElementId);

    /// Rendered height of an element, including the trailing page spacing.
    fn measure_height(&mut self, element: ElementId) -> f64;

    /// Bounds in content coordinates, `None` for unknown elements.
    fn bounds(&mut self, element: ElementId) -> Option<Bounds>;

    /// Gap between cells and below each page.
    fn set_spacing(&mut self, spacing: f64);

    /// Space above the first forward page.
    fn set_leading_offset(&mut self, offset: f64);

    /// Translate the scroll content (wheel mode). `offset` is the eased
    /// scroll position; content moves up by that amount.
    fn set_scroll_translate(&mut self, offset: f64);

    /// Toggle native (touch) scrolling of the base element.
    fn set_native_scroll(&mut self, enabled: bool);
}
