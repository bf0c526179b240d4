//! Cell descriptors handed to the host renderer.
//!
//! A [`CellInfo`] names one coordinate of one page. It stays valid after the
//! render call returns, so renderers can keep it in `on_update` hooks and
//! look up neighbours later. Neighbour lookup walks the page links, so a
//! cell in the last row of a page can see the first row of the page below.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::registry::{PageId, PageRegistry};
use crate::error::{GridError, Result};
use crate::types::{CellKind, ElementId};

/// Cleanup returned by a renderer, run once when the owning page is destroyed.
pub type CellDisposer = Box<dyn FnOnce()>;

/// Host render function, called once per cell in row-major order.
pub type CellRenderer = Rc<dyn Fn(&CellInfo) -> Option<CellDisposer>>;

/// Wrap a render function as a [`CellRenderer`].
pub fn cell_renderer(render: impl Fn(&CellInfo) -> Option<CellDisposer> + 'static) -> CellRenderer {
    Rc::new(render)
}

/// Refresh hook registered through [`CellInfo::on_update`].
pub type UpdateHook = Rc<dyn Fn()>;

/// Everything the renderer knows about one cell.
#[derive(Clone)]
pub struct CellInfo {
    pub col: usize,
    pub row: usize,
    pub is_first_col: bool,
    pub is_last_col: bool,
    pub kind: CellKind,
    /// Backing visual element on the surface.
    pub element: ElementId,
    /// Page the cell belongs to.
    pub page: PageId,
    registry: Weak<RefCell<PageRegistry>>,
}

impl fmt::Debug for CellInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellInfo")
            .field("col", &self.col)
            .field("row", &self.row)
            .field("kind", &self.kind)
            .field("element", &self.element)
            .field("page", &self.page)
            .finish()
    }
}

impl CellInfo {
    /// Describe `(col, row)` of a live page. `None` if out of range.
    pub(crate) fn from_registry(
        handle: &Weak<RefCell<PageRegistry>>,
        registry: &PageRegistry,
        page: PageId,
        col: usize,
        row: usize,
    ) -> Option<Self> {
        let entry = registry.get(page)?;
        let template = entry.template();
        let kind = template.kind_at(col, row)?;
        let element = *entry.cells().get(row * template.cols() + col)?;

        Some(Self {
            col,
            row,
            is_first_col: col == 0,
            is_last_col: col + 1 == template.cols(),
            kind,
            element,
            page,
            registry: handle.clone(),
        })
    }

    /// Cell at a relative offset.
    ///
    /// Rows past either edge of this page continue into the linked pages
    /// above and below. Fails with [`GridError::CellDoesNotExist`] when there
    /// is no page in that direction or the column is outside the grid.
    pub fn get_nearby_cell(&self, col_offset: isize, row_offset: isize) -> Result<CellInfo> {
        let target_col = self.col as isize + col_offset;
        let target_row = self.row as isize + row_offset;
        let missing = || GridError::CellDoesNotExist {
            col: target_col,
            row: target_row,
        };

        if target_col < 0 {
            return Err(missing());
        }
        let handle = self.registry.upgrade().ok_or_else(missing)?;
        let registry = handle.borrow();
        let rows_of = |id: PageId| registry.get(id).map(|page| page.template().rows() as isize);

        let mut page = self.page;
        let mut row = target_row;
        while row < 0 {
            page = registry.prev(page).ok_or_else(missing)?;
            row += rows_of(page).ok_or_else(missing)?;
        }
        loop {
            let rows = rows_of(page).ok_or_else(missing)?;
            if row < rows {
                break;
            }
            row -= rows;
            page = registry.next(page).ok_or_else(missing)?;
        }

        Self::from_registry(&self.registry, &registry, page, target_col as usize, row as usize)
            .ok_or_else(missing)
    }

    /// Register a hook run by `InfiniteGrid::refresh_cells`.
    ///
    /// Ignored once the page is gone.
    pub fn on_update(&self, callback: impl Fn() + 'static) {
        let Some(registry) = self.registry.upgrade() else { return };
        if let Some(page) = registry.borrow_mut().get_mut(self.page) {
            page.add_update_hook(Rc::new(callback));
        }
    }
}
