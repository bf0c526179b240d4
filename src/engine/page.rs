//! Page - one rendered instance of a grid template.
//!
//! # Lifecycle
//!
//! 1. Container and `rows × cols` cell elements are created on the surface
//! 2. The page is stored in the registry and linked into the spatial chain
//! 3. Every cell is rendered in row-major order (neighbour lookup works here)
//! 4. The height is measured and re-measured on every viewport change
//!
//! Destruction runs the cell disposers, removes the container, drops the
//! resize subscription and unlinks the page. Pages never destroy themselves;
//! the engine decides when.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::cell::{CellDisposer, CellInfo, CellRenderer, UpdateHook};
use super::registry::{PageId, PageRegistry};
use crate::grid::GridTemplate;
use crate::layout::Surface;
use crate::state::{ReactiveCell, SubscriberId};
use crate::types::{ElementId, Region};

pub struct Page {
    template: Rc<GridTemplate>,
    container: ElementId,
    cells: Vec<ElementId>,
    height: ReactiveCell<f64>,
    inserted_before: bool,
    disposers: Vec<CellDisposer>,
    update_hooks: Vec<UpdateHook>,
    resize_subscription: Option<SubscriberId>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("rows", &self.template.rows())
            .field("cols", &self.template.cols())
            .field("container", &self.container)
            .field("height", &self.height.get())
            .field("inserted_before", &self.inserted_before)
            .field("disposers", &self.disposers.len())
            .field("update_hooks", &self.update_hooks.len())
            .finish()
    }
}

impl Page {
    pub fn template(&self) -> &Rc<GridTemplate> {
        &self.template
    }

    pub fn container(&self) -> ElementId {
        self.container
    }

    /// Cell elements, row-major.
    pub fn cells(&self) -> &[ElementId] {
        &self.cells
    }

    /// Last measured height, trailing spacing included.
    pub fn height(&self) -> f64 {
        self.height.get()
    }

    pub fn height_cell(&self) -> &ReactiveCell<f64> {
        &self.height
    }

    /// Whether the page lives in the backward (upward-growing) region.
    pub fn inserted_before(&self) -> bool {
        self.inserted_before
    }

    pub fn update_hooks(&self) -> &[UpdateHook] {
        &self.update_hooks
    }

    pub(crate) fn add_update_hook(&mut self, hook: UpdateHook) {
        self.update_hooks.push(hook);
    }
}

// =============================================================================
// Page Context
// =============================================================================

/// Shared handles every page operation needs.
#[derive(Clone)]
pub(crate) struct PageContext {
    pub registry: Rc<RefCell<PageRegistry>>,
    pub surface: Rc<RefCell<dyn Surface>>,
    pub renderer: CellRenderer,
    pub viewport_height: ReactiveCell<f64>,
}

impl PageContext {
    /// Build, link and render a page from `template` in `region`.
    pub fn create_page(&self, template: Rc<GridTemplate>, region: Region) -> PageId {
        let (container, cells) = {
            let mut surface = self.surface.borrow_mut();
            let container = surface.create_page(region, template.cols());
            let cells: Vec<ElementId> = (0..template.cell_count())
                .map(|_| surface.create_cell(container))
                .collect();
            (container, cells)
        };

        let height = ReactiveCell::new(0.0);
        let page = Page {
            template: template.clone(),
            container,
            cells,
            height: height.clone(),
            inserted_before: region.is_backward(),
            disposers: Vec::new(),
            update_hooks: Vec::new(),
            resize_subscription: None,
        };

        // Link before rendering so neighbour lookup sees the chain.
        let id = {
            let mut registry = self.registry.borrow_mut();
            let id = registry.insert(page);
            match region {
                Region::Forward => registry.link_after_tail(id),
                Region::Backward => registry.link_before_head(id),
            }
            id
        };

        let disposers = self.render_cells(id, &template);
        let orphaned = {
            let mut registry = self.registry.borrow_mut();
            match registry.get_mut(id) {
                Some(page) => {
                    page.disposers.extend(disposers);
                    Vec::new()
                }
                None => disposers,
            }
        };
        // Destroyed while rendering: its disposers still run exactly once.
        for dispose in orphaned {
            dispose();
        }

        let measured = self.surface.borrow_mut().measure_height(container);
        height.set(measured);

        let surface = self.surface.clone();
        let resize_height = height.clone();
        let subscription = self.viewport_height.on_change(move |_| {
            let measured = surface.borrow_mut().measure_height(container);
            resize_height.set(measured);
        });
        match self.registry.borrow_mut().get_mut(id) {
            Some(page) => page.resize_subscription = Some(subscription),
            None => {
                self.viewport_height.unobserve_change(subscription);
            }
        }

        debug!(
            page = id.index(),
            ?region,
            rows = template.rows(),
            cols = template.cols(),
            height = measured,
            "page created"
        );
        id
    }

    fn render_cells(&self, id: PageId, template: &GridTemplate) -> Vec<CellDisposer> {
        let handle = Rc::downgrade(&self.registry);
        let mut disposers = Vec::new();

        for row in 0..template.rows() {
            for col in 0..template.cols() {
                let info = {
                    let registry = self.registry.borrow();
                    CellInfo::from_registry(&handle, &registry, id, col, row)
                };
                let Some(info) = info else { continue };
                if let Some(dispose) = (self.renderer)(&info) {
                    disposers.push(dispose);
                }
            }
        }
        disposers
    }

    /// Tear a page down. Returns `false` for a stale handle.
    pub fn destroy_page(&self, id: PageId) -> bool {
        let taken = {
            let mut registry = self.registry.borrow_mut();
            registry
                .get_mut(id)
                .map(|page| (page.container, std::mem::take(&mut page.disposers)))
        };
        let Some((container, disposers)) = taken else {
            return false;
        };

        for dispose in disposers {
            dispose();
        }

        self.surface.borrow_mut().remove(container);

        let removed = self.registry.borrow_mut().remove(id);
        if let Some(page) = removed {
            if let Some(subscription) = page.resize_subscription {
                self.viewport_height.unobserve_change(subscription);
            }
        }

        debug!(page = id.index(), "page destroyed");
        true
    }

    /// Re-measure one page into its height cell.
    pub fn measure_page(&self, id: PageId) -> Option<f64> {
        let (container, height) = {
            let registry = self.registry.borrow();
            let page = registry.get(id)?;
            (page.container, page.height.clone())
        };
        let measured = self.surface.borrow_mut().measure_height(container);
        height.set(measured);
        Some(measured)
    }
}
