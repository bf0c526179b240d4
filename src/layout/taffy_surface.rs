//! Taffy-backed surface - lays pages out as CSS grids without a display.
//!
//! Each page is a grid container (`repeat(cols, 1fr)`, `gap: spacing`,
//! `width: 100%`) whose children are the cells. Taffy computes the container
//! height and the cell offsets; pages are stacked with a trailing `spacing`
//! margin, forward pages downwards from `leading_offset` and backward pages
//! upwards from the origin.
//!
//! Layouts are cached per page and dropped whenever something that affects
//! them changes (width, spacing, a cell height).

use std::collections::HashMap;

use taffy::prelude::TaffyMaxContent;
use taffy::style_helpers::fr;
use taffy::{
    Dimension, Display, LengthPercentage, NodeId, Size, Style, TaffyError, TaffyTree,
};
use tracing::warn;

use super::surface::Surface;
use crate::types::{Bounds, ElementId, Region};

/// Cell height used until the host sets one explicitly.
pub const DEFAULT_CELL_HEIGHT: f64 = 100.0;

// =============================================================================
// Node bookkeeping
// =============================================================================

#[derive(Debug, Clone, Default)]
struct PageLayout {
    /// Container height, without the trailing margin.
    height: f64,
    /// (offset from container top, height) per cell.
    cells: Vec<(f64, f64)>,
}

#[derive(Debug)]
struct PageNode {
    region: Region,
    cols: usize,
    cells: Vec<ElementId>,
    layout: Option<PageLayout>,
}

#[derive(Debug)]
struct CellNode {
    page: ElementId,
    index: usize,
    height: Option<f64>,
}

/// In-memory [`Surface`] computing real grid layout with Taffy.
#[derive(Debug)]
pub struct LayoutSurface {
    width: f64,
    spacing: f64,
    leading_offset: f64,
    default_cell_height: f64,
    translate: f64,
    native_scroll: bool,
    next_id: u64,
    pages: HashMap<ElementId, PageNode>,
    cells: HashMap<ElementId, CellNode>,
    /// Forward pages, top to bottom.
    forward: Vec<ElementId>,
    /// Backward pages, nearest the origin first.
    backward: Vec<ElementId>,
}

impl LayoutSurface {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            spacing: 0.0,
            leading_offset: 0.0,
            default_cell_height: DEFAULT_CELL_HEIGHT,
            translate: 0.0,
            native_scroll: false,
            next_id: 0,
            pages: HashMap::new(),
            cells: HashMap::new(),
            forward: Vec::new(),
            backward: Vec::new(),
        }
    }

    /// Builder-style default cell height.
    pub fn with_cell_height(mut self, height: f64) -> Self {
        self.default_cell_height = height;
        self
    }

    /// Resize the surface horizontally. Every page is laid out again.
    pub fn set_width(&mut self, width: f64) {
        self.width = width;
        self.invalidate_all();
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Give one cell an explicit height (a renderer styling its element).
    pub fn set_cell_height(&mut self, cell: ElementId, height: f64) {
        let Some(node) = self.cells.get_mut(&cell) else { return };
        node.height = Some(height);
        let page = node.page;
        if let Some(page) = self.pages.get_mut(&page) {
            page.layout = None;
        }
    }

    /// Current content translation applied in wheel mode.
    pub fn translate(&self) -> f64 {
        self.translate
    }

    pub fn native_scroll(&self) -> bool {
        self.native_scroll
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn leading_offset(&self) -> f64 {
        self.leading_offset
    }

    /// Live page containers, top to bottom.
    pub fn page_order(&self) -> Vec<ElementId> {
        self.backward
            .iter()
            .rev()
            .chain(self.forward.iter())
            .copied()
            .collect()
    }

    /// Cell elements of a page, row-major.
    pub fn cells_of(&self, page: ElementId) -> &[ElementId] {
        self.pages
            .get(&page)
            .map(|node| node.cells.as_slice())
            .unwrap_or(&[])
    }

    pub fn element_count(&self) -> usize {
        self.pages.len() + self.cells.len()
    }

    fn allocate_id(&mut self) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        id
    }

    fn invalidate_all(&mut self) {
        for page in self.pages.values_mut() {
            page.layout = None;
        }
    }

    fn ensure_layout(&mut self, page: ElementId) -> Option<&PageLayout> {
        let needs_layout = self.pages.get(&page)?.layout.is_none();
        if needs_layout {
            let node = self.pages.get(&page)?;
            let heights: Vec<f64> = node
                .cells
                .iter()
                .map(|cell| {
                    self.cells
                        .get(cell)
                        .and_then(|c| c.height)
                        .unwrap_or(self.default_cell_height)
                })
                .collect();

            let layout = compute_page_layout(node.cols, &heights, self.width, self.spacing)
                .unwrap_or_else(|err| {
                    warn!(?page, %err, "page layout failed");
                    PageLayout::default()
                });
            if let Some(node) = self.pages.get_mut(&page) {
                node.layout = Some(layout);
            }
        }
        self.pages.get(&page)?.layout.as_ref()
    }

    /// Height a page occupies in the stack (container plus trailing gap).
    fn footprint(&mut self, page: ElementId) -> f64 {
        let spacing = self.spacing;
        self.ensure_layout(page)
            .map(|layout| layout.height + spacing)
            .unwrap_or(0.0)
    }

    fn page_top(&mut self, page: ElementId) -> Option<f64> {
        let region = self.pages.get(&page)?.region;
        match region {
            Region::Forward => {
                let before: Vec<ElementId> = self
                    .forward
                    .iter()
                    .take_while(|id| **id != page)
                    .copied()
                    .collect();
                let mut top = self.leading_offset;
                for id in before {
                    top += self.footprint(id);
                }
                Some(top)
            }
            Region::Backward => {
                let upto: Vec<ElementId> = self
                    .backward
                    .iter()
                    .take_while(|id| **id != page)
                    .copied()
                    .collect();
                let mut top = -self.footprint(page);
                for id in upto {
                    top -= self.footprint(id);
                }
                Some(top)
            }
        }
    }
}

// =============================================================================
// Taffy layout
// =============================================================================

fn compute_page_layout(
    cols: usize,
    cell_heights: &[f64],
    width: f64,
    spacing: f64,
) -> Result<PageLayout, TaffyError> {
    let mut tree: TaffyTree<()> = TaffyTree::new();

    let children = cell_heights
        .iter()
        .map(|height| {
            tree.new_leaf(Style {
                size: Size {
                    width: Dimension::Auto,
                    height: Dimension::Length(*height as f32),
                },
                ..Default::default()
            })
        })
        .collect::<Result<Vec<NodeId>, TaffyError>>()?;

    let gap = LengthPercentage::Length(spacing as f32);
    let root = tree.new_with_children(
        Style {
            display: Display::Grid,
            grid_template_columns: vec![fr(1.0_f32); cols.max(1)],
            gap: Size {
                width: gap,
                height: gap,
            },
            size: Size {
                width: Dimension::Length(width as f32),
                height: Dimension::Auto,
            },
            ..Default::default()
        },
        &children,
    )?;

    tree.compute_layout(root, Size::MAX_CONTENT)?;

    let height = tree.layout(root)?.size.height as f64;
    let cells = children
        .iter()
        .map(|child| {
            tree.layout(*child)
                .map(|layout| (layout.location.y as f64, layout.size.height as f64))
        })
        .collect::<Result<Vec<_>, TaffyError>>()?;

    Ok(PageLayout { height, cells })
}

// =============================================================================
// Surface implementation
// =============================================================================

impl Surface for LayoutSurface {
    fn create_page(&mut self, region: Region, cols: usize) -> ElementId {
        let id = self.allocate_id();
        self.pages.insert(
            id,
            PageNode {
                region,
                cols,
                cells: Vec::new(),
                layout: None,
            },
        );
        match region {
            Region::Forward => self.forward.push(id),
            Region::Backward => self.backward.push(id),
        }
        id
    }

    fn create_cell(&mut self, page: ElementId) -> ElementId {
        let id = self.allocate_id();
        if let Some(node) = self.pages.get_mut(&page) {
            let index = node.cells.len();
            node.cells.push(id);
            node.layout = None;
            self.cells.insert(
                id,
                CellNode {
                    page,
                    index,
                    height: None,
                },
            );
        }
        id
    }

    fn remove(&mut self, element: ElementId) {
        if let Some(page) = self.pages.remove(&element) {
            for cell in page.cells {
                self.cells.remove(&cell);
            }
            self.forward.retain(|id| *id != element);
            self.backward.retain(|id| *id != element);
            return;
        }

        if let Some(cell) = self.cells.remove(&element) {
            if let Some(page) = self.pages.get_mut(&cell.page) {
                page.cells.retain(|id| *id != element);
                page.layout = None;
            }
            // Indices of the remaining cells shift down.
            let siblings: Vec<ElementId> = self.cells_of(cell.page).to_vec();
            for (index, id) in siblings.into_iter().enumerate() {
                if let Some(node) = self.cells.get_mut(&id) {
                    node.index = index;
                }
            }
        }
    }

    fn measure_height(&mut self, element: ElementId) -> f64 {
        if self.pages.contains_key(&element) {
            return self.footprint(element);
        }
        let Some(cell) = self.cells.get(&element) else {
            return 0.0;
        };
        let (page, index) = (cell.page, cell.index);
        self.ensure_layout(page)
            .and_then(|layout| layout.cells.get(index))
            .map(|(_, height)| *height)
            .unwrap_or(0.0)
    }

    fn bounds(&mut self, element: ElementId) -> Option<Bounds> {
        if self.pages.contains_key(&element) {
            let top = self.page_top(element)?;
            let height = self.ensure_layout(element)?.height;
            return Some(Bounds::new(top, height));
        }

        let cell = self.cells.get(&element)?;
        let (page, index) = (cell.page, cell.index);
        let top = self.page_top(page)?;
        let (offset, height) = *self.ensure_layout(page)?.cells.get(index)?;
        Some(Bounds::new(top + offset, height))
    }

    fn set_spacing(&mut self, spacing: f64) {
        self.spacing = spacing;
        self.invalidate_all();
    }

    fn set_leading_offset(&mut self, offset: f64) {
        self.leading_offset = offset;
    }

    fn set_scroll_translate(&mut self, offset: f64) {
        self.translate = offset;
    }

    fn set_native_scroll(&mut self, enabled: bool) {
        self.native_scroll = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with_cells(surface: &mut LayoutSurface, region: Region, cols: usize, count: usize) -> ElementId {
        let page = surface.create_page(region, cols);
        for _ in 0..count {
            surface.create_cell(page);
        }
        page
    }

    #[test]
    fn test_page_height_from_grid_rows() {
        let mut surface = LayoutSurface::new(800.0).with_cell_height(100.0);
        surface.set_spacing(20.0);

        // 3 rows of 100 with 2 gaps of 20, plus the trailing 20.
        let page = page_with_cells(&mut surface, Region::Forward, 4, 12);
        assert!((surface.measure_height(page) - 360.0).abs() < 0.5);

        let bounds = surface.bounds(page).unwrap();
        assert!((bounds.height - 340.0).abs() < 0.5);
        assert_eq!(bounds.top, 0.0);
    }

    #[test]
    fn test_cell_bounds_follow_rows() {
        let mut surface = LayoutSurface::new(400.0).with_cell_height(50.0);
        surface.set_spacing(10.0);
        let page = page_with_cells(&mut surface, Region::Forward, 2, 4);
        let cells = surface.cells_of(page).to_vec();

        let first = surface.bounds(cells[0]).unwrap();
        let third = surface.bounds(cells[2]).unwrap();
        assert!((first.top - 0.0).abs() < 0.5);
        assert!((third.top - 60.0).abs() < 0.5);
        assert!((surface.measure_height(cells[3]) - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_explicit_cell_height_grows_row() {
        let mut surface = LayoutSurface::new(400.0).with_cell_height(50.0);
        let page = page_with_cells(&mut surface, Region::Forward, 2, 2);
        assert!((surface.measure_height(page) - 50.0).abs() < 0.5);

        let cell = surface.cells_of(page)[1];
        surface.set_cell_height(cell, 80.0);
        assert!((surface.measure_height(page) - 80.0).abs() < 0.5);
    }

    #[test]
    fn test_stacking_both_regions() {
        let mut surface = LayoutSurface::new(400.0).with_cell_height(100.0);
        surface.set_leading_offset(30.0);

        let a = page_with_cells(&mut surface, Region::Forward, 1, 1);
        let b = page_with_cells(&mut surface, Region::Forward, 1, 2);
        let up1 = page_with_cells(&mut surface, Region::Backward, 1, 1);
        let up2 = page_with_cells(&mut surface, Region::Backward, 1, 1);

        assert_eq!(surface.bounds(a).unwrap().top, 30.0);
        assert_eq!(surface.bounds(b).unwrap().top, 130.0);
        assert_eq!(surface.bounds(up1).unwrap().top, -100.0);
        assert_eq!(surface.bounds(up2).unwrap().top, -200.0);
        assert_eq!(surface.page_order(), vec![up2, up1, a, b]);
    }

    #[test]
    fn test_remove_page_drops_cells() {
        let mut surface = LayoutSurface::new(400.0);
        let a = page_with_cells(&mut surface, Region::Forward, 2, 4);
        let b = page_with_cells(&mut surface, Region::Forward, 2, 2);
        assert_eq!(surface.element_count(), 8);

        surface.remove(a);
        assert_eq!(surface.element_count(), 3);
        assert!(surface.bounds(a).is_none());
        assert_eq!(surface.bounds(b).unwrap().top, 0.0);
    }

    #[test]
    fn test_translate_and_native_scroll() {
        let mut surface = LayoutSurface::new(400.0);
        surface.set_scroll_translate(42.0);
        surface.set_native_scroll(true);
        assert_eq!(surface.translate(), 42.0);
        assert!(surface.native_scroll());
    }
}
