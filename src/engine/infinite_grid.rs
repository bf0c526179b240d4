//! Infinite Grid - scroll windowing engine.
//!
//! Keeps enough pages materialized around the viewport for scrolling in
//! either direction, using pages built from randomly chosen templates.
//!
//! # Pattern
//!
//! One effect depends on `scroll_position`, `viewport_height` and
//! `active_templates`. Each run turns the scroll position into a visual
//! offset (eased in wheel mode, direct in touch mode) and schedules a
//! window maintenance pass on the next frame. The pass inserts pages until
//!
//! ```text
//! positive extent >= viewport + offset + viewport / 2
//! offset + negative extent >= 0
//! ```
//!
//! both hold. Forward insertion wins when both directions are short.
//!
//! # Example
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let surface = Rc::new(RefCell::new(LayoutSurface::new(1200.0)));
//! let grid = InfiniteGrid::new(InfiniteGridConfig {
//!     templates: vec![GridTemplate::parse(&["X_X_", "_X_X"])?],
//!     surface: surface.clone(),
//!     renderer: cell_renderer(|cell| None),
//!     scheduler: scheduler.clone(),
//!     capabilities: InputCapabilities::WHEEL,
//!     viewport_height: 900.0,
//!     settings: GridSettings::default(),
//! })?;
//!
//! grid.handle_wheel(120.0);
//! scheduler.run_until_idle(1000);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, error, trace, warn};

use super::cell::{CellRenderer, UpdateHook};
use super::page::PageContext;
use super::registry::{PageId, PageRegistry};
use crate::config::GridSettings;
use crate::error::{GridError, Result};
use crate::grid::GridTemplate;
use crate::layout::Surface;
use crate::state::{
    create_state_renderer, FrameRequestId, FrameScheduler, ReactiveCell, SmoothMotion,
    StateRenderer, SubscriberId,
};
use crate::types::{ElementId, InputCapabilities, Region};

/// Most pages a single maintenance pass inserts before deferring.
pub const MAX_PAGES_PER_PASS: usize = 256;

/// Everything the engine needs from its host.
pub struct InfiniteGridConfig {
    pub templates: Vec<GridTemplate>,
    pub surface: Rc<RefCell<dyn Surface>>,
    pub renderer: CellRenderer,
    pub scheduler: FrameScheduler,
    /// Probe result; `TOUCH` starts the engine in native scroll mode.
    pub capabilities: InputCapabilities,
    pub viewport_height: f64,
    pub settings: GridSettings,
}

// =============================================================================
// Engine state
// =============================================================================

struct GridInner {
    pages: PageContext,
    scheduler: FrameScheduler,

    scroll_position: ReactiveCell<f64>,
    viewport_height: ReactiveCell<f64>,
    can_scroll: ReactiveCell<bool>,
    use_touch_input: ReactiveCell<bool>,
    active_templates: ReactiveCell<Vec<Rc<GridTemplate>>>,
    all_pages: ReactiveCell<Vec<PageId>>,
    spacing: ReactiveCell<f64>,
    leading_offset: ReactiveCell<f64>,

    /// Offset the window is maintained for (eased in wheel mode).
    visual_offset: Cell<f64>,
    motion: SmoothMotion,
    smooth_scrolling: bool,
    rng: RefCell<StdRng>,
    maintenance_request: Cell<Option<FrameRequestId>>,
    torn_down: Cell<bool>,
    scroll_renderer: RefCell<Option<StateRenderer>>,
    subscriptions: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// Infinitely scrolling mosaic of template pages.
///
/// Dropping the grid tears it down like [`InfiniteGrid::cleanup`].
pub struct InfiniteGrid {
    inner: Rc<GridInner>,
}

impl fmt::Debug for InfiniteGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteGrid")
            .field("pages", &self.inner.all_pages.with(Vec::len))
            .field("scroll_position", &self.inner.scroll_position.get())
            .field("visual_offset", &self.inner.visual_offset.get())
            .field("viewport_height", &self.inner.viewport_height.get())
            .field("touch", &self.inner.use_touch_input.get())
            .field("torn_down", &self.inner.torn_down.get())
            .finish()
    }
}

impl InfiniteGrid {
    /// Build the engine and start maintaining the window.
    ///
    /// Fails with [`GridError::NoTemplates`] when no template is given. The
    /// first pages appear after the next frames are ticked.
    pub fn new(config: InfiniteGridConfig) -> Result<Self> {
        let InfiniteGridConfig {
            templates,
            surface,
            renderer,
            scheduler,
            capabilities,
            viewport_height,
            settings,
        } = config;

        if templates.is_empty() {
            return Err(GridError::NoTemplates);
        }

        {
            let mut surface = surface.borrow_mut();
            surface.set_spacing(settings.spacing);
            surface.set_leading_offset(settings.leading_offset);
        }

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let viewport = ReactiveCell::new(viewport_height);
        let touch = capabilities.prefers_touch();

        let inner = Rc::new(GridInner {
            pages: PageContext {
                registry: Rc::new(RefCell::new(PageRegistry::new())),
                surface,
                renderer,
                viewport_height: viewport.clone(),
            },
            scheduler: scheduler.clone(),
            scroll_position: ReactiveCell::new(0.0),
            viewport_height: viewport,
            can_scroll: ReactiveCell::new(true),
            use_touch_input: ReactiveCell::new(touch),
            active_templates: ReactiveCell::new(templates.into_iter().map(Rc::new).collect()),
            all_pages: ReactiveCell::new(Vec::new()),
            spacing: ReactiveCell::new(settings.spacing),
            leading_offset: ReactiveCell::new(settings.leading_offset),
            visual_offset: Cell::new(0.0),
            motion: SmoothMotion::new(scheduler, 0.0, settings.smooth_factor),
            smooth_scrolling: settings.smooth_scrolling,
            rng: RefCell::new(rng),
            maintenance_request: Cell::new(None),
            torn_down: Cell::new(false),
            scroll_renderer: RefCell::new(None),
            subscriptions: RefCell::new(Vec::new()),
        });

        if touch {
            inner.apply_touch_mode(true);
        }
        inner.install();

        debug!(
            templates = inner.active_templates.with(Vec::len),
            viewport_height,
            touch,
            "infinite grid created"
        );
        Ok(Self { inner })
    }

    // =========================================================================
    // Host signals
    // =========================================================================

    /// Wheel delta (wheel mode). Ignored while scrolling is disabled.
    pub fn handle_wheel(&self, delta_y: f64) {
        let inner = &self.inner;
        if inner.torn_down.get() || !inner.can_scroll.get() {
            return;
        }
        inner.scroll_position.update(|position| position + delta_y);
    }

    /// Native scroll offset of the base element (touch mode only).
    pub fn handle_native_scroll(&self, offset: f64) {
        let inner = &self.inner;
        if inner.torn_down.get() || !inner.use_touch_input.get() {
            return;
        }
        inner.scroll_position.set(offset);
    }

    /// New viewport height. Pages are re-measured, never destroyed.
    pub fn handle_resize(&self, viewport_height: f64) {
        if self.inner.torn_down.get() {
            return;
        }
        self.inner.viewport_height.set(viewport_height);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub fn enable_scroll(&self) {
        self.inner.can_scroll.set(true);
    }

    pub fn disable_scroll(&self) {
        self.inner.can_scroll.set(false);
    }

    /// Replace the template set. Every live page is destroyed and the window
    /// is rebuilt from the new templates.
    pub fn set_grid_templates(&self, templates: Vec<GridTemplate>) -> Result<()> {
        if templates.is_empty() {
            return Err(GridError::NoTemplates);
        }
        if self.inner.torn_down.get() {
            return Ok(());
        }
        debug!(templates = templates.len(), "template set replaced");
        self.inner
            .active_templates
            .set(templates.into_iter().map(Rc::new).collect());
        Ok(())
    }

    /// Gap between cells and below pages. Pages are re-measured.
    pub fn set_spacing(&self, spacing: f64) {
        let inner = &self.inner;
        if inner.torn_down.get() {
            return;
        }
        inner.spacing.set(spacing);
        inner.pages.surface.borrow_mut().set_spacing(spacing);
        inner.remeasure_pages();
        inner.schedule_maintenance();
    }

    /// Space above the first forward page. Pages are re-measured.
    pub fn set_leading_offset(&self, offset: f64) {
        let inner = &self.inner;
        if inner.torn_down.get() {
            return;
        }
        inner.leading_offset.set(offset);
        inner.pages.surface.borrow_mut().set_leading_offset(offset);
        inner.remeasure_pages();
        inner.schedule_maintenance();
    }

    /// Switch between native (touch) and eased (wheel) scrolling.
    pub fn set_touch_input(&self, enabled: bool) {
        let inner = &self.inner;
        if inner.torn_down.get() || inner.use_touch_input.get() == enabled {
            return;
        }
        inner.use_touch_input.set(enabled);
    }

    /// Observe the page list. Called with the full list after every change.
    pub fn observe_page_creation(&self, observer: impl Fn(&[PageId]) + 'static) -> SubscriberId {
        self.inner
            .all_pages
            .on_change(move |pages: &Vec<PageId>| observer(pages))
    }

    pub fn unobserve_page_creation(&self, id: SubscriberId) -> bool {
        self.inner.all_pages.unobserve_change(id)
    }

    /// Observe the raw (un-eased) scroll position.
    pub fn observe_scroll(&self, observer: impl Fn(f64) + 'static) -> SubscriberId {
        self.inner
            .scroll_position
            .on_change(move |position| observer(*position))
    }

    pub fn unobserve_scroll(&self, id: SubscriberId) -> bool {
        self.inner.scroll_position.unobserve_change(id)
    }

    /// Whether an element intersects the viewport at the current offset.
    pub fn is_in_viewport(&self, element: ElementId) -> bool {
        let inner = &self.inner;
        let bounds = inner.pages.surface.borrow_mut().bounds(element);
        let Some(bounds) = bounds else {
            return false;
        };
        let visible = bounds.scrolled(inner.visual_offset.get());
        visible.bottom() >= 0.0 && visible.top <= inner.viewport_height.get()
    }

    /// Run every `on_update` hook, pages top to bottom.
    pub fn refresh_cells(&self) {
        let hooks: Vec<UpdateHook> = {
            let registry = self.inner.pages.registry.borrow();
            registry
                .spatial_order()
                .into_iter()
                .filter_map(|id| registry.get(id))
                .flat_map(|page| page.update_hooks().iter().cloned())
                .collect()
        };
        trace!(hooks = hooks.len(), "refreshing cells");
        for hook in hooks {
            hook();
        }
    }

    /// Run a maintenance pass now instead of on the next frame.
    pub fn maintain_window(&self) -> Result<()> {
        self.inner.maintain_window()
    }

    /// Tear the engine down: all pages are destroyed, pending frames are
    /// cancelled and host signals are ignored from now on.
    pub fn cleanup(&self) {
        self.inner.cleanup();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live pages in creation order.
    pub fn pages(&self) -> Vec<PageId> {
        self.inner.all_pages.get()
    }

    /// Live pages top to bottom.
    pub fn page_order(&self) -> Vec<PageId> {
        self.inner.pages.registry.borrow().spatial_order()
    }

    pub fn page_count(&self) -> usize {
        self.inner.all_pages.with(Vec::len)
    }

    pub fn page_height(&self, page: PageId) -> Option<f64> {
        self.inner.page_height(page)
    }

    pub fn page_element(&self, page: PageId) -> Option<ElementId> {
        let registry = self.inner.pages.registry.borrow();
        registry.get(page).map(|page| page.container())
    }

    /// Cell elements of a page, row-major.
    pub fn page_cells(&self, page: PageId) -> Vec<ElementId> {
        let registry = self.inner.pages.registry.borrow();
        registry
            .get(page)
            .map(|page| page.cells().to_vec())
            .unwrap_or_default()
    }

    pub fn page_template(&self, page: PageId) -> Option<Rc<GridTemplate>> {
        let registry = self.inner.pages.registry.borrow();
        registry.get(page).map(|page| page.template().clone())
    }

    /// Whether the page sits in the backward region.
    pub fn page_inserted_before(&self, page: PageId) -> Option<bool> {
        let registry = self.inner.pages.registry.borrow();
        registry.get(page).map(|page| page.inserted_before())
    }

    /// Page spatially below `page`.
    pub fn linked_next(&self, page: PageId) -> Option<PageId> {
        self.inner.pages.registry.borrow().next(page)
    }

    /// Page spatially above `page`.
    pub fn linked_prev(&self, page: PageId) -> Option<PageId> {
        self.inner.pages.registry.borrow().prev(page)
    }

    pub fn scroll_position(&self) -> f64 {
        self.inner.scroll_position.get()
    }

    pub fn visual_offset(&self) -> f64 {
        self.inner.visual_offset.get()
    }

    pub fn viewport_height(&self) -> f64 {
        self.inner.viewport_height.get()
    }

    pub fn spacing(&self) -> f64 {
        self.inner.spacing.get()
    }

    pub fn leading_offset(&self) -> f64 {
        self.inner.leading_offset.get()
    }

    pub fn can_scroll(&self) -> bool {
        self.inner.can_scroll.get()
    }

    pub fn use_touch_input(&self) -> bool {
        self.inner.use_touch_input.get()
    }

    pub fn template_count(&self) -> usize {
        self.inner.active_templates.with(Vec::len)
    }

    /// `(positive, negative)` page extents. Positive includes the leading offset.
    pub fn extents(&self) -> (f64, f64) {
        self.inner.extents()
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.torn_down.get()
    }
}

impl Drop for InfiniteGrid {
    fn drop(&mut self) {
        self.inner.cleanup();
    }
}

// =============================================================================
// Internals
// =============================================================================

impl GridInner {
    /// Wire subscriptions and the scroll effect. Template resets are cell
    /// subscribers, which run ahead of the effect, so the effect always sees
    /// an empty page list after a swap.
    fn install(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);

        let on_templates = self.active_templates.on_change({
            let weak = weak.clone();
            move |_| {
                if let Some(grid) = weak.upgrade() {
                    grid.destroy_all_pages();
                }
            }
        });
        let on_touch = self.use_touch_input.on_change({
            let weak = weak.clone();
            move |enabled| {
                if let Some(grid) = weak.upgrade() {
                    grid.apply_touch_mode(*enabled);
                }
            }
        });

        {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let templates = self.active_templates.clone();
            subscriptions.push(Box::new(move || {
                templates.unobserve_change(on_templates);
            }));
            let touch = self.use_touch_input.clone();
            subscriptions.push(Box::new(move || {
                touch.unobserve_change(on_touch);
            }));
        }

        let renderer = create_state_renderer(
            move || {
                if let Some(grid) = weak.upgrade() {
                    grid.drive_scroll();
                }
            },
            &[
                &self.scroll_position,
                &self.viewport_height,
                &self.active_templates,
            ],
        );
        *self.scroll_renderer.borrow_mut() = Some(renderer);
    }

    fn drive_scroll(self: &Rc<Self>) {
        if self.torn_down.get() {
            return;
        }
        let position = self.scroll_position.get();

        if self.use_touch_input.get() {
            self.handle_scroll_update(position);
            return;
        }

        let weak = Rc::downgrade(self);
        self.motion.set_value(
            position,
            move |offset| {
                if let Some(grid) = weak.upgrade() {
                    grid.handle_scroll_update(offset);
                }
            },
            self.smooth_scrolling,
        );
    }

    fn handle_scroll_update(self: &Rc<Self>, offset: f64) {
        if self.torn_down.get() {
            return;
        }
        self.visual_offset.set(offset);
        if !self.use_touch_input.get() {
            self.pages.surface.borrow_mut().set_scroll_translate(offset);
        }
        self.schedule_maintenance();
    }

    /// Queue a maintenance pass for the next frame. At most one is pending.
    fn schedule_maintenance(self: &Rc<Self>) {
        if self.torn_down.get() || self.maintenance_request.get().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let id = self.scheduler.request_frame(move || {
            let Some(grid) = weak.upgrade() else { return };
            grid.maintenance_request.set(None);
            if let Err(err) = grid.maintain_window() {
                error!(%err, "window maintenance failed");
            }
        });
        self.maintenance_request.set(Some(id));
    }

    fn maintain_window(self: &Rc<Self>) -> Result<()> {
        let mut inserted = 0;

        loop {
            if self.torn_down.get() {
                break;
            }
            let viewport = self.viewport_height.get();
            let offset = self.visual_offset.get();
            let (positive, negative) = self.extents();

            let forward_short = positive < viewport + offset + viewport / 2.0;
            let backward_short = offset + negative < 0.0;

            let region = if forward_short && !self.region_stalled(Region::Forward) {
                Region::Forward
            } else if backward_short && !self.region_stalled(Region::Backward) {
                Region::Backward
            } else {
                if forward_short || backward_short {
                    trace!(forward_short, backward_short, "window stalled on a zero-height page");
                }
                break;
            };

            if inserted >= MAX_PAGES_PER_PASS {
                trace!(inserted, "page budget spent, deferring to next frame");
                self.schedule_maintenance();
                break;
            }

            let template = self.pick_template()?;
            let page = self.insert_page(template, region);
            inserted += 1;

            if self.page_height(page).unwrap_or(0.0) <= 0.0 {
                warn!(page = page.index(), ?region, "page has no height, window cannot grow");
                break;
            }
        }

        trace!(inserted, pages = self.all_pages.with(Vec::len), "maintenance pass");
        Ok(())
    }

    /// Whether the outermost page of `region` has no height. Growing past
    /// it cannot change the extents until it is re-measured or replaced.
    fn region_stalled(&self, region: Region) -> bool {
        let registry = self.pages.registry.borrow();
        let edge = match region {
            Region::Forward => registry.tail(),
            Region::Backward => registry.head(),
        };
        edge.and_then(|id| registry.get(id)).is_some_and(|page| {
            page.inserted_before() == (region == Region::Backward) && page.height() <= 0.0
        })
    }

    fn pick_template(&self) -> Result<Rc<GridTemplate>> {
        let templates = self.active_templates.get();
        let mut rng = self.rng.borrow_mut();
        templates
            .choose(&mut *rng)
            .cloned()
            .ok_or(GridError::NoTemplates)
    }

    fn insert_page(&self, template: Rc<GridTemplate>, region: Region) -> PageId {
        let id = self.pages.create_page(template, region);
        self.all_pages.update(|pages| {
            let mut pages = pages.clone();
            pages.push(id);
            pages
        });
        id
    }

    fn destroy_all_pages(&self) {
        let pages = self.all_pages.get();
        for id in &pages {
            self.pages.destroy_page(*id);
        }
        self.all_pages.set(Vec::new());
        debug!(destroyed = pages.len(), "pages reset");
    }

    fn remeasure_pages(&self) {
        for id in self.all_pages.get() {
            self.pages.measure_page(id);
        }
    }

    fn page_height(&self, page: PageId) -> Option<f64> {
        self.pages.registry.borrow().get(page).map(|page| page.height())
    }

    fn extents(&self) -> (f64, f64) {
        let registry = self.pages.registry.borrow();
        let leading = self.leading_offset.get();
        self.all_pages.with(|pages| {
            pages
                .iter()
                .filter_map(|id| registry.get(*id))
                .fold((leading, 0.0), |(positive, negative), page| {
                    if page.inserted_before() {
                        (positive, negative + page.height())
                    } else {
                        (positive + page.height(), negative)
                    }
                })
        })
    }

    fn apply_touch_mode(&self, enabled: bool) {
        if enabled {
            self.can_scroll.set(false);
            self.motion.jump_to(0.0);
            self.visual_offset.set(0.0);
            let mut surface = self.pages.surface.borrow_mut();
            surface.set_scroll_translate(0.0);
            surface.set_native_scroll(true);
        } else {
            let position = self.scroll_position.get();
            self.motion.jump_to(position);
            {
                let mut surface = self.pages.surface.borrow_mut();
                surface.set_native_scroll(false);
                surface.set_scroll_translate(position);
            }
            self.can_scroll.set(true);
        }
        debug!(touch = enabled, "input mode changed");
    }

    fn cleanup(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        if let Some(id) = self.maintenance_request.take() {
            self.scheduler.cancel_frame(id);
        }
        self.motion.jump_to(self.visual_offset.get());

        let renderer = self.scroll_renderer.borrow_mut().take();
        if let Some(renderer) = renderer {
            renderer.stop();
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        for unsubscribe in subscriptions {
            unsubscribe();
        }

        self.destroy_all_pages();
        debug!("infinite grid torn down");
    }
}
