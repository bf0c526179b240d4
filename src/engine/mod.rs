//! Grid Engine - pages, cell descriptors and the scroll windowing engine.
//!
//! The engine manages the core data structures:
//! - Registry: generational arena of pages with spatial links
//! - Page: one rendered template instance and its cell disposers
//! - Cell: descriptors handed to the host renderer
//! - InfiniteGrid: keeps pages materialized around the viewport
//!
//! # Architecture
//!
//! Pages are NOT owned by each other. They live in one arena and refer to
//! their neighbours by handle:
//!
//! ```text
//! PageId(3): backward  prev=None      next=PageId(1)
//! PageId(1): backward  prev=PageId(3) next=PageId(0)
//! PageId(0): forward   prev=PageId(1) next=PageId(2)
//! PageId(2): forward   prev=PageId(0) next=None
//! ```
//!
//! Destroying a page relinks its neighbours, and stale handles never resolve.

mod cell;
mod infinite_grid;
mod page;
mod registry;

pub use cell::{cell_renderer, CellDisposer, CellInfo, CellRenderer, UpdateHook};
pub use infinite_grid::{InfiniteGrid, InfiniteGridConfig, MAX_PAGES_PER_PASS};
pub use page::Page;
pub use registry::{PageId, PageRegistry};
