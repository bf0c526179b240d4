//! # daybreak-grid
//!
//! Bidirectional virtualized scroll engine for endless mosaic grids.
//!
//! ## Architecture
//!
//! The grid is an endless vertical stack of pages. Each page is one instance
//! of a randomly chosen template, a small matrix of empty and content cells.
//! The engine keeps enough pages materialized above and below the viewport,
//! and hands every cell to a host renderer that fills it with content.
//!
//! ```text
//! scroll / resize / templates → state renderer → smooth motion → maintenance pass
//!                                                                   ↓
//!                                           Surface ← Page ← GridTemplate
//! ```
//!
//! Everything runs on one thread. Deferred work goes through an explicit
//! [`FrameScheduler`](state::FrameScheduler) the host ticks once per refresh.
//!
//! ## Modules
//!
//! - [`types`] - Core types (CellKind, ElementId, Bounds, InputCapabilities)
//! - [`state`] - Reactive cells, effects, frame scheduling, motion, terminal input
//! - [`grid`] - Grid templates and the tiered content shuffle
//! - [`layout`] - Surface trait and the taffy-backed in-memory surface
//! - [`engine`] - Page registry, pages, cells and the infinite grid
//! - [`config`] - Settings and templates from TOML

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod layout;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::{GridConfig, GridSettings, TemplateDef};

pub use error::{GridError, Result};

pub use engine::{
    cell_renderer, CellDisposer, CellInfo, CellRenderer, InfiniteGrid, InfiniteGridConfig,
    PageId, PageRegistry,
};

pub use grid::{
    create_grid_template, shuffle_grid_data, shuffle_grid_data_with_rng, GridTemplate,
    ShuffleItem, ShuffledGridData,
};

pub use layout::{LayoutSurface, Surface};

pub use state::{
    create_state_renderer, FrameScheduler, Observable, ReactiveCell, SmoothMotion,
    StateRenderer, SubscriberId,
};
