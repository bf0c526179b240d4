//! Layout - host surface interface and the taffy-backed in-memory surface.
//!
//! - [`Surface`] - trait the engine drives to create, measure and place elements
//! - [`LayoutSurface`] - headless surface laying each page out as a CSS grid
//!   with Taffy

mod surface;
mod taffy_surface;

pub use surface::Surface;
pub use taffy_surface::{LayoutSurface, DEFAULT_CELL_HEIGHT};
