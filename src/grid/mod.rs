//! Grid content model - mosaic templates and the tiered content shuffle.
//!
//! - [`template`] - `GridTemplate`, validated rectangular cell-kind matrix
//! - [`shuffle`] - `ShuffledGridData`, importance-tiered cyclic distributor

pub mod shuffle;
pub mod template;

pub use shuffle::{shuffle_grid_data, shuffle_grid_data_with_rng, ShuffleItem, ShuffledGridData};
pub use template::{create_grid_template, GridTemplate};
