//! Overlapcheck Core - Domain models, spatial file formats, and configuration
//!
//! This crate holds the data model shared by the intersection engine and the
//! CLI: polygon collections with their CRS, check parameters, result rows,
//! and the readers that load collections from GeoJSON and Shapefile.

pub mod config;
pub mod error;
pub mod formats;
pub mod input;
pub mod models;

pub use error::{OverlapError, Result, Side};
pub use input::{ensure_spatial_inputs, SpatialInput};
