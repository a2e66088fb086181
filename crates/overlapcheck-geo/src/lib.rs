//! Overlapcheck Geo - CRS handling, spatial join, and overlap validation
//!
//! This crate implements the intersection engine: CRS preconditions and
//! harmonization, an R-tree backed spatial join, exact intersections, and
//! the morphological opening that separates real overlaps from slivers and
//! boundary touches.

pub mod explore;
pub mod index;
pub mod intersection;
pub mod morphology;
pub mod transform;
pub mod validation;

pub use explore::{explore_pair, PairMap};
pub use intersection::{spatial_intersection_checks, OverlapChecker};
pub use transform::harmonize_crs;
pub use validation::check_crs;
