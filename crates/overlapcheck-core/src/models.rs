pub mod collection;
pub mod crs;
pub mod intersection;
pub mod params;

pub use collection::{Feature, Properties, SpatialCollection};
pub use crs::{Crs, CrsUnit};
pub use intersection::{IntersectionResult, MatchedPair};
pub use params::{CheckParams, CrsPolicy, ValidityMode, DEFAULT_MIN_AREA, DEFAULT_OPENING_DISTANCE};
