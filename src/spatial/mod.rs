//! Geometry queries over indexed feature layers.
//!
//! An R-tree prunes candidates by bounding box; exact containment and
//! distance checks then run only on those candidates.

pub mod containment;
mod index;
pub mod nearest;

pub use containment::{contains, containing_features};
pub use index::{Candidate, IndexedFeature, SpatialIndex};
pub use nearest::{nearest, NearestMatch, METERS_PER_DEGREE};
