//! Spatial indexing utilities.
//!
//! An adaptive point quadtree used as the collision broad phase.

mod bounds;
mod query;
mod quadtree;

pub use bounds::Bounds;
pub use query::RangeQuery;
pub use quadtree::{COORD_EPSILON, Entry, Point, QuadTree};
