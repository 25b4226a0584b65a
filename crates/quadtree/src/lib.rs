//! Quadtree broad phase for planar body simulations.
//!
//! The index is rebuilt from scratch every step: insert every body, then ask
//! the tree for range queries or for the clusters of bodies that share a
//! leaf so a contact resolver only compares neighbours.

pub mod body;
pub mod collision;
pub mod config;
pub mod debug;
pub mod error;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use body::{Body, BodyRef, Payload, Shape};
pub use collision::ContactResolver;
pub use config::{Config, TreeConfig};
pub use debug::{Color, Painter, Style};
pub use error::SpatialError;
pub use spatial::{Bounds, Entry, Point, QuadTree, RangeQuery};
pub use world::{StepStats, World};
