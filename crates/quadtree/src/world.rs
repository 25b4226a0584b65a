//! World state: the bodies being simulated and the per-step broad phase.
//!
//! The index is never updated in place. Every step builds a fresh
//! [`QuadTree`] from the current body positions, collects candidate pairs
//! from its crowded leaves and resolves them.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::body::{Body, BodyRef, Shape};
use crate::collision::resolve_pair;
use crate::config::{Config, TreeConfig};
use crate::error::SpatialError;
use crate::spatial::{Bounds, Point, QuadTree};

/// Counters reported by [`World::step`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub bodies: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub depth: u32,
    /// Leaves that were handed to the resolver.
    pub clusters: usize,
    /// Distinct body pairs sharing at least one leaf.
    pub candidate_pairs: usize,
    /// Candidate pairs that actually overlapped and were pushed apart.
    pub contacts: usize,
}

/// The simulated region and its bodies.
#[derive(Debug)]
pub struct World {
    /// Next body ID to assign.
    next_body_id: u32,
    /// All bodies by ID.
    bodies: BTreeMap<u32, Body>,
    /// World border. Origin at the top-left corner.
    pub border: Bounds,
    tree_config: TreeConfig,
}

impl World {
    /// Create an empty world covering `width` x `height` from the origin.
    pub fn new(width: f32, height: f32, tree_config: TreeConfig) -> Result<Self, SpatialError> {
        let border = Bounds::from_rect(0.0, 0.0, width, height);
        // Validate once so later per-step rebuilds cannot fail on bad input.
        QuadTree::<Shape>::new(border, tree_config)?;
        Ok(Self {
            next_body_id: 1,
            bodies: BTreeMap::new(),
            border,
            tree_config,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, SpatialError> {
        Self::new(config.world.width, config.world.height, config.tree)
    }

    /// Get the next body ID.
    fn next_id(&mut self) -> u32 {
        let id = self.next_body_id;
        self.next_body_id = self.next_body_id.wrapping_add(1);
        if self.next_body_id == 0 {
            self.next_body_id = 1; // Skip 0
        }
        id
    }

    /// Add a body and return its ID.
    pub fn add_body(&mut self, position: Vec2, radius: f32) -> u32 {
        let id = self.next_id();
        self.bodies.insert(id, Body::new(id, position, radius));
        id
    }

    /// Scatter `count` bodies uniformly over the border.
    pub fn spawn_random<R: Rng>(&mut self, rng: &mut R, count: usize, min_radius: f32, max_radius: f32) {
        let (min_radius, max_radius) = if min_radius <= max_radius {
            (min_radius, max_radius)
        } else {
            (max_radius, min_radius)
        };
        for _ in 0..count {
            let position = Vec2::new(
                rng.random_range(self.border.min_x..=self.border.max_x),
                rng.random_range(self.border.min_y..=self.border.max_y),
            );
            let radius = rng.random_range(min_radius..=max_radius);
            self.add_body(position, radius);
        }
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Body> {
        self.bodies.get(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Build a fresh index of every body at its current position.
    pub fn build_index(&self) -> Result<QuadTree<Shape>, SpatialError> {
        let mut index = QuadTree::new(self.border, self.tree_config)?;
        for body in self.bodies.values() {
            let mut point = Point::new(body.position.x, body.position.y);
            index.insert(&mut point, Some(Shape::Body(body.handle())));
        }
        Ok(index)
    }

    /// Rebuild the index, resolve every overlapping candidate pair once, and
    /// keep bodies inside the border.
    pub fn step(&mut self) -> Result<StepStats, SpatialError> {
        let index = self.build_index()?;

        // Ordered so resolution is deterministic for a given world.
        let mut pairs: BTreeSet<(u32, u32)> = BTreeSet::new();
        let clusters = index.collect_collidable_clusters(&mut |bodies: &[&BodyRef]| {
            for (i, a) in bodies.iter().enumerate() {
                for b in &bodies[i + 1..] {
                    if a.id != b.id {
                        pairs.insert((a.id.min(b.id), a.id.max(b.id)));
                    }
                }
            }
        });

        let mut contacts = 0;
        for &(a, b) in &pairs {
            if self.resolve(a, b) {
                contacts += 1;
            }
        }
        self.clamp_to_border();

        let stats = StepStats {
            bodies: self.bodies.len(),
            nodes: index.node_count(),
            leaves: index.leaf_count(),
            depth: index.depth(),
            clusters,
            candidate_pairs: pairs.len(),
            contacts,
        };
        debug!(
            nodes = stats.nodes,
            depth = stats.depth,
            clusters = stats.clusters,
            pairs = stats.candidate_pairs,
            contacts = stats.contacts,
            "world step"
        );
        Ok(stats)
    }

    fn resolve(&mut self, a: u32, b: u32) -> bool {
        let Some(mut first) = self.bodies.remove(&a) else {
            return false;
        };
        let hit = self
            .bodies
            .get_mut(&b)
            .is_some_and(|second| resolve_pair(&mut first, second));
        self.bodies.insert(a, first);
        hit
    }

    fn clamp_to_border(&mut self) {
        let border = self.border;
        for body in self.bodies.values_mut() {
            body.position.x = clamp_axis(body.position.x, border.min_x, border.max_x, body.radius);
            body.position.y = clamp_axis(body.position.y, border.min_y, border.max_y, body.radius);
        }
    }

    /// Count overlapping body pairs by checking every pair.
    pub fn overlapping_pairs_brute_force(&self) -> usize {
        let bodies: Vec<&Body> = self.bodies.values().collect();
        let mut count = 0;
        for (i, a) in bodies.iter().enumerate() {
            for b in &bodies[i + 1..] {
                if a.position.distance(b.position) < a.radius + b.radius {
                    count += 1;
                }
            }
        }
        count
    }
}

#[inline]
fn clamp_axis(value: f32, min: f32, max: f32, radius: f32) -> f32 {
    let (lo, hi) = (min + radius, max - radius);
    if lo > hi {
        (min + max) / 2.0
    } else {
        value.clamp(lo, hi)
    }
}
