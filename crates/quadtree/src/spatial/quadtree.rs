//! Adaptive quadtree used as a collision broad phase.
//!
//! Every node covers a fixed rectangle. A leaf stores records until it runs
//! out of capacity, then splits into four quadrants and pushes its records
//! down into every quadrant that overlaps them. A record near a split line is
//! therefore reachable from more than one leaf; stored records are shared
//! `Arc` handles and carry an id so queries can report each one once.
//!
//! The tree is append-only. Callers rebuild it from scratch whenever the
//! indexed objects move.

use std::sync::Arc;

use glam::Vec2;
use tracing::trace;

use super::bounds::Bounds;
use super::query::RangeQuery;
use crate::body::Payload;
use crate::collision::ContactResolver;
use crate::config::TreeConfig;
use crate::debug::{Painter, Style};
use crate::error::SpatialError;

/// Tolerance for treating two coordinates as the same location.
pub const COORD_EPSILON: f32 = 1e-5;

/// A point handed to [`QuadTree::insert`].
///
/// `id` is filled in by the tree on first insertion and left alone afterwards.
/// A preset id shares the namespace of the ids the tree hands out (1, 2, 3,
/// ...); two records with the same id are treated as one by
/// [`QuadTree::query_range`] and [`QuadTree::len`], so preset ids must not
/// collide with assigned ones.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub id: Option<u32>,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, id: None }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// A record stored in the tree.
#[derive(Debug)]
pub struct Entry<P> {
    id: u32,
    position: Vec2,
    radius: Option<f32>,
    payload: Option<P>,
}

impl<P: Payload> Entry<P> {
    pub(crate) fn new(id: u32, position: Vec2, payload: Option<P>) -> Self {
        let radius = payload.as_ref().map(Payload::radius);
        Self {
            id,
            position,
            radius,
            payload,
        }
    }
}

impl<P> Entry<P> {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Extent read from the payload, `None` for bare points.
    #[inline]
    pub fn radius(&self) -> Option<f32> {
        self.radius
    }

    #[inline]
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}

/// One node of the quadtree; the root is just a node nobody owns.
pub struct QuadTree<P> {
    bounds: Bounds,
    config: TreeConfig,
    /// Capacity plus one per coincident record accepted here.
    effective_capacity: usize,
    /// Records held while this node is a leaf.
    points: Vec<Arc<Entry<P>>>,
    /// South-east, south-west, north-west, north-east.
    children: Option<Box<[QuadTree<P>; 4]>>,
    next_id: u32,
    level: u32,
}

impl<P: Payload> QuadTree<P> {
    /// Create a root node covering `bounds`.
    pub fn new(bounds: Bounds, config: TreeConfig) -> Result<Self, SpatialError> {
        if !bounds.is_finite() {
            return Err(SpatialError::NonFiniteRegion {
                min_x: bounds.min_x,
                min_y: bounds.min_y,
                max_x: bounds.max_x,
                max_y: bounds.max_y,
            });
        }
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return Err(SpatialError::EmptyRegion {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        config.validate()?;
        Ok(Self::node(bounds, config, 0))
    }

    /// Create a root node from a top-left corner and size with default policy.
    pub fn for_region(x: f32, y: f32, width: f32, height: f32) -> Result<Self, SpatialError> {
        Self::new(Bounds::from_rect(x, y, width, height), TreeConfig::default())
    }

    fn node(bounds: Bounds, config: TreeConfig, level: u32) -> Self {
        Self {
            bounds,
            config,
            effective_capacity: config.capacity,
            points: Vec::with_capacity(config.capacity),
            children: None,
            next_id: 1,
            level,
        }
    }

    /// Insert a point, optionally carrying a payload whose radius widens it
    /// into a disc.
    ///
    /// If `point.id` is unset it receives this node's next identifier, even
    /// when the point is then rejected. Returns false if the point lies
    /// outside this node or has non-finite coordinates or radius.
    pub fn insert(&mut self, point: &mut Point, payload: Option<P>) -> bool {
        let id = match point.id {
            Some(id) => id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                point.id = Some(id);
                id
            }
        };

        let entry = Entry::new(id, point.position(), payload);
        if !entry.position.is_finite() || entry.radius.is_some_and(|r| !r.is_finite()) {
            trace!(id, x = point.x, y = point.y, "rejecting non-finite point");
            return false;
        }
        self.insert_entry(Arc::new(entry))
    }

    fn insert_entry(&mut self, entry: Arc<Entry<P>>) -> bool {
        if !self.accepts(&entry) {
            return false;
        }

        if let Some(children) = self.children.as_deref_mut() {
            for child in children.iter_mut() {
                child.insert_entry(Arc::clone(&entry));
            }
            return true;
        }

        if self.has_coincident(&entry) {
            self.points.push(entry);
            self.effective_capacity += 1;
            return true;
        }

        self.points.push(entry);
        if self.points.len() > self.effective_capacity && self.can_subdivide() {
            self.subdivide();
        }
        true
    }

    /// A node splits only while it is wider than the floor and halving still
    /// produces smaller quadrants at f32 precision.
    #[inline]
    fn can_subdivide(&self) -> bool {
        self.bounds.min_side() > self.config.min_extent && self.bounds.is_splittable()
    }

    /// Containment test: disc overlap for records with extent, inclusive
    /// point-in-rect otherwise.
    #[inline]
    fn accepts(&self, entry: &Entry<P>) -> bool {
        match entry.radius {
            Some(radius) => self.bounds.overlaps_disc(entry.position, radius),
            None => self.bounds.contains_point(entry.position),
        }
    }

    fn has_coincident(&self, entry: &Entry<P>) -> bool {
        self.points
            .iter()
            .any(|stored| stored.position.abs_diff_eq(entry.position, COORD_EPSILON))
    }

    /// Split into four quadrants and push every held record into each one
    /// that accepts it. Children start from the base capacity.
    fn subdivide(&mut self) {
        let level = self.level + 1;
        let mut children = Box::new(
            self.bounds
                .quadrants()
                .map(|quadrant| Self::node(quadrant, self.config, level)),
        );

        trace!(
            level = self.level,
            points = self.points.len(),
            min_x = self.bounds.min_x,
            min_y = self.bounds.min_y,
            width = self.bounds.width(),
            height = self.bounds.height(),
            "subdividing node"
        );

        for entry in self.points.drain(..) {
            for child in children.iter_mut() {
                child.insert_entry(Arc::clone(&entry));
            }
        }
        self.points.shrink_to_fit();
        self.children = Some(children);
    }
}

impl<P> QuadTree<P> {
    /// Find the records inside `range` (edges inclusive).
    ///
    /// Leaves fully covered by `range` report all their records without a
    /// per-record check. A record with a radius is held by every leaf its disc
    /// overlaps, so it can be reported from a covered leaf even when its
    /// center lies outside `range`. Bare points are always inside.
    pub fn query_range(&self, range: &Bounds) -> Vec<&Entry<P>> {
        let mut found = RangeQuery::new();
        self.query_range_into(range, &mut found);
        found.into_vec()
    }

    /// Like [`query_range`](Self::query_range), accumulating into `found`.
    pub fn query_range_into<'a>(&'a self, range: &Bounds, found: &mut RangeQuery<'a, P>) {
        if !self.bounds.intersects(range) {
            return;
        }

        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.query_range_into(range, found);
            }
            return;
        }

        if range.contains_bounds(&self.bounds) {
            for entry in &self.points {
                found.push(entry);
            }
        } else {
            for entry in &self.points {
                if range.contains_point(entry.position) {
                    found.push(entry);
                }
            }
        }
    }

    /// Find every record within `radius` of `(cx, cy)` (inclusive).
    pub fn query_radius(&self, cx: f32, cy: f32, radius: f32) -> Vec<&Entry<P>> {
        let center = Vec2::new(cx, cy);
        let mut found = self.query_range(&Bounds::from_center(cx, cy, radius));
        found.retain(|entry| entry.position.distance_squared(center) <= radius * radius);
        found
    }

    /// Every distinct record stored in this subtree, in traversal order.
    pub fn entries(&self) -> Vec<&Entry<P>> {
        let mut found = RangeQuery::new();
        self.collect_entries(&mut found);
        found.into_vec()
    }

    fn collect_entries<'a>(&'a self, found: &mut RangeQuery<'a, P>) {
        match self.children.as_deref() {
            Some(children) => children.iter().for_each(|child| child.collect_entries(found)),
            None => self.points.iter().for_each(|entry| {
                found.push(entry);
            }),
        }
    }

    /// Number of distinct records stored in this subtree.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        match self.children.as_deref() {
            Some(children) => children.iter().all(QuadTree::is_empty),
            None => self.points.is_empty(),
        }
    }

    /// Draw this node's outline and then its children's.
    pub fn trace_debug<D: Painter>(&self, painter: &mut D, style: Option<&Style>) {
        let style = style.copied().unwrap_or_default();
        self.trace_with(painter, &style);
    }

    fn trace_with<D: Painter>(&self, painter: &mut D, style: &Style) {
        painter.draw_rectangle(self.bounds, style);
        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.trace_with(painter, style);
            }
        }
    }

    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    #[inline]
    pub fn config(&self) -> TreeConfig {
        self.config
    }

    #[inline]
    pub fn is_subdivided(&self) -> bool {
        self.children.is_some()
    }

    #[inline]
    pub fn effective_capacity(&self) -> usize {
        self.effective_capacity
    }

    /// Records held directly. Always empty once subdivided.
    #[inline]
    pub fn points(&self) -> &[Arc<Entry<P>>] {
        &self.points
    }

    #[inline]
    pub fn children(&self) -> Option<&[QuadTree<P>; 4]> {
        self.children.as_deref()
    }

    /// Depth of this node below the root it was created under.
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Height of this subtree; 0 for a leaf.
    pub fn depth(&self) -> u32 {
        self.children
            .as_deref()
            .map_or(0, |children| 1 + children.iter().map(QuadTree::depth).max().unwrap_or(0))
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map_or(0, |children| children.iter().map(QuadTree::node_count).sum())
    }

    pub fn leaf_count(&self) -> usize {
        self.children
            .as_deref()
            .map_or(1, |children| children.iter().map(QuadTree::leaf_count).sum())
    }
}

impl<P: Payload> QuadTree<P> {
    /// Hand the bodies of every crowded leaf to `resolver`.
    ///
    /// Each leaf holding more than one record yields one cluster made of the
    /// payloads that are bodies. Internal nodes only recurse. Returns the
    /// number of clusters dispatched.
    pub fn collect_collidable_clusters<R>(&self, resolver: &mut R) -> usize
    where
        R: ContactResolver<P::Body>,
    {
        match self.children.as_deref() {
            Some(children) => children
                .iter()
                .map(|child| child.collect_collidable_clusters(resolver))
                .sum(),
            None if self.points.len() > 1 => {
                let bodies: Vec<&P::Body> = self
                    .points
                    .iter()
                    .filter_map(|entry| entry.payload.as_ref()?.as_body())
                    .collect();
                resolver.resolve_contacts(&bodies);
                1
            }
            None => 0,
        }
    }
}

impl<P> std::fmt::Debug for QuadTree<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("bounds", &self.bounds)
            .field("level", &self.level)
            .field("points", &self.points.len())
            .field("subdivided", &self.is_subdivided())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Body, BodyRef, Shape};
    use crate::debug::RecordingPainter;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn tree(width: f32, height: f32, capacity: usize, min_extent: f32) -> QuadTree<Shape> {
        QuadTree::new(
            Bounds::from_rect(0.0, 0.0, width, height),
            TreeConfig::new(capacity, min_extent),
        )
        .unwrap()
    }

    fn insert_bare(tree: &mut QuadTree<Shape>, x: f32, y: f32) -> (bool, u32) {
        let mut point = Point::new(x, y);
        let inserted = tree.insert(&mut point, None);
        (inserted, point.id.unwrap())
    }

    fn body(id: u32, radius: f32) -> Shape {
        Shape::Body(BodyRef { id, radius })
    }

    fn ids(entries: &[&Entry<Shape>]) -> Vec<u32> {
        let mut ids: Vec<u32> = entries.iter().map(|e| e.id()).collect();
        ids.sort_unstable();
        ids
    }

    fn leaves<'a, P>(node: &'a QuadTree<P>, out: &mut Vec<&'a QuadTree<P>>) {
        match node.children() {
            Some(children) => children.iter().for_each(|child| leaves(child, out)),
            None => out.push(node),
        }
    }

    fn check_tiling<P>(node: &QuadTree<P>) {
        if let Some(children) = node.children() {
            let parent = node.bounds();
            let [se, sw, nw, ne] = children.each_ref().map(|c| c.bounds());
            assert_eq!((se.max_x, se.max_y), (parent.max_x, parent.max_y));
            assert_eq!((sw.min_x, sw.max_y), (parent.min_x, parent.max_y));
            assert_eq!((nw.min_x, nw.min_y), (parent.min_x, parent.min_y));
            assert_eq!((ne.max_x, ne.min_y), (parent.max_x, parent.min_y));
            assert_eq!(se.min_x, sw.max_x);
            assert_eq!(nw.max_x, ne.min_x);
            assert_eq!(se.min_y, ne.max_y);
            assert_eq!(sw.min_y, nw.max_y);
            children.iter().for_each(check_tiling);
        }
    }

    #[test]
    fn test_new_validates_region_and_config() {
        assert!(matches!(
            QuadTree::<Shape>::new(Bounds::from_rect(0.0, 0.0, 0.0, 10.0), TreeConfig::default()),
            Err(SpatialError::EmptyRegion { .. })
        ));
        assert!(matches!(
            QuadTree::<Shape>::new(Bounds::new(0.0, 0.0, f32::INFINITY, 1.0), TreeConfig::default()),
            Err(SpatialError::NonFiniteRegion { .. })
        ));
        assert!(matches!(
            QuadTree::<Shape>::new(Bounds::from_rect(0.0, 0.0, 1.0, 1.0), TreeConfig::new(0, 1.0)),
            Err(SpatialError::ZeroCapacity)
        ));
        assert!(QuadTree::<Shape>::for_region(0.0, 0.0, 10.0, 10.0).is_ok());
    }

    #[test]
    fn test_insert_bounds_inclusive() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);

        assert!(insert_bare(&mut tree, 0.0, 0.0).0);
        assert!(insert_bare(&mut tree, 100.0, 100.0).0);
        assert!(!insert_bare(&mut tree, 100.5, 50.0).0);
        assert!(!insert_bare(&mut tree, 50.0, -0.5).0);
        assert_eq!(tree.points().len(), 2);
    }

    #[test]
    fn test_disc_overlapping_edge_is_accepted() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);

        let mut touching = Point::new(-5.0, 50.0);
        assert!(tree.insert(&mut touching, Some(body(1, 5.0))));

        let mut outside = Point::new(-5.1, 50.0);
        assert!(!tree.insert(&mut outside, Some(body(2, 5.0))));

        let mut marker = Point::new(102.0, 102.0);
        assert!(tree.insert(&mut marker, Some(Shape::Marker { radius: 3.0 })));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_non_finite_points_rejected() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);

        assert!(!insert_bare(&mut tree, f32::NAN, 10.0).0);
        assert!(!insert_bare(&mut tree, 10.0, f32::INFINITY).0);
        let mut point = Point::new(10.0, 10.0);
        assert!(!tree.insert(&mut point, Some(Shape::Marker { radius: f32::NAN })));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_ids_assigned_once() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);

        let mut a = Point::new(1.0, 1.0);
        let mut b = Point::new(2.0, 2.0);
        tree.insert(&mut a, None);
        tree.insert(&mut b, None);
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));

        // Re-inserting the same record keeps its identity.
        tree.insert(&mut a, None);
        assert_eq!(a.id, Some(1));
        assert_eq!(tree.len(), 2);

        let mut preset = Point { x: 3.0, y: 3.0, id: Some(900) };
        tree.insert(&mut preset, None);
        assert_eq!(preset.id, Some(900));

        let (_, next) = insert_bare(&mut tree, 4.0, 4.0);
        assert_eq!(next, 3);
    }

    #[test]
    fn test_preset_id_shares_assigned_namespace() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let (_, first) = insert_bare(&mut tree, 10.0, 10.0);
        let mut preset = Point { x: 80.0, y: 80.0, id: Some(first) };
        assert!(tree.insert(&mut preset, None));

        // Both records are stored, but a shared id reads back as one record.
        assert_eq!(tree.points().len(), 2);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.query_range(&tree.bounds()).len(), 1);
    }

    #[test]
    fn test_coincident_points_never_subdivide() {
        let mut unit = tree(1.0, 1.0, 4, 1.0);
        for _ in 0..200 {
            assert!(insert_bare(&mut unit, 0.5, 0.5).0);
        }
        assert!(!unit.is_subdivided());
        assert_eq!(unit.points().len(), 200);
        assert_eq!(unit.node_count(), 1);

        let mut large = tree(100.0, 100.0, 4, 1.0);
        for _ in 0..50 {
            insert_bare(&mut large, 33.0, 33.0);
        }
        assert!(!large.is_subdivided());
        assert_eq!(large.effective_capacity(), 4 + 49);
    }

    #[test]
    fn test_effective_capacity_growth() {
        let mut duplicates = tree(100.0, 100.0, 4, 1.0);
        for _ in 0..5 {
            insert_bare(&mut duplicates, 20.0, 20.0);
        }
        assert!(!duplicates.is_subdivided());
        assert_eq!(duplicates.effective_capacity(), 8);

        // Noise below the tolerance still counts as the same location.
        insert_bare(&mut duplicates, 20.0 + COORD_EPSILON / 2.0, 20.0);
        assert_eq!(duplicates.effective_capacity(), 9);

        let mut distinct = tree(100.0, 100.0, 4, 1.0);
        for i in 0..4 {
            insert_bare(&mut distinct, 10.0 + 20.0 * i as f32, 15.0);
        }
        assert!(!distinct.is_subdivided());
        insert_bare(&mut distinct, 90.0, 90.0);
        assert!(distinct.is_subdivided());
        assert!(distinct.points().is_empty());
    }

    #[test]
    fn test_children_start_from_base_capacity() {
        let mut tree = tree(100.0, 100.0, 2, 1.0);
        insert_bare(&mut tree, 10.0, 10.0);
        insert_bare(&mut tree, 10.0, 10.0);
        assert_eq!(tree.effective_capacity(), 3);
        insert_bare(&mut tree, 80.0, 80.0);
        assert!(!tree.is_subdivided());
        insert_bare(&mut tree, 80.0, 20.0);
        assert!(tree.is_subdivided());

        let [se, sw, nw, ne] = tree.children().unwrap();
        assert_eq!(se.effective_capacity(), 2);
        assert_eq!(sw.effective_capacity(), 2);
        assert_eq!(ne.effective_capacity(), 2);
        // The north-west child saw the coincident pair itself.
        assert_eq!(nw.effective_capacity(), 3);
        assert_eq!(nw.points().len(), 2);
        assert!(sw.points().is_empty());
    }

    #[test]
    fn test_overflowing_point_is_kept() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let mut inserted = Vec::new();
        for (x, y) in [(10.0, 10.0), (90.0, 90.0), (10.0, 90.0), (90.0, 10.0), (30.0, 30.0)] {
            inserted.push(insert_bare(&mut tree, x, y).1);
        }
        assert!(tree.is_subdivided());
        assert_eq!(ids(&tree.entries()), inserted);
    }

    #[test]
    fn test_range_query_concrete_case() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let mut id_of = std::collections::HashMap::new();
        for (x, y) in [(10.0, 10.0), (90.0, 90.0), (10.0, 90.0), (90.0, 10.0), (50.0, 50.0)] {
            id_of.insert((x as i32, y as i32), insert_bare(&mut tree, x, y).1);
        }
        assert!(tree.is_subdivided());

        let found = tree.query_range(&Bounds::from_edges(0.0, 50.0, 0.0, 50.0));
        let mut expected = vec![id_of[&(10, 10)], id_of[&(50, 50)]];
        expected.sort_unstable();
        assert_eq!(ids(&found), expected);

        // The center point sits on every split line but is reported once.
        let all = tree.query_range(&tree.bounds());
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_straddling_body_reported_once() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        for (x, y) in [(10.0, 10.0), (90.0, 10.0), (10.0, 90.0), (90.0, 90.0)] {
            insert_bare(&mut tree, x, y);
        }
        let mut straddler = Point::new(48.0, 48.0);
        assert!(tree.insert(&mut straddler, Some(body(7, 5.0))));
        let id = straddler.id.unwrap();
        assert!(tree.is_subdivided());

        let mut all_leaves = Vec::new();
        leaves(&tree, &mut all_leaves);
        let holders = all_leaves
            .iter()
            .filter(|leaf| leaf.points().iter().any(|e| e.id() == id))
            .count();
        assert_eq!(holders, 4);

        let found = tree.query_range(&Bounds::from_rect(0.0, 0.0, 100.0, 100.0));
        assert_eq!(found.len(), 5);
        assert_eq!(found.iter().filter(|e| e.id() == id).count(), 1);
        let entry = found.iter().find(|e| e.id() == id).unwrap();
        assert_eq!(entry.radius(), Some(5.0));
        assert_eq!(entry.payload(), Some(&body(7, 5.0)));
    }

    #[test]
    fn test_min_extent_stops_subdivision() {
        let mut tree = tree(4.0, 4.0, 1, 2.0);
        insert_bare(&mut tree, 1.0, 1.0);
        insert_bare(&mut tree, 3.0, 3.0);
        assert!(tree.is_subdivided());

        for (x, y) in [(0.5, 0.5), (1.5, 1.5), (0.2, 1.7)] {
            insert_bare(&mut tree, x, y);
        }
        assert_eq!(tree.depth(), 1);
        let nw = &tree.children().unwrap()[2];
        assert!(!nw.is_subdivided());
        assert_eq!(nw.points().len(), 4);
        assert_eq!(nw.level(), 1);
    }

    #[test]
    fn test_subdivision_stops_at_float_precision() {
        let mut tree = tree(1024.0, 1024.0, 1, f32::MIN_POSITIVE);
        let x = 1000.0f32;
        let next = f32::from_bits(x.to_bits() + 1);
        assert!(next - x > COORD_EPSILON);

        let (first_in, first) = insert_bare(&mut tree, x, x);
        let (second_in, second) = insert_bare(&mut tree, next, next);
        assert!(first_in && second_in);
        assert!(tree.is_subdivided());
        assert!(tree.depth() < 32);
        assert_eq!(ids(&tree.entries()), vec![first, second]);

        // The two points end up sharing a leaf that can no longer split.
        let mut all_leaves = Vec::new();
        leaves(&tree, &mut all_leaves);
        let shared = all_leaves
            .iter()
            .find(|leaf| leaf.points().len() == 2)
            .unwrap();
        assert!(!shared.bounds().is_splittable());
        check_tiling(&tree);
    }

    #[test]
    fn test_covered_leaf_reports_disc_with_center_outside() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let mut marker = Point::new(-3.0, 50.0);
        assert!(tree.insert(&mut marker, Some(Shape::Marker { radius: 5.0 })));
        let (_, inside) = insert_bare(&mut tree, 20.0, 20.0);

        let covering = tree.query_range(&Bounds::from_rect(0.0, 0.0, 100.0, 100.0));
        assert_eq!(ids(&covering), vec![marker.id.unwrap(), inside]);

        // Partially covered leaves test the center itself.
        let partial = tree.query_range(&Bounds::from_rect(0.0, 0.0, 50.0, 60.0));
        assert_eq!(ids(&partial), vec![inside]);
    }

    #[test]
    fn test_quadrants_tile_parent() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tree = tree(97.3, 61.9, 2, 0.5);
        for _ in 0..400 {
            let x = rng.random_range(0.0..97.3);
            let y = rng.random_range(0.0..61.9);
            insert_bare(&mut tree, x, y);
        }
        assert!(tree.depth() >= 2);
        check_tiling(&tree);
        let internal = tree.node_count() - tree.leaf_count();
        assert_eq!(tree.node_count(), 1 + 4 * internal);
    }

    #[test]
    fn test_accepted_points_satisfy_containment() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut tree = tree(100.0, 100.0, 3, 1.0);
        for i in 0..300 {
            let mut point = Point::new(rng.random_range(-20.0..120.0), rng.random_range(-20.0..120.0));
            let radius = rng.random_range(0.0..6.0);
            let inside = tree.bounds().overlaps_disc(point.position(), radius);
            assert_eq!(tree.insert(&mut point, Some(body(i, radius))), inside);
        }

        let mut all_leaves = Vec::new();
        leaves(&tree, &mut all_leaves);
        for leaf in all_leaves {
            for entry in leaf.points() {
                assert!(leaf.bounds().overlaps_disc(entry.position(), entry.radius().unwrap()));
            }
        }
    }

    #[test]
    fn test_range_query_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let mut points = Vec::new();
        for _ in 0..500 {
            let mut point = Point::new(rng.random_range(0.0..100.0), rng.random_range(0.0..100.0));
            assert!(tree.insert(&mut point, None));
            points.push(point);
        }

        for _ in 0..50 {
            let left = rng.random_range(-10.0..100.0);
            let top = rng.random_range(-10.0..100.0);
            let range = Bounds::from_rect(left, top, rng.random_range(0.0..60.0), rng.random_range(0.0..60.0));

            let mut expected: Vec<u32> = points
                .iter()
                .filter(|p| range.contains_point(p.position()))
                .map(|p| p.id.unwrap())
                .collect();
            expected.sort_unstable();
            assert_eq!(ids(&tree.query_range(&range)), expected);
        }
    }

    #[test]
    fn test_query_range_into_accumulates() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        for (x, y) in [(10.0, 10.0), (20.0, 20.0), (80.0, 80.0)] {
            insert_bare(&mut tree, x, y);
        }

        let mut found = RangeQuery::new();
        tree.query_range_into(&Bounds::from_rect(0.0, 0.0, 25.0, 25.0), &mut found);
        tree.query_range_into(&Bounds::from_rect(0.0, 0.0, 100.0, 100.0), &mut found);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_query_radius() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        let (_, near) = insert_bare(&mut tree, 53.0, 54.0);
        insert_bare(&mut tree, 57.0, 57.0);
        insert_bare(&mut tree, 10.0, 10.0);

        let found = tree.query_radius(50.0, 50.0, 5.0);
        assert_eq!(ids(&found), vec![near]);
    }

    #[test]
    fn test_cluster_filters_non_bodies() {
        let mut tree = tree(100.0, 100.0, 4, 1.0);
        tree.insert(&mut Point::new(10.0, 10.0), Some(body(1, 1.0)));
        tree.insert(&mut Point::new(12.0, 10.0), Some(body(2, 1.0)));
        tree.insert(&mut Point::new(14.0, 10.0), None);

        let mut clusters: Vec<Vec<u32>> = Vec::new();
        let dispatched =
            tree.collect_collidable_clusters(&mut |bodies: &[&BodyRef]| clusters.push(bodies.iter().map(|b| b.id).collect()));
        assert_eq!(dispatched, 1);
        assert_eq!(clusters, vec![vec![1, 2]]);
    }

    #[test]
    fn test_clusters_come_from_leaves_only() {
        let mut tree = tree(100.0, 100.0, 2, 1.0);
        tree.insert(&mut Point::new(10.0, 10.0), Some(body(1, 1.0)));
        tree.insert(&mut Point::new(20.0, 20.0), Some(body(2, 1.0)));
        tree.insert(&mut Point::new(80.0, 80.0), Some(body(3, 1.0)));
        tree.insert(&mut Point::new(85.0, 15.0), Some(Shape::Marker { radius: 1.0 }));
        assert!(tree.is_subdivided());

        let mut clusters: Vec<Vec<u32>> = Vec::new();
        let dispatched =
            tree.collect_collidable_clusters(&mut |bodies: &[&BodyRef]| clusters.push(bodies.iter().map(|b| b.id).collect()));

        let mut all_leaves = Vec::new();
        leaves(&tree, &mut all_leaves);
        let crowded = all_leaves.iter().filter(|leaf| leaf.points().len() > 1).count();
        assert_eq!(dispatched, crowded);
        assert_eq!(clusters, vec![vec![1, 2]]);
    }

    #[test]
    fn test_clusters_with_body_payloads() {
        let mut tree: QuadTree<Body> = QuadTree::for_region(0.0, 0.0, 10.0, 10.0).unwrap();
        tree.insert(&mut Point::new(1.0, 1.0), Some(Body::new(4, Vec2::new(1.0, 1.0), 1.0)));
        tree.insert(&mut Point::new(2.0, 1.0), Some(Body::new(5, Vec2::new(2.0, 1.0), 1.0)));

        let mut total_mass = 0.0;
        tree.collect_collidable_clusters(&mut |bodies: &[&Body]| {
            total_mass += bodies.iter().map(|b| b.mass).sum::<f32>();
        });
        assert!((total_mass - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_trace_debug_draws_every_node() {
        let mut tree = tree(100.0, 100.0, 1, 1.0);
        for (x, y) in [(10.0, 10.0), (90.0, 90.0), (60.0, 70.0)] {
            insert_bare(&mut tree, x, y);
        }

        let mut painter = RecordingPainter::default();
        tree.trace_debug(&mut painter, None);
        assert_eq!(painter.rectangles.len(), tree.node_count());
        assert_eq!(painter.rectangles[0].0, tree.bounds());
        assert_eq!(painter.rectangles[0].1, Style::default());

        let style = Style {
            line_width: 3.0,
            ..Style::default()
        };
        let mut styled = RecordingPainter::default();
        tree.trace_debug(&mut styled, Some(&style));
        assert!(styled.rectangles.iter().all(|(_, s)| *s == style));
    }

    #[test]
    fn test_concurrent_readers() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut tree = tree(200.0, 200.0, 4, 1.0);
        for i in 0..1000 {
            let mut point = Point::new(rng.random_range(0.0..200.0), rng.random_range(0.0..200.0));
            tree.insert(&mut point, Some(body(i, rng.random_range(0.5..3.0))));
        }

        let tree = &tree;
        let expected = tree.query_range(&Bounds::from_rect(0.0, 0.0, 100.0, 100.0)).len();
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(move || tree.query_range(&Bounds::from_rect(0.0, 0.0, 100.0, 100.0)).len()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
