//! Contact resolution collaborators.
//!
//! The index only localizes candidate bodies into clusters; whatever consumes
//! a cluster implements [`ContactResolver`]. This module also carries the
//! small separation routine the [`World`](crate::World) uses.

use glam::Vec2;

use crate::body::Body;

/// Consumer of body clusters produced by
/// [`QuadTree::collect_collidable_clusters`](crate::QuadTree::collect_collidable_clusters).
pub trait ContactResolver<B: ?Sized> {
    fn resolve_contacts(&mut self, bodies: &[&B]);
}

impl<B: ?Sized, F> ContactResolver<B> for F
where
    F: FnMut(&[&B]),
{
    #[inline]
    fn resolve_contacts(&mut self, bodies: &[&B]) {
        self(bodies)
    }
}

/// Result of checking collision between two bodies.
#[derive(Debug)]
pub struct CollisionResult {
    /// First body ID
    pub body_id: u32,
    /// Second body ID
    pub check_id: u32,
    /// Combined radius of both bodies
    pub r: f32,
    /// Distance X component
    pub dx: f32,
    /// Distance Y component
    pub dy: f32,
    /// Actual distance
    pub d: f32,
    /// Penetration depth (zero when apart)
    pub overlap: f32,
}

impl CollisionResult {
    /// Check if bodies are actually overlapping.
    pub fn is_colliding(&self) -> bool {
        self.d < self.r
    }
}

/// Check collision between two circular bodies.
#[inline]
pub fn check_body_collision(
    body_pos: Vec2,
    body_radius: f32,
    check_pos: Vec2,
    check_radius: f32,
    body_id: u32,
    check_id: u32,
) -> CollisionResult {
    let r = body_radius + check_radius;
    let dx = check_pos.x - body_pos.x;
    let dy = check_pos.y - body_pos.y;
    let d = (dx * dx + dy * dy).sqrt();

    CollisionResult {
        body_id,
        check_id,
        r,
        dx,
        dy,
        d,
        overlap: (r - d).max(0.0),
    }
}

/// Push two overlapping bodies apart along their center line.
///
/// Each body moves by a share of the overlap inversely proportional to its
/// mass. Coincident centers are separated along +x. Returns whether the pair
/// was in contact.
pub fn resolve_pair(a: &mut Body, b: &mut Body) -> bool {
    let collision = check_body_collision(a.position, a.radius, b.position, b.radius, a.id, b.id);
    if !collision.is_colliding() {
        return false;
    }

    let normal = if collision.d > 0.0 {
        Vec2::new(collision.dx, collision.dy) / collision.d
    } else {
        Vec2::X
    };

    let total_mass = a.mass + b.mass;
    let (share_a, share_b) = if total_mass > 0.0 {
        (b.mass / total_mass, a.mass / total_mass)
    } else {
        (0.5, 0.5)
    };

    a.position -= normal * collision.overlap * share_a;
    b.position += normal * collision.overlap * share_b;
    true
}
