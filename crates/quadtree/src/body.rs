//! Payloads attached to indexed points, and the physical body model.

use glam::Vec2;

// Mass = radius² / 100
const MASS_DIVISOR: f32 = 100.0;

/// Something a point record can carry.
///
/// The radius widens the record's containment test into a disc test. Payloads
/// that are physical bodies expose them through [`Payload::as_body`] so the
/// index can hand them to a contact resolver.
pub trait Payload {
    /// Body type forwarded to collision dispatch.
    type Body;

    /// Spatial extent around the point.
    fn radius(&self) -> f32;

    /// The physical body behind this payload, if it is one.
    fn as_body(&self) -> Option<&Self::Body>;
}

/// A simulated circular body.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Unique body ID within its world.
    pub id: u32,
    /// Position in world coordinates.
    pub position: Vec2,
    pub radius: f32,
    /// Mass (radius² / 100).
    pub mass: f32,
}

impl Body {
    pub fn new(id: u32, position: Vec2, radius: f32) -> Self {
        Self {
            id,
            position,
            radius,
            mass: radius_to_mass(radius),
        }
    }

    /// Set the radius and update mass.
    #[inline]
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
        self.mass = radius_to_mass(radius);
    }

    /// Lightweight handle stored in the index in place of the body.
    #[inline]
    pub fn handle(&self) -> BodyRef {
        BodyRef {
            id: self.id,
            radius: self.radius,
        }
    }
}

#[inline]
pub fn radius_to_mass(radius: f32) -> f32 {
    (radius * radius) / MASS_DIVISOR
}

/// Copyable reference to a [`Body`] owned elsewhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRef {
    pub id: u32,
    pub radius: f32,
}

/// Payload kinds placed in a world index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A collidable body.
    Body(BodyRef),
    /// A non-physical marker with extent (sensor, decoration, probe).
    Marker { radius: f32 },
}

impl Payload for Shape {
    type Body = BodyRef;

    #[inline]
    fn radius(&self) -> f32 {
        match self {
            Shape::Body(body) => body.radius,
            Shape::Marker { radius } => *radius,
        }
    }

    #[inline]
    fn as_body(&self) -> Option<&BodyRef> {
        match self {
            Shape::Body(body) => Some(body),
            Shape::Marker { .. } => None,
        }
    }
}

impl Payload for Body {
    type Body = Body;

    #[inline]
    fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn as_body(&self) -> Option<&Body> {
        Some(self)
    }
}
