//! Cutting plane math.

use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Plane construction errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaneError {
    #[error("plane normal is zero or too close to zero")]
    DegenerateNormal,
}

/// An infinite plane in normal-constant form.
///
/// Points `p` on the plane satisfy `normal.dot(p) + constant == 0`.
/// The stored normal is always unit length; constructors normalize and
/// reject degenerate input, so a zero normal is unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    normal: Vec3,
    constant: f32,
}

impl Plane {
    /// Creates a plane from a normal and a constant.
    ///
    /// The normal is normalized and the constant rescaled to match, so
    /// `Plane::new(2.0 * n, 2.0 * c)` equals `Plane::new(n, c)`.
    pub fn new(normal: Vec3, constant: f32) -> Result<Self, PlaneError> {
        let length = normal.length();
        if length <= f32::EPSILON {
            return Err(PlaneError::DegenerateNormal);
        }
        Ok(Self {
            normal: normal / length,
            constant: constant / length,
        })
    }

    /// Creates a plane from a normal and a point it passes through.
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Result<Self, PlaneError> {
        let base = Self::new(normal, 0.0)?;
        Ok(Self {
            normal: base.normal,
            constant: -base.normal.dot(point),
        })
    }

    /// Unit normal of the plane.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Signed distance of the plane from the origin along the normal,
    /// negated (the `d` in `n.dot(p) + d = 0`).
    pub fn constant(&self) -> f32 {
        self.constant
    }

    /// Signed distance from `point` to the plane, positive on the side the
    /// normal points into.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// The coplanar point nearest to `point`.
    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// The coplanar point nearest to the origin.
    pub fn coplanar_point(&self) -> Vec3 {
        self.normal * -self.constant
    }

    /// The same plane with its orientation reversed.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            constant: -self.constant,
        }
    }

    /// Moves the plane by `offset` along its normal.
    pub fn translate(&mut self, offset: f32) {
        self.constant -= offset;
    }
}

/// A cutting plane shared between the caller and everything it clips.
///
/// The caller keeps one `SharedPlane` and may move it at any time, e.g.
/// animating a sweep through a model. Decorated materials and the cutter
/// hold clones of the handle and observe the same instance, so moving the
/// plane never requires a re-preparation.
#[derive(Debug, Clone)]
pub struct SharedPlane(Arc<RwLock<Plane>>);

impl SharedPlane {
    pub fn new(plane: Plane) -> Self {
        Self(Arc::new(RwLock::new(plane)))
    }

    /// Current plane value.
    pub fn get(&self) -> Plane {
        *self.0.read()
    }

    /// Replaces the plane value, visible to every holder of the handle.
    pub fn set(&self, plane: Plane) {
        *self.0.write() = plane;
    }

    /// True if both handles refer to the same plane instance.
    pub fn ptr_eq(a: &SharedPlane, b: &SharedPlane) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}
