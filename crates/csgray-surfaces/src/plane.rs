//! Infinite plane surface.

use crate::{axis_alignment, Surface, SurfaceKind};
use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use std::any::Any;

/// An infinite plane `n · p = d` with unit normal `n`.
///
/// The implicit function is `f(p) = n · p - d`: positive on the normal
/// side, negative on the anti-normal ("inside") side.
#[derive(Debug, Clone)]
pub struct Plane {
    id: i32,
    normal: Vec3,
    distance: f64,
}

impl Plane {
    /// Create a plane from a (not necessarily unit) normal and offset
    /// `d` such that `n · p = d`.
    pub fn new(id: i32, normal: Vec3, distance: f64) -> Self {
        let n = normal.norm();
        let (normal, distance) = if n < TOLERANCE {
            // Degenerate normal: substitute the default axis
            (Vec3::x(), distance)
        } else {
            (normal / n, distance / n)
        };
        Self {
            id,
            normal,
            distance,
        }
    }

    /// Create a plane through a point with the given normal.
    pub fn through(id: i32, normal: Vec3, point: &Point3) -> Self {
        let n = if normal.norm() < TOLERANCE {
            Vec3::x()
        } else {
            normal.normalize()
        };
        Self::new(id, n, n.dot(&point.coords))
    }

    /// Axis-aligned plane `x = offset`.
    pub fn px(id: i32, offset: f64) -> Self {
        Self::new(id, Vec3::x(), offset)
    }

    /// Axis-aligned plane `y = offset`.
    pub fn py(id: i32, offset: f64) -> Self {
        Self::new(id, Vec3::y(), offset)
    }

    /// Axis-aligned plane `z = offset`.
    pub fn pz(id: i32, offset: f64) -> Self {
        Self::new(id, Vec3::z(), offset)
    }

    /// Unit normal of the plane.
    pub fn normal(&self) -> &Vec3 {
        &self.normal
    }

    /// Offset `d` in `n · p = d`.
    pub fn offset(&self) -> f64 {
        self.distance
    }
}

impl Surface for Plane {
    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Plane
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.distance
    }

    fn normal_at(&self, _p: &Point3) -> Vec3 {
        self.normal
    }

    fn line_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let denom = self.normal.dot(direction);
        if denom.abs() < 1e-12 {
            return Vec::new();
        }
        vec![(self.distance - self.normal.dot(&origin.coords)) / denom]
    }

    fn extend_bounds(&self, sign: i8, bounds: &mut BoundingBox) {
        let Some((axis, dir)) = axis_alignment(&self.normal) else {
            return;
        };
        // Leaf valid region: sign * (n·p - d) >= 0. With n = dir * e_axis
        // this is a half-space clip along one coordinate.
        let towards_positive = (f64::from(sign) * dir) > 0.0;
        let limit = self.distance * dir;
        if towards_positive {
            // p_axis >= limit
            match axis {
                0 => bounds.min.x = bounds.min.x.max(limit),
                1 => bounds.min.y = bounds.min.y.max(limit),
                _ => bounds.min.z = bounds.min.z.max(limit),
            }
        } else {
            // p_axis <= limit
            match axis {
                0 => bounds.max.x = bounds.max.x.min(limit),
                1 => bounds.max.y = bounds.max.y.min(limit),
                _ => bounds.max.z = bounds.max.z.min(limit),
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
