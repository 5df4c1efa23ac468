//! Infinite cylindrical surface (quadratic intersection).

use crate::{axis_alignment, quadratic_roots, Surface, SurfaceKind};
use csgray_math::{perpendicular, BoundingBox, Point3, Vec3, TOLERANCE};
use std::any::Any;

/// An infinite cylinder defined by a point on the axis, the unit axis
/// direction, and the radius.
#[derive(Debug, Clone)]
pub struct Cylinder {
    id: i32,
    centre: Point3,
    axis: Vec3,
    radius: f64,
}

impl Cylinder {
    /// Create a cylinder. The axis is normalized; a degenerate axis is
    /// replaced by +X.
    pub fn new(id: i32, centre: Point3, axis: Vec3, radius: f64) -> Self {
        let axis = if axis.norm() < TOLERANCE {
            Vec3::x()
        } else {
            axis.normalize()
        };
        Self {
            id,
            centre,
            axis,
            radius,
        }
    }

    /// Point on the cylinder axis.
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Unit axis direction.
    pub fn axis(&self) -> &Vec3 {
        &self.axis
    }

    /// Radius of the cylinder.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn radial(&self, p: &Point3) -> Vec3 {
        let to_p = p - self.centre;
        to_p - to_p.dot(&self.axis) * self.axis
    }
}

impl Surface for Cylinder {
    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Cylinder
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        self.radial(p).norm() - self.radius
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let r = self.radial(p);
        let n = r.norm();
        if n < TOLERANCE {
            // On the axis: any radial direction works
            return perpendicular(&self.axis);
        }
        r / n
    }

    fn line_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let oc = origin - self.centre;
        // Project direction and origin offset onto the plane
        // perpendicular to the axis: |oc_perp + t*d_perp|^2 = r^2
        let d_perp = direction - direction.dot(&self.axis) * self.axis;
        let oc_perp = oc - oc.dot(&self.axis) * self.axis;

        let a = d_perp.dot(&d_perp);
        if a < 1e-12 {
            // Parallel to the axis: no crossing of the lateral surface
            return Vec::new();
        }
        let b = 2.0 * oc_perp.dot(&d_perp);
        let c = oc_perp.dot(&oc_perp) - self.radius * self.radius;
        quadratic_roots(a, b, c)
    }

    fn extend_bounds(&self, sign: i8, bounds: &mut BoundingBox) {
        if sign >= 0 {
            return;
        }
        let Some((axis_idx, _)) = axis_alignment(&self.axis) else {
            return;
        };
        // Clip the two perpendicular coordinates to centre ± r; the axis
        // coordinate is unbounded for an infinite cylinder.
        let (c, r) = (self.centre, self.radius);
        if axis_idx != 0 {
            bounds.min.x = bounds.min.x.max(c.x - r);
            bounds.max.x = bounds.max.x.min(c.x + r);
        }
        if axis_idx != 1 {
            bounds.min.y = bounds.min.y.max(c.y - r);
            bounds.max.y = bounds.max.y.min(c.y + r);
        }
        if axis_idx != 2 {
            bounds.min.z = bounds.min.z.max(c.z - r);
            bounds.max.z = bounds.max.z.min(c.z + r);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
