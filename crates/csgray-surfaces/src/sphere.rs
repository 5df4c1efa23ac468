//! Sphere surface (quadratic intersection).

use crate::{quadratic_roots, Surface, SurfaceKind};
use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use std::any::Any;

/// A sphere defined by centre and radius.
#[derive(Debug, Clone)]
pub struct Sphere {
    id: i32,
    centre: Point3,
    radius: f64,
}

impl Sphere {
    /// Create a sphere from centre and radius.
    pub fn new(id: i32, centre: Point3, radius: f64) -> Self {
        Self { id, centre, radius }
    }

    /// Centre of the sphere.
    pub fn centre(&self) -> &Point3 {
        &self.centre
    }

    /// Radius of the sphere.
    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Surface for Sphere {
    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Sphere
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.centre).norm() - self.radius
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let r = p - self.centre;
        let n = r.norm();
        if n < TOLERANCE {
            // Centre point: gradient undefined, substitute default axis
            return Vec3::x();
        }
        r / n
    }

    fn line_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let oc = origin - self.centre;
        // Quadratic: |oc + t*d|^2 = r^2
        let a = direction.dot(direction);
        let b = 2.0 * oc.dot(direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        quadratic_roots(a, b, c)
    }

    fn extend_bounds(&self, sign: i8, bounds: &mut BoundingBox) {
        // Only the interior leaf is bounded; "outside the sphere" is
        // unbounded and contributes nothing.
        if sign >= 0 {
            return;
        }
        let (c, r) = (self.centre, self.radius);
        bounds.min.x = bounds.min.x.max(c.x - r);
        bounds.min.y = bounds.min.y.max(c.y - r);
        bounds.min.z = bounds.min.z.max(c.z - r);
        bounds.max.x = bounds.max.x.min(c.x + r);
        bounds.max.y = bounds.max.y.min(c.y + r);
        bounds.max.z = bounds.max.z.min(c.z + r);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_side() {
        let s = Sphere::new(41, Point3::origin(), 5.0);
        assert_eq!(s.side(&Point3::origin()), -1);
        assert_eq!(s.side(&Point3::new(5.0, 0.0, 0.0)), 0);
        assert_eq!(s.side(&Point3::new(6.0, 0.0, 0.0)), 1);
    }

    #[test]
    fn test_sphere_offset_centre() {
        // Sphere centred at (5,0,0), radius 5: origin lies on the surface
        let s = Sphere::new(11, Point3::new(5.0, 0.0, 0.0), 5.0);
        assert_eq!(s.side(&Point3::origin()), 0);
        assert_eq!(s.side(&Point3::new(5.0, 0.0, 0.0)), -1);
    }

    #[test]
    fn test_sphere_normal() {
        let s = Sphere::new(1, Point3::origin(), 2.0);
        let n = s.normal_at(&Point3::new(0.0, 2.0, 0.0));
        assert!((n - Vec3::y()).norm() < 1e-12);
        // Degenerate: centre point gets the default axis
        let n = s.normal_at(&Point3::origin());
        assert!((n - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_line_through_centre() {
        let s = Sphere::new(1, Point3::origin(), 5.0);
        let hits = s.line_hits(&Point3::new(-10.0, 0.0, 0.0), &Vec3::x());
        assert_eq!(hits.len(), 2);
        assert!((hits[0] - 5.0).abs() < 1e-10);
        assert!((hits[1] - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_line_miss() {
        let s = Sphere::new(1, Point3::origin(), 5.0);
        let hits = s.line_hits(&Point3::new(-10.0, 10.0, 0.0), &Vec3::x());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_line_from_inside_reports_both_signs() {
        let s = Sphere::new(1, Point3::origin(), 5.0);
        let hits = s.line_hits(&Point3::origin(), &Vec3::x());
        assert_eq!(hits.len(), 2);
        assert!((hits[0] + 5.0).abs() < 1e-10);
        assert!((hits[1] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_sphere_extend_bounds() {
        let s = Sphere::new(1, Point3::new(1.0, 0.0, 0.0), 2.0);
        let mut bb = BoundingBox::sentinel();
        s.extend_bounds(-1, &mut bb);
        assert!((bb.min.x + 1.0).abs() < 1e-12);
        assert!((bb.max.x - 3.0).abs() < 1e-12);
        assert!((bb.max.y - 2.0).abs() < 1e-12);
        // Outside-sphere leaf contributes nothing
        let mut bb = BoundingBox::sentinel();
        s.extend_bounds(1, &mut bb);
        assert!(bb.is_unconstrained());
    }
}
