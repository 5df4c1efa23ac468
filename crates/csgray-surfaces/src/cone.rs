//! Conical surface (single nappe, quadratic intersection).

use crate::{axis_alignment, quadratic_roots, Surface, SurfaceKind};
use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use std::any::Any;

/// A single-nappe cone defined by apex, unit axis direction and
/// half-angle. The nappe opens along the positive axis direction.
#[derive(Debug, Clone)]
pub struct Cone {
    id: i32,
    apex: Point3,
    axis: Vec3,
    half_angle: f64,
}

impl Cone {
    /// Create a cone. The axis is normalized; a degenerate axis is
    /// replaced by +X.
    pub fn new(id: i32, apex: Point3, axis: Vec3, half_angle: f64) -> Self {
        let axis = if axis.norm() < TOLERANCE {
            Vec3::x()
        } else {
            axis.normalize()
        };
        Self {
            id,
            apex,
            axis,
            half_angle,
        }
    }

    /// Apex point of the cone.
    pub fn apex(&self) -> &Point3 {
        &self.apex
    }

    /// Unit axis direction.
    pub fn axis(&self) -> &Vec3 {
        &self.axis
    }

    /// Half-angle in radians.
    pub fn half_angle(&self) -> f64 {
        self.half_angle
    }
}

impl Surface for Cone {
    fn id(&self) -> i32 {
        self.id
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Cone
    }

    fn signed_distance(&self, p: &Point3) -> f64 {
        let to_p = p - self.apex;
        let h = to_p.dot(&self.axis);
        let r_perp = (to_p - h * self.axis).norm();
        // Distance from the lateral surface; negative inside the nappe,
        // always positive behind the apex.
        r_perp * self.half_angle.cos() - h * self.half_angle.sin()
    }

    fn normal_at(&self, p: &Point3) -> Vec3 {
        let to_p = p - self.apex;
        let h = to_p.dot(&self.axis);
        let radial = to_p - h * self.axis;
        let r = radial.norm();
        if r < TOLERANCE {
            // On the axis (including the apex): gradient undefined
            return -self.axis;
        }
        let n = (radial / r) * self.half_angle.cos() - self.axis * self.half_angle.sin();
        n.normalize()
    }

    fn line_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let co = origin - self.apex;
        let cos2 = self.half_angle.cos().powi(2);
        let d_dot_a = direction.dot(&self.axis);
        let co_dot_a = co.dot(&self.axis);

        // ((P - apex)·axis)^2 = |P - apex|^2 cos^2(half_angle)
        let a = d_dot_a * d_dot_a - cos2 * direction.dot(direction);
        let b = 2.0 * (d_dot_a * co_dot_a - cos2 * direction.dot(&co));
        let c = co_dot_a * co_dot_a - cos2 * co.dot(&co);

        quadratic_roots(a, b, c)
            .into_iter()
            .filter(|&t| {
                // Keep the nappe opening along +axis only
                let point = origin + t * direction;
                (point - self.apex).dot(&self.axis) >= 0.0
            })
            .collect()
    }

    fn extend_bounds(&self, sign: i8, bounds: &mut BoundingBox) {
        if sign >= 0 {
            return;
        }
        let Some((axis_idx, dir)) = axis_alignment(&self.axis) else {
            return;
        };
        // The interior lies entirely on the opening side of the apex
        // plane; perpendicular extent is unbounded for an infinite cone.
        let apex = [self.apex.x, self.apex.y, self.apex.z][axis_idx];
        if dir > 0.0 {
            match axis_idx {
                0 => bounds.min.x = bounds.min.x.max(apex),
                1 => bounds.min.y = bounds.min.y.max(apex),
                _ => bounds.min.z = bounds.min.z.max(apex),
            }
        } else {
            match axis_idx {
                0 => bounds.max.x = bounds.max.x.min(apex),
                1 => bounds.max.y = bounds.max.y.min(apex),
                _ => bounds.max.z = bounds.max.z.min(apex),
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn cone45() -> Cone {
        Cone::new(1, Point3::origin(), Vec3::z(), PI / 4.0)
    }

    #[test]
    fn test_cone_side() {
        let c = cone45();
        // On the axis above the apex: inside
        assert_eq!(c.side(&Point3::new(0.0, 0.0, 5.0)), -1);
        // On the lateral surface: |radial| == height for 45°
        assert_eq!(c.side(&Point3::new(5.0, 0.0, 5.0)), 0);
        // Outside the nappe
        assert_eq!(c.side(&Point3::new(10.0, 0.0, 1.0)), 1);
        // Behind the apex is always outside
        assert_eq!(c.side(&Point3::new(0.0, 0.0, -5.0)), 1);
    }

    #[test]
    fn test_cone_line_through_axis() {
        let c = cone45();
        // Ray along +x at z=5 crosses the surface at x = ±5
        let hits = c.line_hits(&Point3::new(-20.0, 0.0, 5.0), &Vec3::x());
        assert_eq!(hits.len(), 2);
        assert!((hits[0] - 15.0).abs() < 1e-10);
        assert!((hits[1] - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_cone_wrong_nappe_filtered() {
        let c = cone45();
        let hits = c.line_hits(&Point3::new(-20.0, 0.0, -5.0), &Vec3::x());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cone_miss() {
        let c = Cone::new(1, Point3::origin(), Vec3::z(), PI / 6.0);
        let hits = c.line_hits(&Point3::new(0.0, 20.0, 10.0), &Vec3::x());
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cone_normal() {
        let c = cone45();
        let n = c.normal_at(&Point3::new(5.0, 0.0, 5.0));
        // Outward normal of the 45° cone at (5,0,5)
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize();
        assert!((n - expected).norm() < 1e-10);
        // Apex degenerate case
        let n = c.normal_at(&Point3::origin());
        assert!((n + Vec3::z()).norm() < 1e-12);
    }

    #[test]
    fn test_cone_extend_bounds() {
        let c = cone45();
        let mut bb = BoundingBox::sentinel();
        c.extend_bounds(-1, &mut bb);
        // Interior clipped at the apex plane z >= 0
        assert!(bb.min.z.abs() < 1e-12);
        assert!(bb.is_unconstrained());
    }
}
