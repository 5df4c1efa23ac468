#![warn(missing_docs)]

//! Math types for the csgray CSG engine.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! constructive solid geometry: points, vectors, directions, tolerance
//! constants, and the axis-aligned bounding box used throughout the
//! engine.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default engine tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Linear tolerance used by surface side/on-surface classification.
pub const TOLERANCE: f64 = Tolerance::DEFAULT.linear;

/// Sentinel half-extent marking an unconstrained bounding-box face.
pub const HUGE_EXTENT: f64 = 1e8;

/// Half-extent of the last-resort default bounding box.
pub const DEFAULT_EXTENT: f64 = 100.0;

/// A unit vector perpendicular to `v`.
///
/// If `v` has (near-)zero norm the choice is undefined; a default
/// perpendicular axis (+X) is substituted rather than propagating NaN.
pub fn perpendicular(v: &Vec3) -> Vec3 {
    if v.norm() < TOLERANCE {
        return Vec3::x();
    }
    // Cross with whichever basis vector is least aligned with v
    let pick = if v.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    let p = v.cross(&pick);
    if p.norm() < TOLERANCE {
        return Vec3::x();
    }
    p.normalize()
}

/// Build a right-handed orthonormal basis `(u, v)` perpendicular to `w`.
///
/// `w` need not be normalized. Degenerate input falls back to the
/// standard basis.
pub fn orthonormal_basis(w: &Vec3) -> (Vec3, Vec3) {
    let u = perpendicular(w);
    if w.norm() < TOLERANCE {
        return (Vec3::x(), Vec3::y());
    }
    let v = w.normalize().cross(&u);
    (u, v)
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox {
    /// Create a bounding box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create the sentinel box: every face at the huge unconstrained extent.
    pub fn sentinel() -> Self {
        Self {
            min: Point3::new(-HUGE_EXTENT, -HUGE_EXTENT, -HUGE_EXTENT),
            max: Point3::new(HUGE_EXTENT, HUGE_EXTENT, HUGE_EXTENT),
        }
    }

    /// Create the fixed last-resort box at ±100 units.
    pub fn fallback() -> Self {
        Self {
            min: Point3::new(-DEFAULT_EXTENT, -DEFAULT_EXTENT, -DEFAULT_EXTENT),
            max: Point3::new(DEFAULT_EXTENT, DEFAULT_EXTENT, DEFAULT_EXTENT),
        }
    }

    /// True if the box is inverted on any axis (never expanded).
    pub fn is_null(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// True if any face is still at (or beyond) the sentinel extent,
    /// i.e. the box never received a constraint on that face.
    pub fn is_unconstrained(&self) -> bool {
        let lim = 0.99 * HUGE_EXTENT;
        self.min.x <= -lim
            || self.min.y <= -lim
            || self.min.z <= -lim
            || self.max.x >= lim
            || self.max.y >= lim
            || self.max.z >= lim
    }

    /// Centre point of the box.
    pub fn centre(&self) -> Point3 {
        Point3::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
            0.5 * (self.min.z + self.max.z),
        )
    }

    /// Full widths along each axis.
    pub fn width(&self) -> Vec3 {
        self.max - self.min
    }

    /// Test containment, with faces counting as inside.
    pub fn contains(&self, p: &Point3) -> bool {
        !self.is_null()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grow the box by a margin in all directions.
    pub fn expand(&mut self, margin: f64) {
        self.min.x -= margin;
        self.min.y -= margin;
        self.min.z -= margin;
        self.max.x += margin;
        self.max.y += margin;
        self.max.z += margin;
    }

    /// The envelope (union) of two boxes.
    pub fn enclose(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// The eight corner points of the box.
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Half-angle of the cone from `observer` subtending the whole box.
    ///
    /// Measured around the observer-to-centre direction; returns π when the
    /// observer lies inside the box (no useful tightening possible).
    pub fn angular_radius(&self, observer: &Point3) -> f64 {
        if self.contains(observer) {
            return std::f64::consts::PI;
        }
        let axis = self.centre() - observer;
        if axis.norm() < TOLERANCE {
            return std::f64::consts::PI;
        }
        let axis = axis.normalize();
        let mut worst: f64 = 0.0;
        for corner in self.corners() {
            let to_corner = corner - observer;
            if to_corner.norm() < TOLERANCE {
                return std::f64::consts::PI;
            }
            let cos = (to_corner.normalize().dot(&axis)).clamp(-1.0, 1.0);
            worst = worst.max(cos.acos());
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_perpendicular_is_perpendicular() {
        for v in [
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::x(),
            Vec3::y(),
            Vec3::z(),
            Vec3::new(-0.3, 0.0, 0.1),
        ] {
            let p = perpendicular(&v);
            assert!((p.norm() - 1.0).abs() < 1e-12);
            assert!(v.dot(&p).abs() < 1e-9);
        }
    }

    #[test]
    fn test_perpendicular_degenerate_input() {
        let p = perpendicular(&Vec3::zeros());
        assert!((p - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_orthonormal_basis() {
        let w = Vec3::new(0.0, 0.0, 2.0);
        let (u, v) = orthonormal_basis(&w);
        assert!(u.dot(&v).abs() < 1e-12);
        assert!(u.dot(&w).abs() < 1e-12);
        assert!(v.dot(&w).abs() < 1e-12);
        // Right-handed: u × v points along w
        assert!(u.cross(&v).dot(&w) > 0.0);
    }

    #[test]
    fn test_bounding_box_contains() {
        let bb = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert!(bb.contains(&Point3::origin()));
        assert!(bb.contains(&Point3::new(1.0, 1.0, 1.0)));
        assert!(!bb.contains(&Point3::new(1.1, 0.0, 0.0)));
    }

    #[test]
    fn test_bounding_box_include_point() {
        let mut bb = BoundingBox::empty();
        assert!(bb.is_null());
        bb.include_point(&Point3::new(1.0, 2.0, 3.0));
        bb.include_point(&Point3::new(-1.0, 0.0, 0.0));
        assert!(!bb.is_null());
        assert!((bb.min.x + 1.0).abs() < 1e-12);
        assert!((bb.max.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_sentinel_unconstrained() {
        let mut bb = BoundingBox::sentinel();
        assert!(bb.is_unconstrained());
        bb.min = Point3::new(-1.0, -1.0, -1.0);
        assert!(bb.is_unconstrained());
        bb.max = Point3::new(1.0, 1.0, 1.0);
        assert!(!bb.is_unconstrained());
    }

    #[test]
    fn test_angular_radius_inside_is_pi() {
        let bb = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        assert!((bb.angular_radius(&Point3::origin()) - PI).abs() < 1e-12);
    }

    #[test]
    fn test_angular_radius_far_observer() {
        let bb = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        // From far away on the x axis the box subtends a small cone
        let theta = bb.angular_radius(&Point3::new(100.0, 0.0, 0.0));
        assert!(theta > 0.0 && theta < 0.05);
        // Moving closer widens the cone
        let closer = bb.angular_radius(&Point3::new(3.0, 0.0, 0.0));
        assert!(closer > theta);
    }

    #[test]
    fn test_enclose() {
        let a = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = BoundingBox::new(Point3::new(-2.0, 0.5, 0.0), Point3::new(0.5, 3.0, 1.0));
        let e = a.enclose(&b);
        assert!((e.min.x + 2.0).abs() < 1e-12);
        assert!((e.max.y - 3.0).abs() < 1e-12);
    }
}
