#![warn(missing_docs)]

//! Analytic surface primitives for the csgray CSG engine.
//!
//! Each primitive (plane, sphere, cylinder, cone) implements the
//! [`Surface`] trait: a signed implicit function, side classification,
//! outward normal, ray intersection parameters, and an axis-aligned
//! bounding contribution. Surfaces are immutable once built and shared
//! by reference across rule trees.

mod cone;
mod cylinder;
mod plane;
mod sphere;

pub use cone::Cone;
pub use cylinder::Cylinder;
pub use plane::Plane;
pub use sphere::Sphere;

use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use std::any::Any;

/// The kind of a surface (for match-based dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Sphere.
    Sphere,
    /// Cylindrical surface (infinite extent along axis).
    Cylinder,
    /// Conical surface (single nappe from the apex).
    Cone,
}

/// An analytic surface with a signed implicit function.
///
/// Sign convention: `signed_distance` is negative inside a closed
/// primitive and on the anti-normal side of a plane.
pub trait Surface: Send + Sync + std::fmt::Debug {
    /// Unique integer name of this surface.
    fn id(&self) -> i32;

    /// The kind of this surface.
    fn kind(&self) -> SurfaceKind;

    /// Signed implicit function value at `p` (negative = inside).
    fn signed_distance(&self, p: &Point3) -> f64;

    /// Outward gradient direction at `p` (unit vector).
    ///
    /// Defined everywhere, not just on the surface; degenerate points
    /// (sphere centre, cylinder axis, cone apex) substitute a default
    /// direction rather than returning NaN.
    fn normal_at(&self, p: &Point3) -> Vec3;

    /// All real intersection parameters `t` of the line
    /// `origin + t * direction` with this surface, sorted ascending.
    ///
    /// Both signs of `t` are reported; callers filter points behind the
    /// ray origin.
    fn line_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64>;

    /// Tighten `bounds` with this surface's extent for a rule leaf of
    /// the given `sign`.
    ///
    /// Only axis-aligned configurations contribute; anything else leaves
    /// the box untouched (the caller treats a still-at-sentinel box as
    /// failure).
    fn extend_bounds(&self, sign: i8, bounds: &mut BoundingBox);

    /// Side classification: -1 inside, 0 on surface (within tolerance),
    /// +1 outside.
    fn side(&self, p: &Point3) -> i8 {
        let d = self.signed_distance(p);
        if d.abs() < TOLERANCE {
            0
        } else if d < 0.0 {
            -1
        } else {
            1
        }
    }

    /// True if `p` lies on the surface within tolerance.
    fn on_surface(&self, p: &Point3) -> bool {
        self.side(p) == 0
    }

    /// Downcast to a concrete type via `Any`.
    fn as_any(&self) -> &dyn Any;
}

/// Classify a vector as (axis index, direction sign) if it is aligned
/// with a coordinate axis within tolerance.
pub fn axis_alignment(v: &Vec3) -> Option<(usize, f64)> {
    let n = v.norm();
    if n < TOLERANCE {
        return None;
    }
    let u = v / n;
    for (i, e) in [Vec3::x(), Vec3::y(), Vec3::z()].iter().enumerate() {
        let d = u.dot(e);
        if (d.abs() - 1.0).abs() < TOLERANCE {
            return Some((i, d.signum()));
        }
    }
    None
}

/// Roots of `a t^2 + b t + c = 0`, sorted ascending.
///
/// The linear and constant degenerations return one and zero roots
/// respectively; a tangent (double) root is reported twice.
pub(crate) fn quadratic_roots(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return Vec::new();
        }
        return vec![-c / b];
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }
    let sqrt_disc = discriminant.sqrt();
    let mut roots = vec![(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)];
    roots.sort_by(|x, y| x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal));
    roots
}
