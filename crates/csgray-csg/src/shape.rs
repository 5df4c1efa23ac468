//! Primitive shape tags.
//!
//! Several downstream algorithms (analytic solid angles, polar-grid
//! rasterization, bounding-box recovery) need to know when a CSG object
//! is really one of a handful of standard shapes. The kind is carried as
//! an explicit tag, either injected by the shape factory or detected
//! from the surface list, instead of being rediscovered by downcasting
//! at every call site.

use crate::rule::Rule;
use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use csgray_surfaces::{Cone, Cylinder, Plane, Sphere, Surface, SurfaceKind};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

/// The recognized standard shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Sphere.
    Sphere,
    /// Axis-aligned box.
    Cuboid,
    /// Finite solid cylinder.
    Cylinder,
    /// Finite cylindrical shell.
    HollowCylinder,
    /// Finite cone (apex plus base cap).
    Cone,
}

/// Geometric parameters of a tagged standard shape.
#[derive(Debug, Clone)]
pub struct ShapeInfo {
    /// Which standard shape this is.
    pub kind: ShapeKind,
    /// Geometric centre (apex for cones).
    pub centre: Point3,
    /// Unit symmetry axis (meaningful for cylinders and cones).
    pub axis: Vec3,
    /// Outer radius.
    pub radius: f64,
    /// Inner radius (hollow cylinders only, else 0).
    pub inner_radius: f64,
    /// Height along the axis (0 for spheres).
    pub height: f64,
    /// Corner points (cuboids only, else empty).
    pub corners: Vec<Point3>,
}

impl ShapeInfo {
    /// A sphere of the given centre and radius.
    pub fn sphere(centre: Point3, radius: f64) -> Self {
        Self {
            kind: ShapeKind::Sphere,
            centre,
            axis: Vec3::z(),
            radius,
            inner_radius: 0.0,
            height: 0.0,
            corners: Vec::new(),
        }
    }

    /// An axis-aligned cuboid covering the given box.
    pub fn cuboid(bounds: BoundingBox) -> Self {
        Self {
            kind: ShapeKind::Cuboid,
            centre: bounds.centre(),
            axis: Vec3::z(),
            radius: 0.0,
            inner_radius: 0.0,
            height: bounds.width().z,
            corners: bounds.corners().to_vec(),
        }
    }

    /// A solid cylinder centred at `centre` with the given axis, radius
    /// and height.
    pub fn cylinder(centre: Point3, axis: Vec3, radius: f64, height: f64) -> Self {
        Self {
            kind: ShapeKind::Cylinder,
            centre,
            axis: axis.normalize(),
            radius,
            inner_radius: 0.0,
            height,
            corners: Vec::new(),
        }
    }

    /// A cylindrical shell between `inner_radius` and `radius`.
    pub fn hollow_cylinder(
        centre: Point3,
        axis: Vec3,
        inner_radius: f64,
        radius: f64,
        height: f64,
    ) -> Self {
        Self {
            kind: ShapeKind::HollowCylinder,
            centre,
            axis: axis.normalize(),
            radius,
            inner_radius,
            height,
            corners: Vec::new(),
        }
    }

    /// A cone with the given apex, axis, base radius and height.
    pub fn cone(apex: Point3, axis: Vec3, radius: f64, height: f64) -> Self {
        Self {
            kind: ShapeKind::Cone,
            centre: apex,
            axis: axis.normalize(),
            radius,
            inner_radius: 0.0,
            height,
            corners: Vec::new(),
        }
    }

    /// Bounding box computed from the shape parameters alone, without
    /// triangulation. `None` when the parameters are degenerate.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self.kind {
            ShapeKind::Sphere => {
                if self.radius <= 0.0 {
                    return None;
                }
                let r = Vec3::new(self.radius, self.radius, self.radius);
                Some(BoundingBox::new(self.centre - r, self.centre + r))
            }
            ShapeKind::Cuboid => {
                let mut bb = BoundingBox::empty();
                for c in &self.corners {
                    bb.include_point(c);
                }
                (!bb.is_null()).then_some(bb)
            }
            ShapeKind::Cylinder | ShapeKind::HollowCylinder => {
                if self.radius <= 0.0 || self.height <= 0.0 {
                    return None;
                }
                // Per-axis extent of a capped cylinder about its centre:
                // axial half-height projection plus the tilted rim radius.
                let half = Vec3::new(
                    extent(self.axis.x, self.radius, self.height),
                    extent(self.axis.y, self.radius, self.height),
                    extent(self.axis.z, self.radius, self.height),
                );
                Some(BoundingBox::new(self.centre - half, self.centre + half))
            }
            ShapeKind::Cone => {
                if self.radius <= 0.0 || self.height <= 0.0 {
                    return None;
                }
                let base = self.centre + self.axis * self.height;
                let mut bb = BoundingBox::empty();
                bb.include_point(&self.centre);
                let rim = Vec3::new(
                    rim_extent(self.axis.x, self.radius),
                    rim_extent(self.axis.y, self.radius),
                    rim_extent(self.axis.z, self.radius),
                );
                bb.include_point(&(base - rim));
                bb.include_point(&(base + rim));
                Some(bb)
            }
        }
    }

    /// Closed-form volume of the tagged shape.
    pub fn analytic_volume(&self) -> f64 {
        match self.kind {
            ShapeKind::Sphere => 4.0 / 3.0 * PI * self.radius.powi(3),
            ShapeKind::Cuboid => {
                let mut bb = BoundingBox::empty();
                for c in &self.corners {
                    bb.include_point(c);
                }
                let w = bb.width();
                w.x * w.y * w.z
            }
            ShapeKind::Cylinder => PI * self.radius * self.radius * self.height,
            ShapeKind::HollowCylinder => {
                PI * (self.radius * self.radius - self.inner_radius * self.inner_radius)
                    * self.height
            }
            ShapeKind::Cone => PI * self.radius * self.radius * self.height / 3.0,
        }
    }
}

fn extent(axis_component: f64, radius: f64, height: f64) -> f64 {
    axis_component.abs() * height * 0.5 + radius * (1.0 - axis_component * axis_component).max(0.0).sqrt()
}

fn rim_extent(axis_component: f64, radius: f64) -> f64 {
    radius * (1.0 - axis_component * axis_component).max(0.0).sqrt()
}

/// Position of the plane along `axis`, relative to `origin`.
fn plane_offset_along(plane: &Plane, axis: &Vec3, origin: &Point3) -> f64 {
    let p0 = Point3::from(plane.normal() * plane.offset());
    (p0 - origin).dot(axis)
}

fn parallel(a: &Vec3, b: &Vec3) -> bool {
    (a.dot(b).abs() - 1.0).abs() < 1e-9
}

/// Leaf signs of the tree by surface number. `None` when the tree
/// contains a complement leaf or group, which disqualifies
/// primitive-shape detection.
fn leaf_signs(rule: &Rule) -> Option<HashMap<i32, i8>> {
    fn walk(rule: &Rule, signs: &mut HashMap<i32, i8>) -> bool {
        match rule {
            Rule::Surf(leaf) => {
                signs.insert(leaf.key, leaf.sign);
                true
            }
            Rule::CompObj(_) | Rule::CompGrp(_) => false,
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                walk(a, signs) && walk(b, signs)
            }
        }
    }
    let mut signs = HashMap::new();
    walk(rule, &mut signs).then_some(signs)
}

/// Inspect a populated rule tree and its surface list for one of the
/// standard shapes. Returns `None` for anything unrecognized.
pub fn detect_shape(rule: &Rule, surfaces: &[Arc<dyn Surface>]) -> Option<ShapeInfo> {
    let signs = leaf_signs(rule)?;
    let inside = |id: i32| signs.get(&id) == Some(&-1);
    let mut planes: Vec<&Plane> = Vec::new();
    let mut spheres: Vec<&Sphere> = Vec::new();
    let mut cylinders: Vec<&Cylinder> = Vec::new();
    let mut cones: Vec<&Cone> = Vec::new();
    for s in surfaces {
        match s.kind() {
            SurfaceKind::Plane => planes.push(s.as_any().downcast_ref()?),
            SurfaceKind::Sphere => spheres.push(s.as_any().downcast_ref()?),
            SurfaceKind::Cylinder => cylinders.push(s.as_any().downcast_ref()?),
            SurfaceKind::Cone => cones.push(s.as_any().downcast_ref()?),
        }
    }

    match (planes.len(), spheres.len(), cylinders.len(), cones.len()) {
        (0, 1, 0, 0) => {
            let s = spheres[0];
            inside(s.id()).then(|| ShapeInfo::sphere(*s.centre(), s.radius()))
        }
        (6, 0, 0, 0) => {
            // Six axis-aligned planes: trust the rule-tree bounds
            if planes
                .iter()
                .any(|p| csgray_surfaces::axis_alignment(p.normal()).is_none())
            {
                return None;
            }
            let mut bb = BoundingBox::sentinel();
            rule.extend_bounds(&mut bb);
            (!bb.is_unconstrained() && !bb.is_null()).then(|| ShapeInfo::cuboid(bb))
        }
        (2, 0, 1, 0) => {
            let c = cylinders[0];
            if !inside(c.id()) {
                return None;
            }
            caps_along(&planes, c.axis(), c.centre()).map(|(lo, hi)| {
                ShapeInfo::cylinder(
                    c.centre() + c.axis() * (0.5 * (lo + hi)),
                    *c.axis(),
                    c.radius(),
                    hi - lo,
                )
            })
        }
        (2, 0, 2, 0) => {
            let (a, b) = (cylinders[0], cylinders[1]);
            if !parallel(a.axis(), b.axis()) {
                return None;
            }
            let (inner, outer) = if a.radius() <= b.radius() {
                (a, b)
            } else {
                (b, a)
            };
            // Shell region: inside the outer wall, outside the inner
            if !inside(outer.id()) || signs.get(&inner.id()) != Some(&1) {
                return None;
            }
            // Parallel but offset axes make a crescent, not a shell
            let offset = inner.centre() - outer.centre();
            let radial = offset - offset.dot(outer.axis()) * outer.axis();
            if radial.norm() > TOLERANCE {
                return None;
            }
            caps_along(&planes, outer.axis(), outer.centre()).map(|(lo, hi)| {
                ShapeInfo::hollow_cylinder(
                    outer.centre() + outer.axis() * (0.5 * (lo + hi)),
                    *outer.axis(),
                    inner.radius(),
                    outer.radius(),
                    hi - lo,
                )
            })
        }
        (1, 0, 0, 1) => {
            let c = cones[0];
            if !inside(c.id()) || !parallel(planes[0].normal(), c.axis()) {
                return None;
            }
            let h = plane_offset_along(planes[0], c.axis(), c.apex());
            if h <= TOLERANCE {
                return None;
            }
            let radius = h * c.half_angle().tan();
            Some(ShapeInfo::cone(*c.apex(), *c.axis(), radius, h))
        }
        _ => None,
    }
}

/// Offsets of two cap planes along `axis` (relative to `origin`),
/// ordered low/high. `None` unless both planes are perpendicular caps.
fn caps_along(planes: &[&Plane], axis: &Vec3, origin: &Point3) -> Option<(f64, f64)> {
    if planes.len() != 2 {
        return None;
    }
    for p in planes {
        if !parallel(p.normal(), axis) {
            return None;
        }
    }
    let a = plane_offset_along(planes[0], axis, origin);
    let b = plane_offset_along(planes[1], axis, origin);
    if (a - b).abs() < TOLERANCE {
        return None;
    }
    Some((a.min(b), a.max(b)))
}
