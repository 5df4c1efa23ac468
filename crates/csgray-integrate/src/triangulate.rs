//! Triangulation of tagged primitive shapes.
//!
//! [`PrimitiveTriangulator`] is the stock [`Triangulator`] implementation:
//! it meshes objects that carry a primitive-shape tag and declines
//! everything else, leaving those objects to the ray-trace paths.

use csgray_csg::{CsgObject, ShapeInfo, ShapeKind, TriangleMesh, Triangulator};
use csgray_math::{orthonormal_basis, BoundingBox, Point3};
use std::f64::consts::PI;

/// Default number of azimuthal segments (and polar rings for spheres).
const DEFAULT_RESOLUTION: usize = 32;

/// Meshes tagged primitive shapes at a fixed angular resolution.
#[derive(Debug, Clone)]
pub struct PrimitiveTriangulator {
    resolution: usize,
}

impl PrimitiveTriangulator {
    /// A triangulator with the given angular resolution (minimum 3).
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution: resolution.max(3),
        }
    }
}

impl Default for PrimitiveTriangulator {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl Triangulator for PrimitiveTriangulator {
    fn triangulate(&self, object: &CsgObject) -> Option<TriangleMesh> {
        let info = object.shape_info()?;
        match info.kind {
            ShapeKind::Sphere => sphere_mesh(info, self.resolution),
            ShapeKind::Cuboid => cuboid_mesh(info),
            ShapeKind::Cylinder => cylinder_mesh(info, self.resolution),
            ShapeKind::Cone => cone_mesh(info, self.resolution),
            // Shells have no orientable single-surface mesh here
            ShapeKind::HollowCylinder => None,
        }
    }
}

/// Latitude/longitude sphere mesh: two polar fans plus quad strips.
fn sphere_mesh(info: &ShapeInfo, resolution: usize) -> Option<TriangleMesh> {
    let rings = resolution;
    let segments = resolution;
    let mut vertices = Vec::with_capacity((rings - 1) * segments + 2);
    vertices.push(info.centre + Point3::new(0.0, 0.0, info.radius).coords);
    for i in 1..rings {
        let theta = PI * i as f64 / rings as f64;
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..segments {
            let phi = 2.0 * PI * j as f64 / segments as f64;
            vertices.push(Point3::new(
                info.centre.x + info.radius * sin_t * phi.cos(),
                info.centre.y + info.radius * sin_t * phi.sin(),
                info.centre.z + info.radius * cos_t,
            ));
        }
    }
    let south = vertices.len();
    vertices.push(info.centre + Point3::new(0.0, 0.0, -info.radius).coords);

    let ring = |i: usize, j: usize| 1 + (i - 1) * segments + (j % segments);
    let mut triangles = Vec::with_capacity(2 * segments * (rings - 1));
    for j in 0..segments {
        triangles.push([0, ring(1, j), ring(1, j + 1)]);
        triangles.push([south, ring(rings - 1, j + 1), ring(rings - 1, j)]);
    }
    for i in 1..rings - 1 {
        for j in 0..segments {
            triangles.push([ring(i, j), ring(i + 1, j), ring(i + 1, j + 1)]);
            triangles.push([ring(i, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    TriangleMesh::new(vertices, triangles).ok()
}

/// Twelve triangles over the eight box corners.
fn cuboid_mesh(info: &ShapeInfo) -> Option<TriangleMesh> {
    let mut bounds = BoundingBox::empty();
    for corner in &info.corners {
        bounds.include_point(corner);
    }
    if bounds.is_null() {
        return None;
    }
    let vertices = bounds.corners().to_vec();
    const FACES: [[usize; 4]; 6] = [
        [0, 1, 3, 2],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 3, 7, 6],
        [0, 2, 6, 4],
        [1, 3, 7, 5],
    ];
    let mut triangles = Vec::with_capacity(12);
    for face in FACES {
        triangles.push([face[0], face[1], face[2]]);
        triangles.push([face[0], face[2], face[3]]);
    }
    TriangleMesh::new(vertices, triangles).ok()
}

/// Lateral cylinder surface without caps: two vertex rings joined by
/// quad strips.
fn cylinder_mesh(info: &ShapeInfo, resolution: usize) -> Option<TriangleMesh> {
    let (u, v) = orthonormal_basis(&info.axis);
    let half = info.axis * (0.5 * info.height);
    let mut vertices = Vec::with_capacity(2 * resolution);
    for end in [-1.0, 1.0] {
        for j in 0..resolution {
            let phi = 2.0 * PI * j as f64 / resolution as f64;
            let radial = (u * phi.cos() + v * phi.sin()) * info.radius;
            vertices.push(info.centre + half * end + radial);
        }
    }
    let mut triangles = Vec::with_capacity(2 * resolution);
    for j in 0..resolution {
        let j1 = (j + 1) % resolution;
        triangles.push([j, resolution + j, resolution + j1]);
        triangles.push([j, resolution + j1, j1]);
    }
    TriangleMesh::new(vertices, triangles).ok()
}

/// Cone: lateral fan from the apex plus a base-cap fan.
fn cone_mesh(info: &ShapeInfo, resolution: usize) -> Option<TriangleMesh> {
    let (u, v) = orthonormal_basis(&info.axis);
    let base_centre = info.centre + info.axis * info.height;
    let mut vertices = Vec::with_capacity(resolution + 2);
    vertices.push(info.centre); // apex
    for j in 0..resolution {
        let phi = 2.0 * PI * j as f64 / resolution as f64;
        let radial = (u * phi.cos() + v * phi.sin()) * info.radius;
        vertices.push(base_centre + radial);
    }
    let base = vertices.len();
    vertices.push(base_centre);

    let rim = |j: usize| 1 + (j % resolution);
    let mut triangles = Vec::with_capacity(2 * resolution);
    for j in 0..resolution {
        triangles.push([0, rim(j), rim(j + 1)]);
        triangles.push([base, rim(j + 1), rim(j)]);
    }
    TriangleMesh::new(vertices, triangles).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use csgray_math::Vec3;

    #[test]
    fn test_sphere_mesh() {
        let info = ShapeInfo::sphere(Point3::new(1.0, 0.0, 0.0), 2.0);
        let mesh = sphere_mesh(&info, 16).unwrap();
        assert_eq!(mesh.n_triangles(), 2 * 16 * 15);
        assert_eq!(mesh.n_vertices(), 15 * 16 + 2);
        for vertex in mesh.vertices() {
            let r = (vertex - Point3::new(1.0, 0.0, 0.0)).norm();
            assert!((r - 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cuboid_mesh() {
        let info = ShapeInfo::cuboid(BoundingBox::new(
            Point3::new(-1.0, -2.0, -3.0),
            Point3::new(1.0, 2.0, 3.0),
        ));
        let mesh = cuboid_mesh(&info).unwrap();
        assert_eq!(mesh.n_triangles(), 12);
        assert_eq!(mesh.n_vertices(), 8);
        let bb = mesh.bounding_box();
        assert!((bb.min.y + 2.0).abs() < 1e-12);
        assert!((bb.max.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cylinder_mesh_spans_height() {
        let info = ShapeInfo::cylinder(Point3::origin(), Vec3::z(), 1.0, 4.0);
        let mesh = cylinder_mesh(&info, 24).unwrap();
        assert_eq!(mesh.n_triangles(), 48);
        let bb = mesh.bounding_box();
        assert!((bb.min.z + 2.0).abs() < 1e-9);
        assert!((bb.max.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cone_mesh() {
        let info = ShapeInfo::cone(Point3::origin(), Vec3::z(), 1.0, 2.0);
        let mesh = cone_mesh(&info, 24).unwrap();
        assert_eq!(mesh.n_triangles(), 48);
        assert_eq!(mesh.n_vertices(), 26);
        let bb = mesh.bounding_box();
        assert!((bb.min.z).abs() < 1e-9);
        assert!((bb.max.z - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_hollow_cylinder_declined() {
        let info = ShapeInfo::hollow_cylinder(Point3::origin(), Vec3::z(), 0.5, 1.0, 2.0);
        let mut object = CsgObject::new(1);
        object.set_shape_info(info);
        let triangulator = PrimitiveTriangulator::default();
        assert!(triangulator.triangulate(&object).is_none());
    }
}
