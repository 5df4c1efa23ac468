//! Triangulated mesh cache and the triangulation collaborator seam.
//!
//! The engine never triangulates by itself: meshes arrive either from an
//! injected [`Triangulator`] or from a persisted cache as flat
//! vertex/index arrays. The engine only holds the owned, bounds-checked
//! result.

use crate::error::{CsgError, Result};
use crate::object::CsgObject;
use csgray_math::{BoundingBox, Point3};

/// An owned triangle mesh: vertex positions plus index triples.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
}

impl TriangleMesh {
    /// Create a mesh, validating that every index is in range.
    pub fn new(vertices: Vec<Point3>, triangles: Vec<[usize; 3]>) -> Result<Self> {
        for (i, tri) in triangles.iter().enumerate() {
            for &v in tri {
                if v >= vertices.len() {
                    return Err(CsgError::InvalidMesh(format!(
                        "triangle {i} references vertex {v} of {}",
                        vertices.len()
                    )));
                }
            }
        }
        Ok(Self {
            vertices,
            triangles,
        })
    }

    /// Build a mesh from flat arrays: `xyz` coordinate triples and
    /// vertex-index triples, as emitted by external mesh caches.
    pub fn from_flat(coordinates: &[f64], indices: &[u32]) -> Result<Self> {
        if coordinates.len() % 3 != 0 {
            return Err(CsgError::InvalidMesh(format!(
                "coordinate array length {} is not a multiple of 3",
                coordinates.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(CsgError::InvalidMesh(format!(
                "index array length {} is not a multiple of 3",
                indices.len()
            )));
        }
        let vertices = coordinates
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
            .collect();
        Self::new(vertices, triangles)
    }

    /// Emit the mesh as flat arrays (coordinates, indices).
    pub fn to_flat(&self) -> (Vec<f64>, Vec<u32>) {
        let mut coordinates = Vec::with_capacity(self.vertices.len() * 3);
        for v in &self.vertices {
            coordinates.extend_from_slice(&[v.x, v.y, v.z]);
        }
        let mut indices = Vec::with_capacity(self.triangles.len() * 3);
        for t in &self.triangles {
            indices.extend_from_slice(&[t[0] as u32, t[1] as u32, t[2] as u32]);
        }
        (coordinates, indices)
    }

    /// Number of triangles.
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Number of vertices.
    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// The three corner points of triangle `i`.
    pub fn triangle(&self, i: usize) -> Option<[Point3; 3]> {
        self.triangles.get(i).map(|t| {
            [
                self.vertices[t[0]],
                self.vertices[t[1]],
                self.vertices[t[2]],
            ]
        })
    }

    /// Iterate over triangle corner points.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.triangles.iter().map(|t| {
            [
                self.vertices[t[0]],
                self.vertices[t[1]],
                self.vertices[t[2]],
            ]
        })
    }

    /// Axis-aligned bounding box of the vertex set.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bb = BoundingBox::empty();
        for v in &self.vertices {
            bb.include_point(v);
        }
        bb
    }
}

/// An injected triangulation provider.
///
/// Absence of a provider is not an error: solid-angle and bounding-box
/// paths that would use a mesh fall back to ray tracing or primitive
/// parameters instead.
pub trait Triangulator: Send + Sync {
    /// Triangulate the object, or return `None` if the object's shape
    /// is not supported by this provider.
    fn triangulate(&self, object: &CsgObject) -> Option<TriangleMesh>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_round_trip() {
        let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices = [0u32, 1, 2];
        let mesh = TriangleMesh::from_flat(&coords, &indices).unwrap();
        assert_eq!(mesh.n_triangles(), 1);
        assert_eq!(mesh.n_vertices(), 3);
        let (c, i) = mesh.to_flat();
        assert_eq!(c, coords.to_vec());
        assert_eq!(i, indices.to_vec());
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let coords = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let err = TriangleMesh::from_flat(&coords, &[0, 1, 3]).unwrap_err();
        assert!(matches!(err, CsgError::InvalidMesh(_)));
    }

    #[test]
    fn test_ragged_arrays_rejected() {
        assert!(TriangleMesh::from_flat(&[0.0, 1.0], &[]).is_err());
        assert!(TriangleMesh::from_flat(&[0.0, 1.0, 2.0], &[0, 0]).is_err());
    }

    #[test]
    fn test_bounding_box() {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(-1.0, 0.0, 0.0),
                Point3::new(2.0, 3.0, 0.0),
                Point3::new(0.0, 0.0, -4.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let bb = mesh.bounding_box();
        assert!((bb.min.x + 1.0).abs() < 1e-12);
        assert!((bb.max.y - 3.0).abs() < 1e-12);
        assert!((bb.min.z + 4.0).abs() < 1e-12);
    }
}
