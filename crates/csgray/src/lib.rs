#![warn(missing_docs)]

//! csgray: a constructive solid geometry engine for instrument and
//! sample environment modelling.
//!
//! Objects are defined by a numeric surface algebra over analytic
//! primitives, queried for containment and ray intersection, and
//! integrated: solid angles by ray tracing, triangle sums or shape
//! formulas, and sample volumes by rasterization or quasi-Monte-Carlo
//! sampling.
//!
//! This crate re-exports the whole engine and adds factory functions
//! for the standard sample shapes.

mod shapes;

pub use shapes::{
    make_capped_cylinder, make_cone, make_cuboid, make_hollow_cylinder, make_sphere,
};

pub use csgray_csg::{
    detect_shape, parse_expression, CsgError, CsgObject, IntersectionPoint, Link, Rule,
    ShapeInfo, ShapeKind, SurfPoint, Track, TrackDirection, TriangleMesh, Triangulator,
};
pub use csgray_integrate::{
    calculate, calculate_cylinder, calculate_hollow_cylinder, calculate_with_gauge,
    monte_carlo_volume, solid_angle, solid_angle_ray_trace, solid_angle_scaled,
    solid_angle_triangulated, solid_angle_with_threshold, triangle_solid_angle,
    IntegrateError, PrimitiveTriangulator, Raster, RasterElement,
    TRIANGLE_DISPATCH_THRESHOLD,
};
pub use csgray_math::{
    orthonormal_basis, perpendicular, BoundingBox, Dir3, Point3, Tolerance, Vec3,
    DEFAULT_EXTENT, HUGE_EXTENT, TOLERANCE,
};
pub use csgray_surfaces::{axis_alignment, Cone, Cylinder, Plane, Sphere, Surface, SurfaceKind};
