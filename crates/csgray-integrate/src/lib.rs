#![warn(missing_docs)]

//! Integration algorithms over csgray CSG objects.
//!
//! Three solid-angle engines (ray-trace scanning, Van Oosterom triangle
//! sums, and analytic/parametric shape formulas), Cartesian and polar
//! volume rasterization for attenuation integrals, quasi-Monte-Carlo
//! volume estimation, and the stock primitive-shape triangulator.

mod error;
mod rasterize;
mod ray_trace;
mod solid_angle;
mod triangulate;
mod volume;

pub use error::{IntegrateError, Result};
pub use rasterize::{
    calculate, calculate_cylinder, calculate_hollow_cylinder, calculate_with_gauge, Raster,
    RasterElement,
};
pub use ray_trace::{solid_angle_ray_trace, DIRECTED_SCAN_RESOLUTION, FULL_SCAN_RESOLUTION};
pub use solid_angle::{
    solid_angle, solid_angle_scaled, solid_angle_triangulated, solid_angle_with_threshold,
    triangle_solid_angle, TRIANGLE_DISPATCH_THRESHOLD,
};
pub use triangulate::PrimitiveTriangulator;
pub use volume::monte_carlo_volume;
