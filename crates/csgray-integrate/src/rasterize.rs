//! Volume rasterization for attenuation integrals.
//!
//! Decomposes an object (or a gauge region inside it) into small volume
//! elements, each carrying its position, its volume and `l1`: the path
//! length through the sample that the incident beam travels before
//! reaching the element. Cartesian grids serve arbitrary objects; a
//! polar grid with sector counts growing linearly outward serves
//! cylindrical samples with near-equal element volumes.

use crate::error::{IntegrateError, Result};
use csgray_csg::{CsgObject, ShapeKind, Track};
use csgray_math::{orthonormal_basis, Point3, Vec3};
use std::f64::consts::PI;

/// One volume element of a rasterized object.
#[derive(Debug, Clone, Copy)]
pub struct RasterElement {
    /// Centre of the element.
    pub position: Point3,
    /// Volume of the element.
    pub volume: f64,
    /// Beam path length through the sample upstream of the element.
    pub l1: f64,
}

/// A rasterized object: volume elements plus their summed volume.
#[derive(Debug, Clone)]
pub struct Raster {
    elements: Vec<RasterElement>,
    total_volume: f64,
}

impl Raster {
    /// The kept volume elements.
    pub fn elements(&self) -> &[RasterElement] {
        &self.elements
    }

    /// Summed volume of the kept elements.
    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    /// Number of kept elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True when no element was kept.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Beam path length through `sample` upstream of `position`, found by
/// tracing a track backwards against the beam.
fn upstream_path(sample: &CsgObject, position: &Point3, beam: &Vec3) -> f64 {
    let mut track = Track::new(*position, -beam);
    sample.intercept_surface(&mut track);
    track.total_distance_inside()
}

/// Rasterize `sample` onto a Cartesian grid of cubes with the given edge
/// length, computing `l1` against the sample itself.
pub fn calculate(beam: &Vec3, sample: &CsgObject, cube_size: f64) -> Result<Raster> {
    calculate_with_gauge(beam, sample, sample, cube_size)
}

/// Rasterize the `gauge` region onto a Cartesian grid of cubes, keeping
/// elements valid in both the gauge and the `sample`, with `l1` computed
/// against the sample.
pub fn calculate_with_gauge(
    beam: &Vec3,
    gauge: &CsgObject,
    sample: &CsgObject,
    cube_size: f64,
) -> Result<Raster> {
    let bounds = gauge
        .try_bounding_box()
        .ok_or(IntegrateError::UnboundedObject(gauge.name()))?;
    let width = bounds.width();
    let steps = |w: f64| ((w / cube_size).ceil() as usize).max(1);
    let (nx, ny, nz) = (steps(width.x), steps(width.y), steps(width.z));
    let volume = cube_size.powi(3);

    let mut elements = Vec::new();
    let mut total_volume = 0.0;
    for ix in 0..nx {
        let x = bounds.min.x + (ix as f64 + 0.5) * cube_size;
        for iy in 0..ny {
            let y = bounds.min.y + (iy as f64 + 0.5) * cube_size;
            for iz in 0..nz {
                let z = bounds.min.z + (iz as f64 + 0.5) * cube_size;
                let position = Point3::new(x, y, z);
                if !gauge.is_valid(&position) || !sample.is_valid(&position) {
                    continue;
                }
                let l1 = upstream_path(sample, &position, beam);
                if l1 <= 0.0 {
                    continue;
                }
                elements.push(RasterElement {
                    position,
                    volume,
                    l1,
                });
                total_volume += volume;
            }
        }
    }
    if elements.is_empty() {
        return Err(IntegrateError::EmptyRaster(sample.name()));
    }
    Ok(Raster {
        elements,
        total_volume,
    })
}

/// Rasterize a cylindrical sample onto a polar grid of `n_slices` axial
/// slices and `n_annuli` annuli. Annulus `k` is cut into `6 (k + 1)`
/// sectors, which keeps element volumes nearly equal; a full grid holds
/// `3 * n_slices * n_annuli * (n_annuli + 1)` elements.
pub fn calculate_cylinder(
    beam: &Vec3,
    sample: &CsgObject,
    n_slices: usize,
    n_annuli: usize,
) -> Result<Raster> {
    let info = sample
        .shape_info()
        .filter(|i| i.kind == ShapeKind::Cylinder)
        .ok_or(IntegrateError::UnsupportedShape(sample.name(), "cylinder"))?;
    polar_raster(
        beam, sample, &info.centre, &info.axis, 0.0, info.radius, info.height, n_slices, n_annuli,
    )
}

/// Polar-grid rasterization of a hollow cylindrical sample; annuli span
/// the shell between the inner and outer radii.
pub fn calculate_hollow_cylinder(
    beam: &Vec3,
    sample: &CsgObject,
    n_slices: usize,
    n_annuli: usize,
) -> Result<Raster> {
    let info = sample
        .shape_info()
        .filter(|i| i.kind == ShapeKind::HollowCylinder)
        .ok_or(IntegrateError::UnsupportedShape(
            sample.name(),
            "hollow cylinder",
        ))?;
    polar_raster(
        beam,
        sample,
        &info.centre,
        &info.axis,
        info.inner_radius,
        info.radius,
        info.height,
        n_slices,
        n_annuli,
    )
}

#[allow(clippy::too_many_arguments)]
fn polar_raster(
    beam: &Vec3,
    sample: &CsgObject,
    centre: &Point3,
    axis: &Vec3,
    r_inner: f64,
    r_outer: f64,
    height: f64,
    n_slices: usize,
    n_annuli: usize,
) -> Result<Raster> {
    let (u, v) = orthonormal_basis(axis);
    let d_h = height / n_slices as f64;
    let d_r = (r_outer - r_inner) / n_annuli as f64;

    let mut elements = Vec::new();
    let mut total_volume = 0.0;
    for i in 0..n_slices {
        let h = -0.5 * height + (i as f64 + 0.5) * d_h;
        for k in 0..n_annuli {
            let r_in = r_inner + k as f64 * d_r;
            let r_out = r_in + d_r;
            let r_mid = 0.5 * (r_in + r_out);
            let sectors = 6 * (k + 1);
            let d_theta = 2.0 * PI / sectors as f64;
            let volume = d_h * d_theta * 0.5 * (r_out * r_out - r_in * r_in);
            for j in 0..sectors {
                let theta = (j as f64 + 0.5) * d_theta;
                let radial = u * theta.cos() + v * theta.sin();
                let position = centre + axis * h + radial * r_mid;
                if !sample.is_valid(&position) {
                    continue;
                }
                let l1 = upstream_path(sample, &position, beam);
                if l1 <= 0.0 {
                    continue;
                }
                elements.push(RasterElement {
                    position,
                    volume,
                    l1,
                });
                total_volume += volume;
            }
        }
    }
    if elements.is_empty() {
        return Err(IntegrateError::EmptyRaster(sample.name()));
    }
    Ok(Raster {
        elements,
        total_volume,
    })
}
