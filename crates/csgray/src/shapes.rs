//! Ready-made factories for the standard sample shapes.
//!
//! Each factory numbers its surfaces from the object name (surface
//! `10 * name + k`), writes the algebra expression, and populates the
//! object so it is immediately usable.

use csgray_csg::{CsgObject, Result};
use csgray_math::{Point3, Vec3};
use csgray_surfaces::{Cone, Cylinder, Plane, Sphere, Surface};
use std::collections::HashMap;
use std::sync::Arc;

fn populate(
    object: &mut CsgObject,
    name: i32,
    expression: &str,
    surfaces: Vec<Arc<dyn Surface>>,
) -> Result<()> {
    let map: HashMap<i32, Arc<dyn Surface>> =
        surfaces.into_iter().map(|s| (s.id(), s)).collect();
    object.set_object(name, expression)?;
    object.populate(&map)
}

/// A solid sphere.
pub fn make_sphere(name: i32, centre: Point3, radius: f64) -> Result<CsgObject> {
    let id = 10 * name + 1;
    let mut object = CsgObject::new(name);
    populate(
        &mut object,
        name,
        &format!("-{id}"),
        vec![Arc::new(Sphere::new(id, centre, radius))],
    )?;
    Ok(object)
}

/// An axis-aligned cuboid between two corners.
pub fn make_cuboid(name: i32, min: Point3, max: Point3) -> Result<CsgObject> {
    let id = |k: i32| 10 * name + k;
    let mut object = CsgObject::new(name);
    let expression = format!(
        "{} -{} {} -{} {} -{}",
        id(1),
        id(2),
        id(3),
        id(4),
        id(5),
        id(6)
    );
    populate(
        &mut object,
        name,
        &expression,
        vec![
            Arc::new(Plane::px(id(1), min.x)),
            Arc::new(Plane::px(id(2), max.x)),
            Arc::new(Plane::py(id(3), min.y)),
            Arc::new(Plane::py(id(4), max.y)),
            Arc::new(Plane::pz(id(5), min.z)),
            Arc::new(Plane::pz(id(6), max.z)),
        ],
    )?;
    Ok(object)
}

/// A solid cylinder capped by two planes perpendicular to its axis.
pub fn make_capped_cylinder(
    name: i32,
    centre: Point3,
    axis: Vec3,
    radius: f64,
    height: f64,
) -> Result<CsgObject> {
    let id = |k: i32| 10 * name + k;
    let axis = axis.normalize();
    let top = centre + axis * (0.5 * height);
    let bottom = centre - axis * (0.5 * height);
    let mut object = CsgObject::new(name);
    let expression = format!("-{} -{} {}", id(1), id(2), id(3));
    populate(
        &mut object,
        name,
        &expression,
        vec![
            Arc::new(Cylinder::new(id(1), centre, axis, radius)),
            Arc::new(Plane::through(id(2), axis, &top)),
            Arc::new(Plane::through(id(3), axis, &bottom)),
        ],
    )?;
    Ok(object)
}

/// A cylindrical shell between two coaxial walls, capped at both ends.
pub fn make_hollow_cylinder(
    name: i32,
    centre: Point3,
    axis: Vec3,
    inner_radius: f64,
    outer_radius: f64,
    height: f64,
) -> Result<CsgObject> {
    let id = |k: i32| 10 * name + k;
    let axis = axis.normalize();
    let top = centre + axis * (0.5 * height);
    let bottom = centre - axis * (0.5 * height);
    let mut object = CsgObject::new(name);
    let expression = format!("-{} {} -{} {}", id(1), id(2), id(3), id(4));
    populate(
        &mut object,
        name,
        &expression,
        vec![
            Arc::new(Cylinder::new(id(1), centre, axis, outer_radius)),
            Arc::new(Cylinder::new(id(2), centre, axis, inner_radius)),
            Arc::new(Plane::through(id(3), axis, &top)),
            Arc::new(Plane::through(id(4), axis, &bottom)),
        ],
    )?;
    Ok(object)
}

/// A solid cone from an apex, closed by a base plane perpendicular to
/// the axis at the given height.
pub fn make_cone(
    name: i32,
    apex: Point3,
    axis: Vec3,
    half_angle: f64,
    height: f64,
) -> Result<CsgObject> {
    let id = |k: i32| 10 * name + k;
    let axis = axis.normalize();
    let base = apex + axis * height;
    let mut object = CsgObject::new(name);
    let expression = format!("-{} -{}", id(1), id(2));
    populate(
        &mut object,
        name,
        &expression,
        vec![
            Arc::new(Cone::new(id(1), apex, axis, half_angle)),
            Arc::new(Plane::through(id(2), axis, &base)),
        ],
    )?;
    Ok(object)
}
