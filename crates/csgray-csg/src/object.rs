//! The CSG object: a named rule tree plus its bound surfaces and caches.
//!
//! A [`CsgObject`] owns one rule tree, the de-duplicated list of surfaces
//! the tree references, an optional primitive-shape tag, and two lazily
//! computed caches (bounding box and triangle mesh). Objects are built
//! mutably (`set_object`, `populate`, `bind_complements`) and then shared
//! immutably behind `Arc` for queries, so both caches use atomic
//! compare-and-publish cells rather than interior mutability locks.

use crate::error::{CsgError, Result};
use crate::mesh::{TriangleMesh, Triangulator};
use crate::parser::parse_expression;
use crate::rule::Rule;
use crate::shape::{detect_shape, ShapeInfo};
use crate::track::{Track, TrackDirection};
use csgray_math::{BoundingBox, Point3, Vec3, TOLERANCE};
use csgray_surfaces::Surface;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Perturbation used when classifying a ray crossing as entering or
/// leaving: validity is sampled this far before and after the crossing.
const CROSSING_STEP: f64 = 25.0 * TOLERANCE;

/// Perturbation used when testing whether a point sits on the object
/// boundary: validity is sampled this far to either side of the point.
const SIDE_STEP: f64 = 5.0 * TOLERANCE;

/// A named constructive-solid-geometry object.
#[derive(Clone)]
pub struct CsgObject {
    name: i32,
    rule: Option<Rule>,
    surfaces: Vec<Arc<dyn Surface>>,
    shape_xml: Option<String>,
    material: Option<String>,
    shape_info: Option<ShapeInfo>,
    bounds: OnceLock<Option<BoundingBox>>,
    mesh: OnceLock<Option<TriangleMesh>>,
    triangulator: Option<Arc<dyn Triangulator>>,
}

impl fmt::Debug for CsgObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsgObject")
            .field("name", &self.name)
            .field("rule", &self.rule)
            .field("surfaces", &self.surfaces.len())
            .field("shape_info", &self.shape_info)
            .finish_non_exhaustive()
    }
}

impl CsgObject {
    /// An empty object with the given name and no rule.
    pub fn new(name: i32) -> Self {
        Self {
            name,
            rule: None,
            surfaces: Vec::new(),
            shape_xml: None,
            material: None,
            shape_info: None,
            bounds: OnceLock::new(),
            mesh: OnceLock::new(),
            triangulator: None,
        }
    }

    /// Object name.
    pub fn name(&self) -> i32 {
        self.name
    }

    /// The rule tree, if one has been set.
    pub fn rule(&self) -> Option<&Rule> {
        self.rule.as_ref()
    }

    /// The de-duplicated surfaces referenced by the rule tree.
    pub fn surfaces(&self) -> &[Arc<dyn Surface>] {
        &self.surfaces
    }

    /// Canonical algebraic form of the rule tree.
    pub fn algebra(&self) -> Option<String> {
        self.rule.as_ref().map(|r| r.display())
    }

    /// The primitive-shape tag, if one is set or was detected.
    pub fn shape_info(&self) -> Option<&ShapeInfo> {
        self.shape_info.as_ref()
    }

    /// Tag this object as a known primitive shape.
    pub fn set_shape_info(&mut self, info: ShapeInfo) {
        self.shape_info = Some(info);
        self.reset_caches();
    }

    /// Install the triangulation provider used by [`CsgObject::mesh`].
    pub fn set_triangulator(&mut self, triangulator: Arc<dyn Triangulator>) {
        self.triangulator = Some(triangulator);
    }

    /// Attached shape metadata, if any.
    pub fn shape_xml(&self) -> Option<&str> {
        self.shape_xml.as_deref()
    }

    /// Attach opaque shape metadata carried alongside the object.
    pub fn set_shape_xml(&mut self, xml: impl Into<String>) {
        self.shape_xml = Some(xml.into());
    }

    /// Material label, if any.
    pub fn material(&self) -> Option<&str> {
        self.material.as_deref()
    }

    /// Attach a material label.
    pub fn set_material(&mut self, material: impl Into<String>) {
        self.material = Some(material.into());
    }

    /// Parse an algebra expression and install it as this object's rule.
    ///
    /// The expression language is purely numeric, so any alphabetic
    /// character is rejected before parsing. Installs the new name, drops
    /// the old surface list and shape tag, and clears both caches.
    pub fn set_object(&mut self, name: i32, expression: &str) -> Result<()> {
        if let Some(c) = expression.chars().find(|c| c.is_ascii_alphabetic()) {
            return Err(CsgError::MalformedExpression(format!(
                "unexpected character '{c}'"
            )));
        }
        let rule = parse_expression(expression)?;
        self.name = name;
        self.rule = Some(rule);
        self.surfaces.clear();
        self.shape_info = None;
        self.reset_caches();
        Ok(())
    }

    /// Bind every surface leaf of the rule tree against the given map,
    /// rebuild the surface list, and detect the primitive shape if no
    /// tag was set explicitly.
    pub fn populate(&mut self, surfaces: &HashMap<i32, Arc<dyn Surface>>) -> Result<()> {
        let Some(rule) = self.rule.as_mut() else {
            return Ok(());
        };
        rule.populate(surfaces)?;
        self.create_surface_list();
        if self.shape_info.is_none() {
            if let Some(rule) = &self.rule {
                self.shape_info = detect_shape(rule, &self.surfaces);
            }
        }
        self.reset_caches();
        Ok(())
    }

    /// Bind every `#n` complement leaf against the given object map and
    /// extend the surface list with the complemented objects' surfaces,
    /// so ray queries see the carved boundaries.
    pub fn bind_complements(&mut self, objects: &HashMap<i32, Arc<CsgObject>>) -> Result<()> {
        if let Some(rule) = self.rule.as_mut() {
            rule.bind_objects(objects)?;
            self.create_surface_list();
            self.reset_caches();
        }
        Ok(())
    }

    /// Rebuild the de-duplicated surface list from the rule tree.
    fn create_surface_list(&mut self) {
        self.surfaces.clear();
        let Some(rule) = &self.rule else {
            return;
        };
        let mut seen: HashSet<i32> = HashSet::new();
        let mut stack: Vec<&Rule> = vec![rule];
        while let Some(node) = stack.pop() {
            match node {
                Rule::Surf(leaf) => {
                    if let Some(surface) = &leaf.surface {
                        if seen.insert(surface.id()) {
                            self.surfaces.push(Arc::clone(surface));
                        }
                    }
                }
                Rule::CompObj(leaf) => {
                    if let Some(object) = &leaf.object {
                        for surface in object.surfaces() {
                            if seen.insert(surface.id()) {
                                self.surfaces.push(Arc::clone(surface));
                            }
                        }
                    }
                }
                Rule::Intersection(a, b) | Rule::Union(a, b) => {
                    stack.push(a);
                    stack.push(b);
                }
                Rule::CompGrp(a) => stack.push(a),
            }
        }
    }

    /// True if a rule is installed and every leaf is bound.
    pub fn has_valid_shape(&self) -> bool {
        fn bound(rule: &Rule) -> bool {
            match rule {
                Rule::Surf(leaf) => leaf.surface.is_some(),
                Rule::CompObj(leaf) => leaf.object.is_some(),
                Rule::Intersection(a, b) | Rule::Union(a, b) => bound(a) && bound(b),
                Rule::CompGrp(a) => bound(a),
            }
        }
        self.rule.as_ref().is_some_and(bound)
    }

    /// Is `p` inside (or on the boundary of) this object?
    pub fn is_valid(&self, p: &Point3) -> bool {
        self.rule.as_ref().is_some_and(|r| r.is_valid(p))
    }

    /// Validity against a precomputed surface-number -> side map.
    pub fn is_valid_sides(&self, sides: &HashMap<i32, i8>) -> bool {
        self.rule.as_ref().is_some_and(|r| r.is_valid_sides(sides))
    }

    fn straddles(&self, p: &Point3, direction: &Vec3) -> bool {
        let step = direction * SIDE_STEP;
        self.is_valid(&(p + step)) != self.is_valid(&(p - step))
    }

    /// Does `p` lie on the boundary of this object?
    ///
    /// A point on one of the object's surfaces is on the boundary when
    /// validity flips across it. Faces are probed along each touching
    /// surface normal; edges and corners, where no single normal
    /// straddles, are probed along the pairwise normal bisectors.
    pub fn is_on_side(&self, p: &Point3) -> bool {
        let normals: Vec<Vec3> = self
            .surfaces
            .iter()
            .filter(|s| s.on_surface(p))
            .map(|s| s.normal_at(p))
            .collect();
        if normals.is_empty() {
            return false;
        }
        for n in &normals {
            if self.straddles(p, n) {
                return true;
            }
        }
        for i in 0..normals.len() {
            for j in i + 1..normals.len() {
                for dir in [normals[i] + normals[j], normals[i] - normals[j]] {
                    let norm = dir.norm();
                    if norm > TOLERANCE && self.straddles(p, &(dir / norm)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Trace the track's ray through this object, appending classified
    /// crossing points and building links. Returns the number of links
    /// added.
    ///
    /// Every surface of the object is intersected with the ray; each hit
    /// ahead of the origin is classified by sampling validity just before
    /// and just after the crossing, which discards hits on surface
    /// extensions that do not bound the object. A valid origin counts as
    /// an entry at distance zero so that rays started inside still
    /// produce a first link.
    pub fn intercept_surface(&self, track: &mut Track) -> usize {
        let origin = *track.start();
        let direction = *track.direction();
        if self.is_valid(&origin) {
            track.add_point(TrackDirection::Entering, origin, self.name);
        }
        let mut hits: Vec<f64> = Vec::new();
        for surface in &self.surfaces {
            hits.extend(surface.line_hits(&origin, &direction));
        }
        hits.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for t in hits {
            if t <= TOLERANCE {
                continue;
            }
            let point = origin + direction * t;
            let before = self.is_valid(&(point - direction * CROSSING_STEP));
            let after = self.is_valid(&(point + direction * CROSSING_STEP));
            if before == after {
                continue;
            }
            let crossing = if after {
                TrackDirection::Entering
            } else {
                TrackDirection::Leaving
            };
            track.add_point(crossing, point, self.name);
        }
        track.build_links()
    }

    /// Axis-aligned bounding box of the object.
    ///
    /// Falls back to the fixed ±100-unit default box when no finite
    /// extent can be derived, so the result is always usable for
    /// scanning. Use [`CsgObject::try_bounding_box`] to observe the
    /// failure instead.
    pub fn bounding_box(&self) -> BoundingBox {
        self.try_bounding_box().unwrap_or_else(BoundingBox::fallback)
    }

    /// Axis-aligned bounding box of the object, or `None` when no finite
    /// box can be derived. Failure is cached and never retried.
    ///
    /// Computed once and cached: the rule tree's closed-form extents are
    /// tried first, then the triangle-mesh extent, then the
    /// primitive-shape parameters.
    pub fn try_bounding_box(&self) -> Option<BoundingBox> {
        *self.bounds.get_or_init(|| {
            if let Some(rule) = &self.rule {
                let mut bb = BoundingBox::sentinel();
                rule.extend_bounds(&mut bb);
                if !bb.is_unconstrained() && !bb.is_null() {
                    return Some(bb);
                }
            }
            if let Some(mesh) = self.mesh() {
                let bb = mesh.bounding_box();
                if !bb.is_null() {
                    return Some(bb);
                }
            }
            self.shape_info.as_ref().and_then(|info| info.bounding_box())
        })
    }

    /// Find a point strictly inside the object, or `None` when no probe
    /// ray hits it.
    ///
    /// Probes the bounding-box centre and the origin directly, then casts
    /// axis-aligned rays from both and takes the midpoint of the first
    /// traversed segment.
    pub fn point_in_object(&self) -> Option<Point3> {
        let mut candidates = vec![Point3::origin()];
        if let Some(bb) = self.try_bounding_box() {
            candidates.insert(0, bb.centre());
        }
        for c in &candidates {
            if self.is_valid(c) && !self.is_on_side(c) {
                return Some(*c);
            }
        }
        let axes = [
            Vec3::x(),
            -Vec3::x(),
            Vec3::y(),
            -Vec3::y(),
            Vec3::z(),
            -Vec3::z(),
        ];
        for start in candidates {
            for axis in axes {
                let mut track = Track::new(start, axis);
                if self.intercept_surface(&mut track) > 0 {
                    let link = &track.links()[0];
                    return Some(Point3::from((link.entry.coords + link.exit.coords) * 0.5));
                }
            }
        }
        None
    }

    /// A new object of the given name whose region is the complement of
    /// this object's region. Caches and the shape tag do not carry over.
    pub fn make_complement(&self, name: i32) -> CsgObject {
        let mut complement = CsgObject::new(name);
        complement.rule = self
            .rule
            .as_ref()
            .map(|r| Rule::CompGrp(Box::new(r.clone())));
        complement.surfaces = self.surfaces.clone();
        complement.triangulator = self.triangulator.clone();
        complement
    }

    /// Remove every leaf referencing the given surface from the rule
    /// tree, collapsing affected nodes onto their siblings. Returns the
    /// number of leaves removed.
    pub fn remove_surface(&mut self, key: i32) -> usize {
        let Some(rule) = self.rule.take() else {
            return 0;
        };
        let (kept, removed) = rule.without_surface(key);
        self.rule = kept;
        if removed > 0 {
            self.create_surface_list();
            self.shape_info = None;
            self.reset_caches();
        }
        removed
    }

    /// Replace every leaf referencing `old_key` with `new_key` bound to
    /// `new_surface`, keeping leaf signs. Returns the substitution count.
    pub fn substitute_surface(
        &mut self,
        old_key: i32,
        new_key: i32,
        new_surface: &Arc<dyn Surface>,
    ) -> usize {
        let Some(rule) = self.rule.as_mut() else {
            return 0;
        };
        let count = rule.substitute_surface(old_key, new_key, new_surface);
        if count > 0 {
            self.create_surface_list();
            self.shape_info = None;
            self.reset_caches();
        }
        count
    }

    /// Install an externally produced triangle mesh, bypassing the
    /// triangulator.
    pub fn set_geometry_cache(&mut self, mesh: TriangleMesh) {
        self.mesh = OnceLock::from(Some(mesh));
        self.bounds = OnceLock::new();
    }

    /// The cached triangle mesh, triangulating on first access if a
    /// provider is installed. `None` when there is no provider or the
    /// provider declines the shape.
    pub fn mesh(&self) -> Option<&TriangleMesh> {
        self.mesh
            .get_or_init(|| {
                self.triangulator
                    .as_ref()
                    .and_then(|t| t.triangulate(self))
            })
            .as_ref()
    }

    /// Number of triangles in the cached mesh (0 without a mesh).
    pub fn n_triangles(&self) -> usize {
        self.mesh().map_or(0, TriangleMesh::n_triangles)
    }

    fn reset_caches(&mut self) {
        self.bounds = OnceLock::new();
        self.mesh = OnceLock::new();
    }
}
