//! The CSG rule tree: a binary tree of set operations over surface
//! leaves.
//!
//! Variants follow the tagged-union model: signed surface leaves,
//! complement-of-object leaves, binary intersection/union nodes and the
//! unary complement group. Non-leaf binary nodes own exactly two
//! children; `CompGrp` owns one. Trees are acyclic by construction.

use crate::error::{CsgError, Result};
use crate::object::CsgObject;
use csgray_math::{BoundingBox, Point3};
use csgray_surfaces::Surface;
use std::collections::HashMap;
use std::sync::Arc;

/// A signed surface leaf. The sign encodes which side of the surface is
/// "inside": the leaf is valid where `sign * side(p) >= 0`, so a point
/// exactly on the surface is valid for either sign.
#[derive(Debug, Clone)]
pub struct SurfPoint {
    /// Surface number referenced by the algebra.
    pub key: i32,
    /// +1 for the positive side, -1 for the negative side.
    pub sign: i8,
    /// Bound surface; `None` until `populate` runs.
    pub surface: Option<Arc<dyn Surface>>,
}

/// A complement-of-object leaf (`#n` in the algebra).
#[derive(Debug, Clone)]
pub struct CompObj {
    /// Object number being complemented.
    pub key: i32,
    /// Bound object; `None` until complements are resolved.
    pub object: Option<Arc<CsgObject>>,
}

/// Node of the CSG rule tree.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Signed surface leaf.
    Surf(SurfPoint),
    /// Complement of another named object.
    CompObj(CompObj),
    /// Set intersection of two subtrees.
    Intersection(Box<Rule>, Box<Rule>),
    /// Set union of two subtrees.
    Union(Box<Rule>, Box<Rule>),
    /// Complement of a whole subtree (`#(...)`).
    CompGrp(Box<Rule>),
}

impl Rule {
    /// A surface leaf with the given key and sign, unbound.
    pub fn surf(key: i32, sign: i8) -> Rule {
        Rule::Surf(SurfPoint {
            key,
            sign,
            surface: None,
        })
    }

    /// A complement-of-object leaf with the given key, unbound.
    pub fn comp_obj(key: i32) -> Rule {
        Rule::CompObj(CompObj { key, object: None })
    }

    /// Point validity: does `p` lie inside (or on the boundary of) the
    /// region this subtree describes?
    pub fn is_valid(&self, p: &Point3) -> bool {
        match self {
            Rule::Surf(leaf) => match &leaf.surface {
                Some(surface) => i32::from(leaf.sign) * i32::from(surface.side(p)) >= 0,
                None => false,
            },
            Rule::CompObj(leaf) => match &leaf.object {
                Some(object) => !object.is_valid(p),
                None => false,
            },
            Rule::Intersection(a, b) => a.is_valid(p) && b.is_valid(p),
            Rule::Union(a, b) => a.is_valid(p) || b.is_valid(p),
            Rule::CompGrp(a) => !a.is_valid(p),
        }
    }

    /// Validity against a precomputed per-surface side map
    /// (surface number -> -1/0/+1), using the same sign convention as
    /// [`Rule::is_valid`].
    ///
    /// A leaf whose surface number is missing from the map is invalid.
    /// Complement-of-object leaves cannot be evaluated against a surface
    /// map and count as valid.
    pub fn is_valid_sides(&self, sides: &HashMap<i32, i8>) -> bool {
        match self {
            Rule::Surf(leaf) => match sides.get(&leaf.key) {
                Some(&side) => i32::from(leaf.sign) * i32::from(side) >= 0,
                None => false,
            },
            Rule::CompObj(_) => true,
            Rule::Intersection(a, b) => a.is_valid_sides(sides) && b.is_valid_sides(sides),
            Rule::Union(a, b) => a.is_valid_sides(sides) || b.is_valid_sides(sides),
            Rule::CompGrp(a) => !a.is_valid_sides(sides),
        }
    }

    /// Render the canonical algebraic form of this subtree.
    ///
    /// Leaves render as `-12`/`12`, object complements as `#12`, group
    /// complements as `#(...)`, intersections as juxtaposition with
    /// parentheses around union children, and unions as `a : b` with
    /// parentheses around intersection operands. The brackets keep the
    /// strictly left-to-right reparse from regrouping either operator
    /// across the other.
    pub fn display(&self) -> String {
        fn grouped(r: &Rule) -> String {
            match r {
                Rule::Union(_, _) => format!("({})", r.display()),
                _ => r.display(),
            }
        }
        fn union_operand(r: &Rule) -> String {
            match r {
                Rule::Intersection(_, _) => format!("({})", r.display()),
                _ => r.display(),
            }
        }
        match self {
            Rule::Surf(leaf) => {
                if leaf.sign < 0 {
                    format!("-{}", leaf.key)
                } else {
                    leaf.key.to_string()
                }
            }
            Rule::CompObj(leaf) => format!("#{}", leaf.key),
            Rule::Intersection(a, b) => format!("{} {}", grouped(a), grouped(b)),
            Rule::Union(a, b) => format!("{} : {}", union_operand(a), union_operand(b)),
            Rule::CompGrp(a) => format!("#({})", a.display()),
        }
    }

    /// Bind every surface leaf to its concrete surface.
    ///
    /// Fails with [`CsgError::SurfaceNotFound`] naming the first surface
    /// number absent from the map.
    pub fn populate(&mut self, surfaces: &HashMap<i32, Arc<dyn Surface>>) -> Result<()> {
        match self {
            Rule::Surf(leaf) => {
                let surface = surfaces
                    .get(&leaf.key)
                    .ok_or(CsgError::SurfaceNotFound(leaf.key))?;
                leaf.surface = Some(Arc::clone(surface));
                Ok(())
            }
            Rule::CompObj(_) => Ok(()),
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                a.populate(surfaces)?;
                b.populate(surfaces)
            }
            Rule::CompGrp(a) => a.populate(surfaces),
        }
    }

    /// Bind every complement-of-object leaf to its concrete object.
    pub fn bind_objects(&mut self, objects: &HashMap<i32, Arc<CsgObject>>) -> Result<()> {
        match self {
            Rule::Surf(_) => Ok(()),
            Rule::CompObj(leaf) => {
                let object = objects
                    .get(&leaf.key)
                    .ok_or(CsgError::ObjectNotFound(leaf.key))?;
                leaf.object = Some(Arc::clone(object));
                Ok(())
            }
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                a.bind_objects(objects)?;
                b.bind_objects(objects)
            }
            Rule::CompGrp(a) => a.bind_objects(objects),
        }
    }

    /// Recursively tighten `bounds` with this subtree's extent.
    ///
    /// Intersections narrow progressively, unions widen by enclosing the
    /// child boxes, and complements contribute no constraint. Leaves only
    /// contribute closed-form extents for axis-aligned primitives; a box
    /// still at the sentinel extent afterwards means failure for the
    /// caller.
    pub fn extend_bounds(&self, bounds: &mut BoundingBox) {
        match self {
            Rule::Surf(leaf) => {
                if let Some(surface) = &leaf.surface {
                    surface.extend_bounds(leaf.sign, bounds);
                }
            }
            Rule::Intersection(a, b) => {
                a.extend_bounds(bounds);
                b.extend_bounds(bounds);
            }
            Rule::Union(a, b) => {
                let mut left = *bounds;
                a.extend_bounds(&mut left);
                let mut right = *bounds;
                b.extend_bounds(&mut right);
                *bounds = left.enclose(&right);
            }
            Rule::CompObj(_) | Rule::CompGrp(_) => {}
        }
    }

    /// Remove every surface leaf with the given key, collapsing each
    /// affected binary node onto its surviving sibling.
    ///
    /// Consumes the tree; returns the surviving tree (or `None` if the
    /// whole tree was removed) and the number of leaves removed.
    pub fn without_surface(self, key: i32) -> (Option<Rule>, usize) {
        match self {
            Rule::Surf(leaf) => {
                if leaf.key == key {
                    (None, 1)
                } else {
                    (Some(Rule::Surf(leaf)), 0)
                }
            }
            Rule::CompObj(leaf) => (Some(Rule::CompObj(leaf)), 0),
            Rule::Intersection(a, b) => {
                let (ra, ca) = a.without_surface(key);
                let (rb, cb) = b.without_surface(key);
                let node = match (ra, rb) {
                    (Some(x), Some(y)) => Some(Rule::Intersection(Box::new(x), Box::new(y))),
                    (Some(x), None) | (None, Some(x)) => Some(x),
                    (None, None) => None,
                };
                (node, ca + cb)
            }
            Rule::Union(a, b) => {
                let (ra, ca) = a.without_surface(key);
                let (rb, cb) = b.without_surface(key);
                let node = match (ra, rb) {
                    (Some(x), Some(y)) => Some(Rule::Union(Box::new(x), Box::new(y))),
                    (Some(x), None) | (None, Some(x)) => Some(x),
                    (None, None) => None,
                };
                (node, ca + cb)
            }
            Rule::CompGrp(a) => {
                let (ra, ca) = a.without_surface(key);
                (ra.map(|r| Rule::CompGrp(Box::new(r))), ca)
            }
        }
    }

    /// Replace every leaf referencing `old_key` with a leaf referencing
    /// `new_key` bound to `new_surface`, keeping the leaf sign. Returns
    /// the number of substitutions.
    pub fn substitute_surface(
        &mut self,
        old_key: i32,
        new_key: i32,
        new_surface: &Arc<dyn Surface>,
    ) -> usize {
        match self {
            Rule::Surf(leaf) => {
                if leaf.key == old_key {
                    leaf.key = new_key;
                    leaf.surface = Some(Arc::clone(new_surface));
                    1
                } else {
                    0
                }
            }
            Rule::CompObj(_) => 0,
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                a.substitute_surface(old_key, new_key, new_surface)
                    + b.substitute_surface(old_key, new_key, new_surface)
            }
            Rule::CompGrp(a) => a.substitute_surface(old_key, new_key, new_surface),
        }
    }

    /// Find the first surface leaf with the given key.
    pub fn find_key(&self, key: i32) -> Option<&Rule> {
        match self {
            Rule::Surf(leaf) => (leaf.key == key).then_some(self),
            Rule::CompObj(_) => None,
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                a.find_key(key).or_else(|| b.find_key(key))
            }
            Rule::CompGrp(a) => a.find_key(key),
        }
    }

    /// Index (0 or 1) of the direct child that is a surface leaf with
    /// the given key; -1 if neither child matches or this is a leaf.
    pub fn find_leaf(&self, key: i32) -> i32 {
        let is_leaf = |r: &Rule| matches!(r, Rule::Surf(leaf) if leaf.key == key);
        match self {
            Rule::Intersection(a, b) | Rule::Union(a, b) => {
                if is_leaf(a) {
                    0
                } else if is_leaf(b) {
                    1
                } else {
                    -1
                }
            }
            Rule::CompGrp(a) => {
                if is_leaf(a) {
                    0
                } else {
                    -1
                }
            }
            _ => -1,
        }
    }

    /// Number of surface leaves in the subtree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Rule::Surf(_) | Rule::CompObj(_) => 1,
            Rule::Intersection(a, b) | Rule::Union(a, b) => a.leaf_count() + b.leaf_count(),
            Rule::CompGrp(a) => a.leaf_count(),
        }
    }
}
