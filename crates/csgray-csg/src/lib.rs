#![warn(missing_docs)]

//! Constructive solid geometry core for csgray.
//!
//! Objects are built from signed surface leaves combined by a binary
//! rule tree (intersection, union, complement), written in a compact
//! numeric algebra: `-31 -32 33` intersects three half-regions,
//! `10 : 11` takes a union, `#n` complements another object and
//! `#(...)` complements a group.
//!
//! The crate provides the tree itself ([`Rule`]), the expression parser
//! ([`parse_expression`]), the object wrapper with its caches
//! ([`CsgObject`]), ray [`Track`]s through objects, and the triangle
//! mesh seam used by downstream integrators.

mod error;
mod mesh;
mod object;
mod parser;
mod rule;
mod shape;
mod track;

pub use error::{CsgError, Result};
pub use mesh::{TriangleMesh, Triangulator};
pub use object::CsgObject;
pub use parser::parse_expression;
pub use rule::{CompObj, Rule, SurfPoint};
pub use shape::{detect_shape, ShapeInfo, ShapeKind};
pub use track::{IntersectionPoint, Link, Track, TrackDirection};
