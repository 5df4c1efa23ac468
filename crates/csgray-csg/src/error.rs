//! Error types for the CSG core.

use thiserror::Error;

/// Errors that can occur while building or populating CSG objects.
#[derive(Error, Debug)]
pub enum CsgError {
    /// The algebra string failed to reduce to exactly one rule, contained
    /// an unmatched bracket, or held an unparseable token.
    #[error("malformed algebra expression: {0}")]
    MalformedExpression(String),

    /// A referenced surface number has no entry in the supplied map.
    #[error("surface {0} not found in surface map")]
    SurfaceNotFound(i32),

    /// A complemented object number has no entry in the supplied map.
    #[error("object {0} not found in object map")]
    ObjectNotFound(i32),

    /// A triangle mesh referenced a vertex out of range or had a
    /// malformed flat array.
    #[error("invalid triangle mesh: {0}")]
    InvalidMesh(String),
}

/// Result type for CSG core operations.
pub type Result<T> = std::result::Result<T, CsgError>;
