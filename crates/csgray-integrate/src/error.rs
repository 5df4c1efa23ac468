use thiserror::Error;

/// Errors from the integration and rasterization algorithms.
#[derive(Debug, Error)]
pub enum IntegrateError {
    /// Rasterization visited the whole grid without keeping any element.
    #[error("rasterization of object {0} produced no volume elements")]
    EmptyRaster(i32),

    /// The object lacks the primitive-shape parameters an algorithm needs.
    #[error("object {0} has no usable {1} shape parameters")]
    UnsupportedShape(i32, &'static str),

    /// No finite bounding box could be derived for the object.
    #[error("object {0} has no finite bounding box")]
    UnboundedObject(i32),
}

/// Convenience alias for results in this crate.
pub type Result<T> = std::result::Result<T, IntegrateError>;
