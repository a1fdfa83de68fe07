//! Error type shared by transform construction and evaluation.
//!
//! Points that fall outside the control grid are not errors; they are
//! reported through the `inside` flag of each result. Everything here is
//! either a malformed setup or input that cannot be mapped onto the grid at all.
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    #[error("Dimension mismatch: expected {expected} values but got {found}.")]
    DimensionMismatch { expected: usize, found: usize },

    #[error(
        "Grid has {size} control points along axis {axis}, but spline order {order} needs at least {required}."
    )]
    GridTooSmall {
        axis: usize,
        size: usize,
        order: usize,
        required: usize,
    },

    #[error("Grid spacing along axis {axis} must be finite and strictly positive.")]
    InvalidSpacing { axis: usize },

    #[error("Grid has more control points than can be addressed.")]
    GridTooLarge,

    #[error("Grid direction matrix is singular and cannot map points to grid indices.")]
    SingularDirection,

    #[error("Spline order {0} is not supported; orders 0 through 3 are available.")]
    UnsupportedOrder(usize),

    #[error("Coordinate is not finite or cannot be represented as a grid index.")]
    UnrepresentableCoordinate,

    #[error("Output buffer too small: need {required} entries but only {found} were provided.")]
    BufferTooSmall { required: usize, found: usize },
}
