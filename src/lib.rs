//! Recursive evaluation of B-spline deformable transforms in 1 to 4 dimensions,
//! no-std compatible, built for the inner loop of image registration.
//!
//! A B-spline transform maps a point `x` to `x + u(x)`, where each component
//! of the displacement `u` is a tensor-product B-spline over a regular grid of
//! control points. Optimizers need the mapped point together with several
//! derivatives at millions of sample points per iteration, so every query here
//! touches only the `(order + 1)^D` control points that influence it and
//! computes everything it needs in a single recursive pass over them.
//!
//! # Outputs
//! | Method                           | Result                                                  |
//! |----------------------------------|---------------------------------------------------------|
//! | `transform_point`                | mapped point                                            |
//! | `jacobian` / `jacobian_into`     | derivative of the point w.r.t. the parameters (sparse)  |
//! | `spatial_jacobian`               | derivative of the point w.r.t. the input point          |
//! | `spatial_hessian`                | second derivatives w.r.t. the input point               |
//! | `evaluate`                       | point, spatial Jacobian, and spatial Hessian together   |
//! | `jacobian_of_spatial_jacobian`   | spatial Jacobian differentiated w.r.t. the parameters   |
//! | `jacobian_of_spatial_hessian`    | spatial Hessian differentiated w.r.t. the parameters    |
//!
//! # Performance Scalings
//! Every query costs O((order + 1)^D) regardless of grid size. The recursion
//! contracts one axis per level, so the value, gradient, and Hessian share the
//! same pass and the per-axis weights are evaluated only once per query.
//! Heavier outputs only request the weight derivatives they use.
//!
//! # Example
//! ```rust
//! use recursive_bspline::{BSplineTransform, GridGeometry, SplineOrder};
//!
//! let geometry = GridGeometry::axis_aligned([8, 8, 8], [1.5_f64; 3], [-5.0; 3]).unwrap();
//! let mut transform = BSplineTransform::new(geometry, SplineOrder::Cubic).unwrap();
//!
//! // A zero grid is the identity
//! let p = [0.3, -0.2, 0.9];
//! let out = transform.evaluate(&p).unwrap();
//! assert!(out.inside);
//! assert_eq!(out.point, p);
//! assert_eq!(out.spatial_jacobian[1][1], 1.0);
//!
//! // Optimizer step: replace the parameters and evaluate again
//! let params: Vec<f64> = (0..transform.number_of_parameters())
//!     .map(|i| 1e-3 * (i % 7) as f64)
//!     .collect();
//! transform.set_parameters(&params).unwrap();
//! let jac = transform.jacobian(&p).unwrap();
//! assert_eq!(jac.nonzero_indices().len(), transform.number_of_nonzero_jacobian_indices());
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
// These "needless" range loops are a significant speedup
#![allow(clippy::needless_range_loop)]
// Some const loops produce flattened code with unresolvable lints on
// expanded code that is entirely in const.
#![allow(clippy::absurd_extreme_comparisons)]

extern crate alloc;

mod error;
pub use error::TransformError;

pub mod weights;
pub use weights::{Derivatives, SplineOrder, SupportWeights, MAX_SUPPORT};

pub mod support;

pub mod geometry;
pub use geometry::GridGeometry;

pub mod recursive;

pub mod transform;
pub use transform::{
    transform_points, BSplineTransform, Evaluation, JacobianOfSpatialHessian,
    JacobianOfSpatialJacobian, MappedPoint, ParameterJacobian, SpatialHessian, SpatialJacobian,
};

#[cfg(feature = "std")]
pub mod utils;

#[cfg(all(test, feature = "std"))]
pub(crate) mod testing;

/// Largest number of dimensions supported by the recursive kernels.
pub const MAX_DIMS: usize = 4;
