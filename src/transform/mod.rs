//! B-spline deformable transform: identity plus a spline-interpolated
//! displacement field.
//!
//! ```rust
//! use recursive_bspline::{BSplineTransform, GridGeometry, SplineOrder};
//!
//! // 10x10 control grid with 2.0 spacing starting at the origin
//! let geometry = GridGeometry::axis_aligned([10, 10], [2.0_f64, 2.0], [0.0, 0.0]).unwrap();
//! let mut transform = BSplineTransform::new(geometry, SplineOrder::Cubic).unwrap();
//!
//! // Push node (4, 5) by +1.0 along x
//! let node = transform.geometry().linear_index(&[4, 5]);
//! transform.coefficients_mut(0)[node] = 1.0;
//!
//! let mapped = transform.transform_point(&[8.0, 10.0]).unwrap();
//! assert!(mapped.inside);
//! assert!((mapped.point[0] - (8.0 + 4.0 / 9.0)).abs() < 1e-12);
//!
//! // Points whose support leaves the grid pass through unchanged
//! let outside = transform.transform_point(&[-5.0, 10.0]).unwrap();
//! assert!(!outside.inside);
//! assert_eq!(outside.point, [-5.0, 10.0]);
//! ```
//!
//! Every query first maps the point to a continuous grid index, locates the
//! support region, evaluates only the weight derivatives that the requested
//! output needs, then runs one recursive traversal of the support region.
//! Evaluation takes `&self` and keeps all intermediate state on the stack, so
//! one transform can serve any number of threads; parameter updates take
//! `&mut self` and therefore cannot interleave with evaluation.
use crate::geometry::{from_rows, to_rows, GridGeometry};
use crate::recursive::{
    self, CoefficientView, Contraction, NodeGradient, NodeHessian, NodeWeight, Value,
    ValueGradient, ValueGradientHessian,
};
use crate::support::{self, Location};
use crate::weights::{Derivatives, SplineOrder, SupportWeights};
use crate::{TransformError, MAX_DIMS};
use alloc::vec::Vec;
use nalgebra::{Const, DimMin, RealField, SMatrix, SVector};
use num_traits::Float;

mod jacobian;
mod legacy;

pub use jacobian::{JacobianOfSpatialHessian, JacobianOfSpatialJacobian, ParameterJacobian};

/// Evaluate a B-spline transform with axis-aligned geometry on a list of
/// observation points in up to 4 dimensions.
///
/// `obs` and `out` hold one slice per dimension, each with one entry per point,
/// and `inside` holds one flag per point. Points outside the valid region are
/// copied through unchanged and flagged `false`.
///
/// This is a convenience function that builds a transform on every call,
/// copying the parameters; reuse a [`BSplineTransform`] when evaluating
/// repeatedly.
///
/// # Errors
/// * If the number of dimensions is not 1 through 4
/// * If any input lengths do not match
/// * If the geometry is invalid for the spline order
#[allow(clippy::too_many_arguments)]
pub fn transform_points<T: Float + RealField>(
    dims: &[usize],
    origin: &[T],
    spacing: &[T],
    order: SplineOrder,
    parameters: &[T],
    obs: &[&[T]],
    out: &mut [&mut [T]],
    inside: &mut [bool],
) -> Result<(), TransformError> {
    match dims.len() {
        1 => transform_columns::<T, 1>(dims, origin, spacing, order, parameters, obs, out, inside),
        2 => transform_columns::<T, 2>(dims, origin, spacing, order, parameters, obs, out, inside),
        3 => transform_columns::<T, 3>(dims, origin, spacing, order, parameters, obs, out, inside),
        4 => transform_columns::<T, 4>(dims, origin, spacing, order, parameters, obs, out, inside),
        n => Err(TransformError::DimensionMismatch {
            expected: MAX_DIMS,
            found: n,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn transform_columns<T: Float + RealField, const D: usize>(
    dims: &[usize],
    origin: &[T],
    spacing: &[T],
    order: SplineOrder,
    parameters: &[T],
    obs: &[&[T]],
    out: &mut [&mut [T]],
    inside: &mut [bool],
) -> Result<(), TransformError> {
    let mismatch = |found: usize| TransformError::DimensionMismatch { expected: D, found };
    let size: [usize; D] = dims.try_into().map_err(|_| mismatch(dims.len()))?;
    let origin: [T; D] = origin.try_into().map_err(|_| mismatch(origin.len()))?;
    let spacing: [T; D] = spacing.try_into().map_err(|_| mismatch(spacing.len()))?;
    if obs.len() != D {
        return Err(mismatch(obs.len()));
    }
    if out.len() != D {
        return Err(mismatch(out.len()));
    }
    let n = obs[0].len();
    for column in obs.iter() {
        if column.len() != n {
            return Err(TransformError::DimensionMismatch {
                expected: n,
                found: column.len(),
            });
        }
    }
    for column in out.iter() {
        if column.len() != n {
            return Err(TransformError::DimensionMismatch {
                expected: n,
                found: column.len(),
            });
        }
    }
    if inside.len() != n {
        return Err(TransformError::DimensionMismatch {
            expected: n,
            found: inside.len(),
        });
    }

    let geometry = GridGeometry::axis_aligned(size, spacing, origin)?;
    let transform = BSplineTransform::with_parameters(geometry, order, parameters.to_vec())?;

    let mut p = [T::zero(); D];
    for i in 0..n {
        (0..D).for_each(|j| p[j] = obs[j][i]);
        let mapped = transform.transform_point(&p)?;
        (0..D).for_each(|j| out[j][i] = mapped.point[j]);
        inside[i] = mapped.inside;
    }

    Ok(())
}

/// Transformed point and whether the support region lay inside the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappedPoint<T: Float, const D: usize> {
    pub point: [T; D],
    pub inside: bool,
}

/// Derivative of the output point with respect to the input point,
/// `matrix[output][input]`, identity included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialJacobian<T: Float, const D: usize> {
    pub matrix: [[T; D]; D],
    pub inside: bool,
}

impl<T: Float + RealField, const D: usize> SpatialJacobian<T, D> {
    /// Signed determinant. Zero or negative values mean the transform folds
    /// space at this point; what to do about it is up to the caller.
    pub fn determinant(&self) -> T
    where
        Const<D>: DimMin<Const<D>, Output = Const<D>>,
    {
        from_rows(&self.matrix).determinant()
    }
}

/// Second derivatives of each output component with respect to the input
/// point, `components[output][input][input]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialHessian<T: Float, const D: usize> {
    pub components: [[[T; D]; D]; D],
    pub inside: bool,
}

/// Point, spatial Jacobian, and spatial Hessian from a single traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation<T: Float, const D: usize> {
    pub point: [T; D],
    pub spatial_jacobian: [[T; D]; D],
    pub spatial_hessian: [[[T; D]; D]; D],
    pub inside: bool,
}

/// A D-dimensional B-spline deformable transform.
///
/// Owns the control grid geometry, the spline order, and the parameter
/// vector: `D` coefficient grids back to back, one per output component,
/// each raveled with axis 0 fastest. Coefficients are displacements in
/// physical units.
///
/// Operation Complexity
/// * O((order + 1)^D) per query for every operation
///
/// Memory Complexity
/// * Evaluation uses O(D^3 * (order + 1) * D) stack for the deepest tuple
///   path and no heap; the parameter-Jacobian operations write into
///   caller-reusable buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct BSplineTransform<T: Float + RealField, const D: usize> {
    geometry: GridGeometry<T, D>,
    order: SplineOrder,
    strides: [usize; D],
    nodes: usize,
    parameters: Vec<T>,
}

impl<T: Float + RealField, const D: usize> BSplineTransform<T, D> {
    /// Build an identity transform (all coefficients zero).
    ///
    /// # Errors
    /// * If the grid has fewer than `order + 1` nodes along any axis
    pub fn new(geometry: GridGeometry<T, D>, order: SplineOrder) -> Result<Self, TransformError> {
        // The geometry guarantees this product fits
        let nparams = D * geometry.number_of_nodes();
        Self::with_parameters(geometry, order, alloc::vec![T::zero(); nparams])
    }

    /// Build a transform from an existing parameter vector.
    ///
    /// # Errors
    /// * If the grid has fewer than `order + 1` nodes along any axis
    /// * If `parameters.len()` is not `D` times the number of grid nodes
    pub fn with_parameters(
        geometry: GridGeometry<T, D>,
        order: SplineOrder,
        parameters: Vec<T>,
    ) -> Result<Self, TransformError> {
        const {
            assert!(
                D > 0 && D <= MAX_DIMS,
                "B-spline transforms are defined for 1-4 dimensions"
            )
        };

        let required = order.support();
        for (axis, &size) in geometry.size().iter().enumerate() {
            if size < required {
                return Err(TransformError::GridTooSmall {
                    axis,
                    size,
                    order: order.degree(),
                    required,
                });
            }
            if size == required {
                log::warn!(
                    "Grid axis {axis} has exactly {size} nodes; only a single cell along it is inside the transform domain"
                );
            }
        }

        let nodes = geometry.number_of_nodes();
        if parameters.len() != D * nodes {
            return Err(TransformError::DimensionMismatch {
                expected: D * nodes,
                found: parameters.len(),
            });
        }

        log::debug!(
            "Built {}D B-spline transform of order {} on a {:?} grid with {} parameters",
            D,
            order.degree(),
            geometry.size(),
            parameters.len()
        );

        Ok(Self {
            strides: geometry.strides(),
            geometry,
            order,
            nodes,
            parameters,
        })
    }

    #[inline]
    pub fn geometry(&self) -> &GridGeometry<T, D> {
        &self.geometry
    }

    #[inline]
    pub fn order(&self) -> SplineOrder {
        self.order
    }

    /// Flat parameter vector, component-major.
    #[inline]
    pub fn parameters(&self) -> &[T] {
        &self.parameters
    }

    #[inline]
    pub fn number_of_parameters(&self) -> usize {
        self.parameters.len()
    }

    /// Columns of every parameter Jacobian of an inside point, `(order + 1)^D * D`.
    #[inline]
    pub fn number_of_nonzero_jacobian_indices(&self) -> usize {
        self.order.support_volume(D) * D
    }

    /// Replace all parameters, e.g. between optimizer iterations.
    ///
    /// # Errors
    /// * If `parameters` has the wrong length
    pub fn set_parameters(&mut self, parameters: &[T]) -> Result<(), TransformError> {
        if parameters.len() != self.parameters.len() {
            return Err(TransformError::DimensionMismatch {
                expected: self.parameters.len(),
                found: parameters.len(),
            });
        }
        self.parameters.copy_from_slice(parameters);
        log::trace!("Updated {} transform parameters", parameters.len());
        Ok(())
    }

    /// Reset every coefficient to zero.
    pub fn set_identity(&mut self) {
        self.parameters.fill(T::zero());
    }

    /// Coefficient grid of one output component, raveled with axis 0 fastest.
    ///
    /// # Panics
    /// * If `component >= D`
    #[inline]
    pub fn coefficients(&self, component: usize) -> &[T] {
        &self.parameters[component * self.nodes..(component + 1) * self.nodes]
    }

    /// Mutable coefficient grid of one output component.
    ///
    /// # Panics
    /// * If `component >= D`
    #[inline]
    pub fn coefficients_mut(&mut self, component: usize) -> &mut [T] {
        &mut self.parameters[component * self.nodes..(component + 1) * self.nodes]
    }

    /// Map a point and report whether it was inside the transform domain.
    ///
    /// Outside points are returned unchanged.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index (non-finite or huge)
    #[inline]
    pub fn transform_point(&self, point: &[T; D]) -> Result<MappedPoint<T, D>, TransformError> {
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(MappedPoint {
                point: *point,
                inside: false,
            });
        }

        let out: Value<T, D> = self.contract_at(&loc, start);
        let mut mapped = *point;
        for i in 0..D {
            mapped[i] = mapped[i] + out.value[i];
        }
        Ok(MappedPoint {
            point: mapped,
            inside: true,
        })
    }

    /// Map a contiguous list of points.
    ///
    /// # Errors
    /// * If the output slices do not match the number of points
    /// * If any point cannot be mapped to a grid index
    pub fn transform_points(
        &self,
        points: &[[T; D]],
        out: &mut [[T; D]],
        inside: &mut [bool],
    ) -> Result<(), TransformError> {
        let n = points.len();
        if out.len() != n || inside.len() != n {
            return Err(TransformError::DimensionMismatch {
                expected: n,
                found: out.len().min(inside.len()),
            });
        }

        for i in 0..n {
            let mapped = self.transform_point(&points[i])?;
            out[i] = mapped.point;
            inside[i] = mapped.inside;
        }

        Ok(())
    }

    /// Map a point and also report the weight and raveled grid index of each
    /// support node, in support order (axis 0 fastest).
    ///
    /// Only the first `(order + 1)^D` entries of each buffer are written. For
    /// outside points they are set to zero.
    ///
    /// # Errors
    /// * If either buffer is shorter than `(order + 1)^D`
    /// * If the point cannot be mapped to a grid index
    pub fn transform_point_with_weights(
        &self,
        point: &[T; D],
        weights: &mut [T],
        indices: &mut [usize],
    ) -> Result<MappedPoint<T, D>, TransformError> {
        let k = self.order.support_volume(D);
        let found = weights.len().min(indices.len());
        if found < k {
            return Err(TransformError::BufferTooSmall { required: k, found });
        }
        let weights = &mut weights[..k];
        let indices = &mut indices[..k];

        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            weights.fill(T::zero());
            indices.fill(0);
            return Ok(MappedPoint {
                point: *point,
                inside: false,
            });
        }

        let table = SupportWeights::compute(self.order, &loc.offsets, Derivatives::None);
        recursive::expand(
            start,
            &self.strides,
            &table,
            |local, global, e: NodeWeight<T>| {
                weights[local] = e.weight;
                indices[local] = global;
            },
        );

        let mut mapped = *point;
        for c in 0..D {
            let grid = self.coefficients(c);
            let displacement = weights
                .iter()
                .zip(indices.iter())
                .fold(T::zero(), |acc, (&w, &j)| acc + w * grid[j]);
            mapped[c] = mapped[c] + displacement;
        }

        Ok(MappedPoint {
            point: mapped,
            inside: true,
        })
    }

    /// Derivative of the output point with respect to the parameters.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn jacobian(&self, point: &[T; D]) -> Result<ParameterJacobian<T, D>, TransformError> {
        let mut jac = ParameterJacobian::new();
        self.jacobian_into(point, &mut jac)?;
        Ok(jac)
    }

    /// Fill a reusable Jacobian buffer; returns whether the point was inside.
    ///
    /// After the first call the buffer has the right capacity and later calls
    /// do not allocate. Outside points leave the buffer empty.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn jacobian_into(
        &self,
        point: &[T; D],
        jac: &mut ParameterJacobian<T, D>,
    ) -> Result<bool, TransformError> {
        jac.clear();
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(false);
        }

        let k = self.order.support_volume(D);
        let nodes = self.nodes;
        jac.weights.resize(k, T::zero());
        jac.nonzero_indices.resize(D * k, 0);

        let table = SupportWeights::compute(self.order, &loc.offsets, Derivatives::None);
        let (weights, indices) = (&mut jac.weights, &mut jac.nonzero_indices);
        recursive::expand(
            start,
            &self.strides,
            &table,
            |local, global, e: NodeWeight<T>| {
                weights[local] = e.weight;
                for c in 0..D {
                    indices[c * k + local] = c * nodes + global;
                }
            },
        );

        Ok(true)
    }

    /// Derivative of the output point with respect to the input point.
    ///
    /// Outside points get the identity.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn spatial_jacobian(&self, point: &[T; D]) -> Result<SpatialJacobian<T, D>, TransformError> {
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(SpatialJacobian {
                matrix: to_rows(&SMatrix::identity()),
                inside: false,
            });
        }

        let out: ValueGradient<T, D> = self.contract_at(&loc, start);
        Ok(SpatialJacobian {
            matrix: self.physical_jacobian(&out.gradient),
            inside: true,
        })
    }

    /// Second derivatives of each output component with respect to the input point.
    ///
    /// Outside points get zeros.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn spatial_hessian(&self, point: &[T; D]) -> Result<SpatialHessian<T, D>, TransformError> {
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(SpatialHessian {
                components: [[[T::zero(); D]; D]; D],
                inside: false,
            });
        }

        let out: ValueGradientHessian<T, D> = self.contract_at(&loc, start);
        Ok(SpatialHessian {
            components: self.physical_hessian(&out.hessian),
            inside: true,
        })
    }

    /// Point, spatial Jacobian, and spatial Hessian sharing one support lookup,
    /// one weight evaluation, and one traversal.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn evaluate(&self, point: &[T; D]) -> Result<Evaluation<T, D>, TransformError> {
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(Evaluation {
                point: *point,
                spatial_jacobian: to_rows(&SMatrix::identity()),
                spatial_hessian: [[[T::zero(); D]; D]; D],
                inside: false,
            });
        }

        let out: ValueGradientHessian<T, D> = self.contract_at(&loc, start);
        let mut mapped = *point;
        for i in 0..D {
            mapped[i] = mapped[i] + out.value[i];
        }
        Ok(Evaluation {
            point: mapped,
            spatial_jacobian: self.physical_jacobian(&out.gradient),
            spatial_hessian: self.physical_hessian(&out.hessian),
            inside: true,
        })
    }

    /// Derivative of the spatial Jacobian with respect to the parameters.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn jacobian_of_spatial_jacobian(
        &self,
        point: &[T; D],
    ) -> Result<JacobianOfSpatialJacobian<T, D>, TransformError> {
        let mut out = JacobianOfSpatialJacobian::default();
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(out);
        }

        let k = self.order.support_volume(D);
        let nodes = self.nodes;
        let m = self.geometry.point_to_index_matrix();
        out.gradients.resize(k, [T::zero(); D]);
        out.nonzero_indices.resize(D * k, 0);

        let table = SupportWeights::compute(self.order, &loc.offsets, Derivatives::First);
        let (gradients, indices) = (&mut out.gradients, &mut out.nonzero_indices);
        recursive::expand(
            start,
            &self.strides,
            &table,
            |local, global, e: NodeGradient<T, D>| {
                let g: [T; D] = m.tr_mul(&SVector::from(e.gradient)).into();
                gradients[local] = g;
                for c in 0..D {
                    indices[c * k + local] = c * nodes + global;
                }
            },
        );

        Ok(out)
    }

    /// Derivative of the spatial Hessian with respect to the parameters.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn jacobian_of_spatial_hessian(
        &self,
        point: &[T; D],
    ) -> Result<JacobianOfSpatialHessian<T, D>, TransformError> {
        let mut out = JacobianOfSpatialHessian::default();
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(out);
        }

        let k = self.order.support_volume(D);
        let nodes = self.nodes;
        let m = self.geometry.point_to_index_matrix();
        out.hessians.resize(k, [[T::zero(); D]; D]);
        out.nonzero_indices.resize(D * k, 0);

        let table = SupportWeights::compute(self.order, &loc.offsets, Derivatives::Second);
        let (hessians, indices) = (&mut out.hessians, &mut out.nonzero_indices);
        recursive::expand(
            start,
            &self.strides,
            &table,
            |local, global, e: NodeHessian<T, D>| {
                hessians[local] = to_rows(&(m.transpose() * from_rows(&e.hessian) * m));
                for c in 0..D {
                    indices[c * k + local] = c * nodes + global;
                }
            },
        );

        Ok(out)
    }

    /// Continuous index, support region, and raveled index of its first node.
    ///
    /// The raveled start is only meaningful for inside points.
    #[inline]
    fn locate(&self, point: &[T; D]) -> Result<(Location<T, D>, usize), TransformError> {
        let cindex = self.geometry.point_to_continuous_index(point);
        let loc = support::locate(&cindex, self.order, self.geometry.size())?;
        let start = if loc.inside {
            (0..D)
                .map(|i| loc.region.start[i] as usize * self.strides[i])
                .sum()
        } else {
            0
        };
        Ok((loc, start))
    }

    #[inline]
    fn contract_at<C: Contraction<T, D>>(&self, loc: &Location<T, D>, start: usize) -> C {
        let weights = SupportWeights::compute(self.order, &loc.offsets, C::DERIVATIVES);
        let view = CoefficientView::raw(&self.parameters, self.nodes, self.strides);
        recursive::contract(&view, start, &weights)
    }

    /// Chain rule from index space to physical space, plus the identity.
    #[inline]
    fn physical_jacobian(&self, index_gradient: &[[T; D]; D]) -> [[T; D]; D] {
        let m = self.geometry.point_to_index_matrix();
        to_rows(&(from_rows(index_gradient) * m + SMatrix::identity()))
    }

    #[inline]
    fn physical_hessian(&self, index_hessian: &[[[T; D]; D]; D]) -> [[[T; D]; D]; D] {
        let m = self.geometry.point_to_index_matrix();
        let mt = m.transpose();
        let mut out = [[[T::zero(); D]; D]; D];
        for c in 0..D {
            out[c] = to_rows(&(mt * from_rows(&index_hessian[c]) * m));
        }
        out
    }
}
