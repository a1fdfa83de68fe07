//! Sparse derivative outputs of the transform with respect to its parameters.
//!
//! The derivative of output component `c` with respect to parameter `(c', j)`
//! is zero unless `c == c'` and node `j` is in the support region, so each
//! of these types stores only the per-node factor once and expands it into the
//! block-diagonal layout on request. Columns follow `nonzero_indices`:
//! component-major, then raveled support position with axis 0 fastest.
use alloc::vec::Vec;
use num_traits::Float;

/// Derivative of the transformed point with respect to the parameters,
/// a `D x (D * (order + 1)^D)` block-diagonal matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterJacobian<T: Float, const D: usize> {
    pub(crate) weights: Vec<T>,
    pub(crate) nonzero_indices: Vec<usize>,
}

impl<T: Float, const D: usize> Default for ParameterJacobian<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float, const D: usize> ParameterJacobian<T, D> {
    /// Empty Jacobian, to be filled by [`crate::BSplineTransform::jacobian_into`].
    pub fn new() -> Self {
        Self {
            weights: Vec::new(),
            nonzero_indices: Vec::new(),
        }
    }

    /// Weight of each support node; the same for every output component.
    #[inline]
    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    /// Global parameter index of each column.
    #[inline]
    pub fn nonzero_indices(&self) -> &[usize] {
        &self.nonzero_indices
    }

    /// True for points outside the grid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nonzero_indices.is_empty()
    }

    /// Number of columns, `D * (order + 1)^D` or zero.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.nonzero_indices.len()
    }

    /// Entry `(row, col)` of the dense matrix.
    ///
    /// # Panics
    /// * If `row >= D` or `col >= self.ncols()`
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < D && col < self.ncols(), "Index out of bounds");
        let k = self.weights.len();
        if col / k == row {
            self.weights[col % k]
        } else {
            T::zero()
        }
    }

    /// Dense row-major matrix, `D` rows by `self.ncols()` columns.
    pub fn to_dense(&self) -> Vec<T> {
        let ncols = self.ncols();
        let k = self.weights.len();
        let mut out = alloc::vec![T::zero(); D * ncols];
        for row in 0..D {
            out[row * ncols + row * k..row * ncols + (row + 1) * k].copy_from_slice(&self.weights);
        }
        out
    }

    pub(crate) fn clear(&mut self) {
        self.weights.clear();
        self.nonzero_indices.clear();
    }
}

/// Derivative of the spatial Jacobian with respect to the parameters.
///
/// Column `col` is a `D x D` matrix whose only nonzero row is the output
/// component that `col` belongs to, holding the physical-space gradient of
/// that node's weight.
#[derive(Clone, Debug, PartialEq)]
pub struct JacobianOfSpatialJacobian<T: Float, const D: usize> {
    pub(crate) gradients: Vec<[T; D]>,
    pub(crate) nonzero_indices: Vec<usize>,
}

impl<T: Float, const D: usize> Default for JacobianOfSpatialJacobian<T, D> {
    fn default() -> Self {
        Self {
            gradients: Vec::new(),
            nonzero_indices: Vec::new(),
        }
    }
}

impl<T: Float, const D: usize> JacobianOfSpatialJacobian<T, D> {
    /// Physical gradient of each support node's weight.
    #[inline]
    pub fn gradients(&self) -> &[[T; D]] {
        &self.gradients
    }

    #[inline]
    pub fn nonzero_indices(&self) -> &[usize] {
        &self.nonzero_indices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nonzero_indices.is_empty()
    }

    /// Derivative of the spatial Jacobian with respect to parameter column `col`.
    ///
    /// # Panics
    /// * If `col` is out of bounds
    pub fn get(&self, col: usize) -> [[T; D]; D] {
        let k = self.gradients.len();
        assert!(col < self.nonzero_indices.len(), "Index out of bounds");
        let mut out = [[T::zero(); D]; D];
        out[col / k] = self.gradients[col % k];
        out
    }
}

/// Derivative of the spatial Hessian with respect to the parameters.
///
/// Column `col` is a set of `D` Hessians of which only the one for its own
/// output component is nonzero.
#[derive(Clone, Debug, PartialEq)]
pub struct JacobianOfSpatialHessian<T: Float, const D: usize> {
    pub(crate) hessians: Vec<[[T; D]; D]>,
    pub(crate) nonzero_indices: Vec<usize>,
}

impl<T: Float, const D: usize> Default for JacobianOfSpatialHessian<T, D> {
    fn default() -> Self {
        Self {
            hessians: Vec::new(),
            nonzero_indices: Vec::new(),
        }
    }
}

impl<T: Float, const D: usize> JacobianOfSpatialHessian<T, D> {
    /// Physical Hessian of each support node's weight.
    #[inline]
    pub fn hessians(&self) -> &[[[T; D]; D]] {
        &self.hessians
    }

    #[inline]
    pub fn nonzero_indices(&self) -> &[usize] {
        &self.nonzero_indices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nonzero_indices.is_empty()
    }

    /// Derivative of the spatial Hessian with respect to parameter column `col`.
    ///
    /// # Panics
    /// * If `col` is out of bounds
    pub fn get(&self, col: usize) -> [[[T; D]; D]; D] {
        let k = self.hessians.len();
        assert!(col < self.nonzero_indices.len(), "Index out of bounds");
        let mut out = [[[T::zero(); D]; D]; D];
        out[col / k] = self.hessians[col % k];
        out
    }
}
