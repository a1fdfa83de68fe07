//! Physical layout of the control-point grid.
//!
//! A node with integer index `i` sits at the physical point
//! `origin + direction * diag(spacing) * i`. Columns of `direction` are the
//! physical directions of the grid axes. Nodes are raveled with axis 0
//! fastest, which is also the layout of each component of the parameter vector.
use crate::TransformError;
use nalgebra::{RealField, SMatrix, SVector, Scalar};
use num_traits::Float;

/// Size, spacing, origin, and orientation of a regular control-point grid.
///
/// All output components of a transform share one geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry<T: Float + RealField, const D: usize> {
    size: [usize; D],
    nodes: usize,
    spacing: [T; D],
    origin: [T; D],
    direction: SMatrix<T, D, D>,
    /// `direction * diag(spacing)`
    index_to_point: SMatrix<T, D, D>,
    /// Inverse of `index_to_point`
    point_to_index: SMatrix<T, D, D>,
}

impl<T: Float + RealField, const D: usize> GridGeometry<T, D> {
    /// Build a geometry, precomputing the point-to-index mapping.
    ///
    /// `direction` is given row-major, with the grid axes as its columns.
    ///
    /// # Errors
    /// * If any spacing is zero, negative, or not finite
    /// * If the number of parameters `D * prod(size)` overflows `usize`
    /// * If the direction matrix is singular
    pub fn new(
        size: [usize; D],
        spacing: [T; D],
        origin: [T; D],
        direction: [[T; D]; D],
    ) -> Result<Self, TransformError> {
        for (axis, &s) in spacing.iter().enumerate() {
            if !(Float::is_finite(s) && s > T::zero()) {
                return Err(TransformError::InvalidSpacing { axis });
            }
        }

        // Every component owns one coefficient per node, so D * nodes must fit too
        let nodes = size
            .iter()
            .try_fold(1_usize, |acc, &n| acc.checked_mul(n))
            .filter(|n| n.checked_mul(D).is_some())
            .ok_or(TransformError::GridTooLarge)?;

        let direction = from_rows(&direction);
        let index_to_point = direction * SMatrix::from_diagonal(&SVector::from(spacing));
        let point_to_index = index_to_point
            .try_inverse()
            .filter(|m| m.iter().all(|&x| Float::is_finite(x)))
            .ok_or(TransformError::SingularDirection)?;

        if !is_orthonormal(&direction) {
            log::warn!(
                "Grid direction matrix is not orthonormal; control points will be sheared or scaled beyond their spacing"
            );
        }

        Ok(Self {
            size,
            nodes,
            spacing,
            origin,
            direction,
            index_to_point,
            point_to_index,
        })
    }

    /// Geometry with identity direction.
    ///
    /// # Errors
    /// * If any spacing is zero, negative, or not finite
    /// * If the grid is too large to address
    pub fn axis_aligned(
        size: [usize; D],
        spacing: [T; D],
        origin: [T; D],
    ) -> Result<Self, TransformError> {
        Self::new(size, spacing, origin, to_rows(&SMatrix::identity()))
    }

    /// Number of nodes along each axis.
    #[inline]
    pub fn size(&self) -> &[usize; D] {
        &self.size
    }

    /// Node spacing along each axis, in physical units.
    #[inline]
    pub fn spacing(&self) -> &[T; D] {
        &self.spacing
    }

    /// Physical location of node zero.
    #[inline]
    pub fn origin(&self) -> &[T; D] {
        &self.origin
    }

    /// Axis directions as matrix columns.
    #[inline]
    pub fn direction(&self) -> &SMatrix<T, D, D> {
        &self.direction
    }

    /// Jacobian of the continuous index with respect to the physical point.
    #[inline]
    pub fn point_to_index_matrix(&self) -> &SMatrix<T, D, D> {
        &self.point_to_index
    }

    /// Jacobian of the physical point with respect to the continuous index.
    #[inline]
    pub fn index_to_point_matrix(&self) -> &SMatrix<T, D, D> {
        &self.index_to_point
    }

    /// Total number of nodes, which is also the number of parameters per component.
    #[inline]
    pub fn number_of_nodes(&self) -> usize {
        self.nodes
    }

    /// Distance in the raveled node array between neighbours along each axis.
    #[inline]
    pub fn strides(&self) -> [usize; D] {
        let mut strides = [1_usize; D];
        let mut acc = 1;
        for i in 0..D {
            strides[i] = acc;
            acc *= self.size[i];
        }
        strides
    }

    /// Raveled position of an integer node index.
    #[inline]
    pub fn linear_index(&self, index: &[usize; D]) -> usize {
        let strides = self.strides();
        (0..D).map(|i| index[i] * strides[i]).sum()
    }

    /// Map a physical point to fractional grid-index coordinates.
    #[inline]
    pub fn point_to_continuous_index(&self, point: &[T; D]) -> [T; D] {
        let rel = SVector::<T, D>::from_fn(|i, _| point[i] - self.origin[i]);
        (self.point_to_index * rel).into()
    }

    /// Map fractional grid-index coordinates to a physical point.
    #[inline]
    pub fn index_to_point(&self, cindex: &[T; D]) -> [T; D] {
        let point = self.index_to_point * SVector::from(*cindex) + SVector::from(self.origin);
        point.into()
    }
}

/// Square matrix from a row-major nested array.
#[inline]
pub(crate) fn from_rows<T: Scalar, const D: usize>(rows: &[[T; D]; D]) -> SMatrix<T, D, D> {
    SMatrix::from_fn(|r, c| rows[r][c].clone())
}

/// Row-major nested array of a square matrix.
#[inline]
pub(crate) fn to_rows<T: Scalar, const D: usize>(m: &SMatrix<T, D, D>) -> [[T; D]; D] {
    // Array conversion is column-major
    m.transpose().into()
}

/// Check `d^T d == I` to a loose tolerance.
fn is_orthonormal<T: Float + RealField, const D: usize>(d: &SMatrix<T, D, D>) -> bool {
    let tol = <T as num_traits::NumCast>::from(1e-6).unwrap_or_else(<T as Float>::epsilon);
    (d.tr_mul(d) - SMatrix::<T, D, D>::identity())
        .iter()
        .all(|&x| Float::abs(x) < tol)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_axis_aligned_mapping() {
        let g = GridGeometry::axis_aligned([10, 8], [2.0_f64, 0.5], [-3.0, 1.0]).unwrap();
        let cindex = g.point_to_continuous_index(&[1.0, 2.0]);
        assert_abs_diff_eq!(cindex[0], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(cindex[1], 2.0, epsilon = 1e-14);
        assert_eq!(g.number_of_nodes(), 80);
        assert_eq!(g.strides(), [1, 10]);
        assert_eq!(g.linear_index(&[3, 2]), 23);
    }

    #[test]
    fn test_rotated_roundtrip() {
        let (s, c) = Float::sin_cos(0.3_f64);
        let direction = [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]];
        let g = GridGeometry::new([6, 7, 8], [1.5, 2.0, 0.75], [10.0, -4.0, 2.5], direction)
            .unwrap();
        let p = [12.25, -1.5, 4.0];
        let back = g.index_to_point(&g.point_to_continuous_index(&p));
        for i in 0..3 {
            assert_abs_diff_eq!(back[i], p[i], epsilon = 1e-12);
        }

        // Stepping one index along axis 1 moves by spacing[1] along column 1 of the direction
        let p0 = g.index_to_point(&[1.0, 1.0, 1.0]);
        let p1 = g.index_to_point(&[1.0, 2.0, 1.0]);
        assert_abs_diff_eq!(p1[0] - p0[0], -s * 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p1[1] - p0[1], c * 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p1[2] - p0[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_spacing() {
        assert_eq!(
            GridGeometry::axis_aligned([4, 4], [1.0_f64, 0.0], [0.0, 0.0]),
            Err(TransformError::InvalidSpacing { axis: 1 })
        );
        assert_eq!(
            GridGeometry::axis_aligned([4, 4], [-1.0_f64, 1.0], [0.0, 0.0]),
            Err(TransformError::InvalidSpacing { axis: 0 })
        );
        assert_eq!(
            GridGeometry::axis_aligned([4], [f64::NAN], [0.0]),
            Err(TransformError::InvalidSpacing { axis: 0 })
        );
    }

    #[test]
    fn test_extreme_anisotropic_spacing() {
        // Singularity is judged on the matrix itself, not on a fixed pivot tolerance
        let g = GridGeometry::axis_aligned([6, 6], [1e-9_f64, 1e7], [0.0, 0.0]).unwrap();
        let cindex = g.point_to_continuous_index(&[2e-9, 3e7]);
        assert_abs_diff_eq!(cindex[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(cindex[1], 3.0, epsilon = 1e-9);
        let back = g.index_to_point(&cindex);
        assert_abs_diff_eq!(back[0], 2e-9, epsilon = 1e-18);
        assert_abs_diff_eq!(back[1], 3e7, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_unaddressable_grid() {
        assert_eq!(
            GridGeometry::axis_aligned([1 << 40, 1 << 30], [1.0_f64, 1.0], [0.0, 0.0]),
            Err(TransformError::GridTooLarge)
        );
        // Node count fits, but the D-component parameter vector does not
        assert_eq!(
            GridGeometry::axis_aligned([usize::MAX / 2 + 1, 1], [1.0_f64, 1.0], [0.0, 0.0]),
            Err(TransformError::GridTooLarge)
        );
        assert!(GridGeometry::axis_aligned([usize::MAX / 2, 1], [1.0_f64, 1.0], [0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_rejects_singular_direction() {
        let direction = [[1.0_f64, 2.0], [0.5, 1.0]];
        assert_eq!(
            GridGeometry::new([4, 4], [1.0, 1.0], [0.0, 0.0], direction),
            Err(TransformError::SingularDirection)
        );
    }
}
