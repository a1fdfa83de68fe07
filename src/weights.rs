//! Per-axis B-spline weights.
//!
//! For a spline of order `n` only `n + 1` basis functions are nonzero at any
//! location, so each axis contributes a short weight vector. The vectors are
//! evaluated from closed-form polynomials in the fractional offset `u`, which
//! is the continuous index measured from the first node of the support region
//! and shifted by `(n - 1) / 2`, so that `u` always lies in `[0, 1)`.
//!
//! For the cubic spline this is simply `u = x - floor(x)` and the four weights
//! are the cubic basis evaluated at the node offsets `{-1, 0, 1, 2}` from `floor(x)`:
//!
//! ```rust
//! use recursive_bspline::SplineOrder;
//!
//! let w = SplineOrder::Cubic.weights(0.0_f64);
//! assert!((w[0] - 1.0 / 6.0).abs() < 1e-15);
//! assert!((w[1] - 2.0 / 3.0).abs() < 1e-15);
//! assert!((w[2] - 1.0 / 6.0).abs() < 1e-15);
//! assert_eq!(w[3], 0.0);
//! ```
//!
//! Derivative weights are taken with respect to the continuous index, not
//! with respect to physical coordinates; the transform applies the
//! index-to-physical chain rule afterwards.
use crate::TransformError;
use crunchy::unroll;
use num_traits::Float;

/// Largest support width of any supported spline order.
pub const MAX_SUPPORT: usize = 4;

/// Polynomial degree of the B-spline basis.
///
/// The order is fixed for the lifetime of a transform and determines the
/// support width (`order + 1` control points per axis).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SplineOrder {
    /// Piecewise constant, nearest-node.
    Constant,
    /// Piecewise linear.
    Linear,
    /// Quadratic, continuous first derivative.
    Quadratic,
    /// Cubic, continuous second derivative.
    #[default]
    Cubic,
}

impl SplineOrder {
    /// Integer polynomial degree.
    #[inline]
    pub const fn degree(self) -> usize {
        match self {
            SplineOrder::Constant => 0,
            SplineOrder::Linear => 1,
            SplineOrder::Quadratic => 2,
            SplineOrder::Cubic => 3,
        }
    }

    /// Number of nonzero basis functions along one axis.
    #[inline]
    pub const fn support(self) -> usize {
        self.degree() + 1
    }

    /// Number of control points in the D-dimensional support region, `(order + 1)^D`.
    #[inline]
    pub const fn support_volume(self, ndims: usize) -> usize {
        self.support().pow(ndims as u32)
    }

    /// Offset `(order - 1) / 2` between the continuous index and the
    /// point where `u = 0` inside the first support cell.
    #[inline]
    pub fn start_shift<T: Float>(self) -> T {
        let one = T::one();
        let half = one / (one + one);
        match self {
            SplineOrder::Constant => -half,
            SplineOrder::Linear => T::zero(),
            SplineOrder::Quadratic => half,
            SplineOrder::Cubic => one,
        }
    }

    /// Basis values at fractional offset `u` in `[0, 1)`.
    ///
    /// Only the first `self.support()` entries are meaningful; the rest are zero.
    #[inline]
    pub fn weights<T: Float>(self, u: T) -> [T; MAX_SUPPORT] {
        let zero = T::zero();
        let one = T::one();
        let two = one + one;
        let three = two + one;
        let four = two + two;
        let six = three + three;

        match self {
            SplineOrder::Constant => [one, zero, zero, zero],
            SplineOrder::Linear => [one - u, u, zero, zero],
            SplineOrder::Quadratic => {
                let v = one - u;
                let u2 = u * u;
                [v * v / two, -u2 + u + one / two, u2 / two, zero]
            }
            SplineOrder::Cubic => {
                let v = one - u;
                let u2 = u * u;
                let u3 = u2 * u;
                [
                    v * v * v / six,
                    (three * u3 - six * u2 + four) / six,
                    (-three * u3 + three * u2 + three * u + one) / six,
                    u3 / six,
                ]
            }
        }
    }

    /// First derivatives of the basis with respect to the continuous index.
    #[inline]
    pub fn derivative_weights<T: Float>(self, u: T) -> [T; MAX_SUPPORT] {
        let zero = T::zero();
        let one = T::one();
        let two = one + one;
        let three = two + one;
        let four = two + two;

        match self {
            // Derivative of a step is zero away from the discontinuity
            SplineOrder::Constant => [zero; MAX_SUPPORT],
            SplineOrder::Linear => [-one, one, zero, zero],
            SplineOrder::Quadratic => [u - one, one - two * u, u, zero],
            SplineOrder::Cubic => {
                let v = one - u;
                let u2 = u * u;
                [
                    -(v * v) / two,
                    (three * u2 - four * u) / two,
                    (-three * u2 + two * u + one) / two,
                    u2 / two,
                ]
            }
        }
    }

    /// Second derivatives of the basis with respect to the continuous index.
    #[inline]
    pub fn second_derivative_weights<T: Float>(self, u: T) -> [T; MAX_SUPPORT] {
        let zero = T::zero();
        let one = T::one();
        let two = one + one;
        let three = two + one;

        match self {
            SplineOrder::Constant | SplineOrder::Linear => [zero; MAX_SUPPORT],
            SplineOrder::Quadratic => [one, -two, one, zero],
            SplineOrder::Cubic => [one - u, three * u - two, -three * u + one, u],
        }
    }
}

impl TryFrom<usize> for SplineOrder {
    type Error = TransformError;

    fn try_from(degree: usize) -> Result<Self, Self::Error> {
        match degree {
            0 => Ok(SplineOrder::Constant),
            1 => Ok(SplineOrder::Linear),
            2 => Ok(SplineOrder::Quadratic),
            3 => Ok(SplineOrder::Cubic),
            _ => Err(TransformError::UnsupportedOrder(degree)),
        }
    }
}

/// Which derivative levels of the weights a caller needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Derivatives {
    None,
    First,
    Second,
}

/// Weight table for all axes of one query point.
///
/// Storage is fixed at `MAX_SUPPORT` entries per axis so that the table lives
/// on the stack; only the first `support` entries of each row are populated.
/// Derivative rows that were not requested are left at zero.
#[derive(Clone, Copy, Debug)]
pub struct SupportWeights<T: Float, const D: usize> {
    support: usize,
    derivatives: Derivatives,
    value: [[T; MAX_SUPPORT]; D],
    first: [[T; MAX_SUPPORT]; D],
    second: [[T; MAX_SUPPORT]; D],
}

impl<T: Float, const D: usize> SupportWeights<T, D> {
    /// Evaluate the weights of every axis at the fractional offsets produced
    /// by [`crate::support::locate`].
    #[inline]
    pub fn compute(order: SplineOrder, offsets: &[T; D], derivatives: Derivatives) -> Self {
        const { assert!(D <= crate::MAX_DIMS, "Weight tables hold at most 4 axes") };
        let mut value = [[T::zero(); MAX_SUPPORT]; D];
        let mut first = [[T::zero(); MAX_SUPPORT]; D];
        let mut second = [[T::zero(); MAX_SUPPORT]; D];

        unroll! {
            for i < 4 in 0..D {
                let u = offsets[i];
                value[i] = order.weights(u);
                if derivatives >= Derivatives::First {
                    first[i] = order.derivative_weights(u);
                }
                if derivatives >= Derivatives::Second {
                    second[i] = order.second_derivative_weights(u);
                }
            }
        }

        Self {
            support: order.support(),
            derivatives,
            value,
            first,
            second,
        }
    }

    /// Support width along each axis.
    #[inline]
    pub fn support(&self) -> usize {
        self.support
    }

    /// Derivative levels that were evaluated.
    #[inline]
    pub fn derivatives(&self) -> Derivatives {
        self.derivatives
    }

    /// Basis values along `axis`.
    #[inline]
    pub fn value(&self, axis: usize) -> &[T] {
        &self.value[axis][..self.support]
    }

    /// First-derivative weights along `axis`.
    #[inline]
    pub fn first(&self, axis: usize) -> &[T] {
        &self.first[axis][..self.support]
    }

    /// Second-derivative weights along `axis`.
    #[inline]
    pub fn second(&self, axis: usize) -> &[T] {
        &self.second[axis][..self.support]
    }
}
