//! Fixed-depth recursive evaluation of a tensor-product B-spline.
//!
//! Two traversals of the `(order + 1)^D` support region are provided.
//!
//! [`contract`] reduces the coefficients to a value and, optionally, the
//! index-space gradient and Hessian. It peels one axis per recursion level:
//! the base case on axis 0 forms `order + 1`-term dot products of raw
//! coefficients with the axis-0 weights, and every higher axis `k` combines the
//! `order + 1` tuples returned for its slabs using the axis-`k` weights. Each
//! tuple carries every partial sum needed further up, so a single combination
//! step per axis serves the value, all gradient entries, and all Hessian
//! entries at once.
//!
//! ```text
//!   axis 2          axis 1          axis 0 (base)
//!   combine(W2) <-- combine(W1) <-- dot(W0, c[0..n])
//!               <-- combine(W1) <-- dot(W0, c[n..2n])
//!               ...
//! ```
//!
//! [`expand`] walks the same tree outward, multiplying per-axis weights to
//! enumerate the weight of every individual control point together with its
//! raveled grid index. This is what the derivative with respect to the
//! parameters needs, since those derivatives are the weights themselves.
//!
//! Recursion depth is exactly `D`; all intermediate storage is fixed-size
//! and lives on the stack.
use crate::weights::{Derivatives, SupportWeights, MAX_SUPPORT};
use crate::MAX_DIMS;
use num_traits::Float;

mod contraction;
mod expansion;

pub use contraction::{Value, ValueGradient, ValueGradientHessian};
pub use expansion::{NodeGradient, NodeHessian, NodeWeight};

/// Read-only view of the coefficients of all output components.
///
/// The parameter vector holds `D` grids back to back, each raveled with axis 0
/// fastest. All grids share one set of strides.
#[derive(Clone, Copy, Debug)]
pub struct CoefficientView<'a, T: Float, const D: usize> {
    parameters: &'a [T],
    nodes: usize,
    strides: [usize; D],
}

impl<'a, T: Float, const D: usize> CoefficientView<'a, T, D> {
    /// Wrap a parameter vector of `D * nodes` entries.
    ///
    /// Returns `None` if the length does not match.
    pub fn new(parameters: &'a [T], nodes: usize, strides: [usize; D]) -> Option<Self> {
        if parameters.len() != D * nodes {
            return None;
        }
        Some(Self {
            parameters,
            nodes,
            strides,
        })
    }

    /// Wrap a parameter vector whose length the caller has already validated.
    #[inline]
    pub(crate) fn raw(parameters: &'a [T], nodes: usize, strides: [usize; D]) -> Self {
        debug_assert_eq!(parameters.len(), D * nodes);
        Self {
            parameters,
            nodes,
            strides,
        }
    }

    /// Coefficients of every output component at one raveled node.
    #[inline]
    fn node(&self, index: usize) -> [T; D] {
        let mut out = [T::zero(); D];
        for c in 0..D {
            out[c] = self.parameters[c * self.nodes + index];
        }
        out
    }
}

/// Partial sums carried up one level of the contraction.
///
/// Implementors decide which derivative levels they track. The gradient and
/// Hessian entries for axes that have not been reached yet are left at zero and
/// filled in by the combination step on their own axis.
pub trait Contraction<T: Float, const D: usize>: Copy {
    /// Weight derivatives this tuple consumes.
    const DERIVATIVES: Derivatives;

    fn zero() -> Self;

    /// Reduce the `order + 1` raw coefficients along axis 0.
    fn base(samples: &[[T; D]], weights: &SupportWeights<T, D>) -> Self;

    /// Reduce the `order + 1` tuples of the slabs along `axis`.
    fn combine(children: &[Self], axis: usize, weights: &SupportWeights<T, D>) -> Self;
}

/// Contract the support region whose first node has raveled index `start`.
///
/// The weights must have been computed with at least `C::DERIVATIVES`, and the
/// region must lie entirely inside the grid.
#[inline]
pub fn contract<T: Float, C: Contraction<T, D>, const D: usize>(
    coefficients: &CoefficientView<'_, T, D>,
    start: usize,
    weights: &SupportWeights<T, D>,
) -> C {
    const {
        assert!(
            D > 0 && D <= MAX_DIMS,
            "Recursive evaluation is defined for 1-4 dimensions"
        )
    };
    debug_assert!(weights.derivatives() >= C::DERIVATIVES);
    populate(D - 1, start, coefficients, weights)
}

/// One level of the contraction tree.
#[inline]
fn populate<T: Float, C: Contraction<T, D>, const D: usize>(
    axis: usize,
    offset: usize,
    coefficients: &CoefficientView<'_, T, D>,
    weights: &SupportWeights<T, D>,
) -> C {
    let n = weights.support();
    let stride = coefficients.strides[axis];

    match axis {
        // Leaves: contiguous run of raw coefficients
        0 => {
            let mut samples = [[T::zero(); D]; MAX_SUPPORT];
            for o in 0..n {
                samples[o] = coefficients.node(offset + o * stride);
            }
            C::base(&samples[..n], weights)
        }
        _ => {
            let mut children = [C::zero(); MAX_SUPPORT];
            for o in 0..n {
                children[o] = populate(axis - 1, offset + o * stride, coefficients, weights);
            }
            C::combine(&children[..n], axis, weights)
        }
    }
}

/// Product of per-axis weights accumulated on the way down the expansion tree.
pub trait Expansion<T: Float, const D: usize>: Copy {
    /// Weight derivatives this product consumes.
    const DERIVATIVES: Derivatives;

    /// Empty product.
    fn one() -> Self;

    /// Multiply in the factor of node `k` along `axis`.
    fn scale(self, axis: usize, k: usize, weights: &SupportWeights<T, D>) -> Self;
}

/// Enumerate every control point of the support region whose first node has
/// raveled index `start`.
///
/// `sink(local, global, product)` is called once per control point, where
/// `local` is the raveled position inside the support region (axis 0 fastest)
/// and `global` is the raveled grid index.
#[inline]
pub fn expand<T, E, F, const D: usize>(
    start: usize,
    strides: &[usize; D],
    weights: &SupportWeights<T, D>,
    mut sink: F,
) where
    T: Float,
    E: Expansion<T, D>,
    F: FnMut(usize, usize, E),
{
    const {
        assert!(
            D > 0 && D <= MAX_DIMS,
            "Recursive evaluation is defined for 1-4 dimensions"
        )
    };
    debug_assert!(weights.derivatives() >= E::DERIVATIVES);

    let n = weights.support();
    let mut local_strides = [1_usize; D];
    for i in 1..D {
        local_strides[i] = local_strides[i - 1] * n;
    }

    spread(
        D - 1,
        E::one(),
        0,
        start,
        strides,
        &local_strides,
        weights,
        &mut sink,
    );
}

/// One level of the expansion tree.
#[allow(clippy::too_many_arguments)]
#[inline]
fn spread<T, E, F, const D: usize>(
    axis: usize,
    partial: E,
    local: usize,
    global: usize,
    strides: &[usize; D],
    local_strides: &[usize; D],
    weights: &SupportWeights<T, D>,
    sink: &mut F,
) where
    T: Float,
    E: Expansion<T, D>,
    F: FnMut(usize, usize, E),
{
    for k in 0..weights.support() {
        let product = partial.scale(axis, k, weights);
        let l = local + k * local_strides[axis];
        let g = global + k * strides[axis];
        match axis {
            0 => sink(l, g, product),
            _ => spread(
                axis - 1,
                product,
                l,
                g,
                strides,
                local_strides,
                weights,
                sink,
            ),
        }
    }
}
