//! Tuples carried up the contraction tree.
//!
//! All three track every output component at once, since the component grids
//! share strides and are read at the same raveled node.
use super::Contraction;
use crate::weights::{Derivatives, SupportWeights};
use num_traits::Float;

/// Interpolated value per output component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value<T: Float, const D: usize> {
    pub value: [T; D],
}

impl<T: Float, const D: usize> Contraction<T, D> for Value<T, D> {
    const DERIVATIVES: Derivatives = Derivatives::None;

    #[inline]
    fn zero() -> Self {
        Self {
            value: [T::zero(); D],
        }
    }

    #[inline]
    fn base(samples: &[[T; D]], weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(0);
        let mut out = Self::zero();
        for (o, s) in samples.iter().enumerate() {
            for c in 0..D {
                out.value[c] = out.value[c] + w[o] * s[c];
            }
        }
        out
    }

    #[inline]
    fn combine(children: &[Self], axis: usize, weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(axis);
        let mut out = Self::zero();
        for (o, child) in children.iter().enumerate() {
            for c in 0..D {
                out.value[c] = out.value[c] + w[o] * child.value[c];
            }
        }
        out
    }
}

/// Value and index-space gradient, `gradient[component][axis]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueGradient<T: Float, const D: usize> {
    pub value: [T; D],
    pub gradient: [[T; D]; D],
}

impl<T: Float, const D: usize> Contraction<T, D> for ValueGradient<T, D> {
    const DERIVATIVES: Derivatives = Derivatives::First;

    #[inline]
    fn zero() -> Self {
        Self {
            value: [T::zero(); D],
            gradient: [[T::zero(); D]; D],
        }
    }

    #[inline]
    fn base(samples: &[[T; D]], weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(0);
        let w1 = weights.first(0);
        let mut out = Self::zero();
        for (o, s) in samples.iter().enumerate() {
            for c in 0..D {
                out.value[c] = out.value[c] + w[o] * s[c];
                out.gradient[c][0] = out.gradient[c][0] + w1[o] * s[c];
            }
        }
        out
    }

    #[inline]
    fn combine(children: &[Self], axis: usize, weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(axis);
        let w1 = weights.first(axis);
        let mut out = Self::zero();
        for (o, child) in children.iter().enumerate() {
            for c in 0..D {
                out.value[c] = out.value[c] + w[o] * child.value[c];
                // Axes below this one already carry their derivative factor
                for a in 0..axis {
                    out.gradient[c][a] = out.gradient[c][a] + w[o] * child.gradient[c][a];
                }
                out.gradient[c][axis] = out.gradient[c][axis] + w1[o] * child.value[c];
            }
        }
        out
    }
}

/// Value, index-space gradient, and symmetric index-space Hessian,
/// `hessian[component][axis][axis]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValueGradientHessian<T: Float, const D: usize> {
    pub value: [T; D],
    pub gradient: [[T; D]; D],
    pub hessian: [[[T; D]; D]; D],
}

impl<T: Float, const D: usize> Contraction<T, D> for ValueGradientHessian<T, D> {
    const DERIVATIVES: Derivatives = Derivatives::Second;

    #[inline]
    fn zero() -> Self {
        Self {
            value: [T::zero(); D],
            gradient: [[T::zero(); D]; D],
            hessian: [[[T::zero(); D]; D]; D],
        }
    }

    #[inline]
    fn base(samples: &[[T; D]], weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(0);
        let w1 = weights.first(0);
        let w2 = weights.second(0);
        let mut out = Self::zero();
        for (o, s) in samples.iter().enumerate() {
            for c in 0..D {
                out.value[c] = out.value[c] + w[o] * s[c];
                out.gradient[c][0] = out.gradient[c][0] + w1[o] * s[c];
                out.hessian[c][0][0] = out.hessian[c][0][0] + w2[o] * s[c];
            }
        }
        out
    }

    #[inline]
    fn combine(children: &[Self], axis: usize, weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(axis);
        let w1 = weights.first(axis);
        let w2 = weights.second(axis);
        let mut out = Self::zero();
        for (o, child) in children.iter().enumerate() {
            for c in 0..D {
                let v = child.value[c];
                out.value[c] = out.value[c] + w[o] * v;
                for a in 0..axis {
                    out.gradient[c][a] = out.gradient[c][a] + w[o] * child.gradient[c][a];
                    for b in 0..axis {
                        out.hessian[c][a][b] =
                            out.hessian[c][a][b] + w[o] * child.hessian[c][a][b];
                    }
                    // Mixed term: first derivative here times first derivative below
                    let mixed = out.hessian[c][axis][a] + w1[o] * child.gradient[c][a];
                    out.hessian[c][axis][a] = mixed;
                    out.hessian[c][a][axis] = mixed;
                }
                out.gradient[c][axis] = out.gradient[c][axis] + w1[o] * v;
                out.hessian[c][axis][axis] = out.hessian[c][axis][axis] + w2[o] * v;
            }
        }
        out
    }
}
