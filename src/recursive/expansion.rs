//! Per-control-point weight products built on the way down the expansion tree.
use super::Expansion;
use crate::weights::{Derivatives, SupportWeights};
use num_traits::Float;

/// Weight of one control point, `prod_d W_d[k_d]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeWeight<T: Float> {
    pub weight: T,
}

impl<T: Float, const D: usize> Expansion<T, D> for NodeWeight<T> {
    const DERIVATIVES: Derivatives = Derivatives::None;

    #[inline]
    fn one() -> Self {
        Self { weight: T::one() }
    }

    #[inline]
    fn scale(self, axis: usize, k: usize, weights: &SupportWeights<T, D>) -> Self {
        Self {
            weight: self.weight * weights.value(axis)[k],
        }
    }
}

/// Weight of one control point and its index-space gradient.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeGradient<T: Float, const D: usize> {
    pub weight: T,
    pub gradient: [T; D],
}

impl<T: Float, const D: usize> Expansion<T, D> for NodeGradient<T, D> {
    const DERIVATIVES: Derivatives = Derivatives::First;

    #[inline]
    fn one() -> Self {
        Self {
            weight: T::one(),
            gradient: [T::one(); D],
        }
    }

    #[inline]
    fn scale(mut self, axis: usize, k: usize, weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(axis)[k];
        let w1 = weights.first(axis)[k];
        self.weight = self.weight * w;
        for a in 0..D {
            let f = if a == axis { w1 } else { w };
            self.gradient[a] = self.gradient[a] * f;
        }
        self
    }
}

/// Weight of one control point with its index-space gradient and Hessian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeHessian<T: Float, const D: usize> {
    pub weight: T,
    pub gradient: [T; D],
    pub hessian: [[T; D]; D],
}

impl<T: Float, const D: usize> Expansion<T, D> for NodeHessian<T, D> {
    const DERIVATIVES: Derivatives = Derivatives::Second;

    #[inline]
    fn one() -> Self {
        Self {
            weight: T::one(),
            gradient: [T::one(); D],
            hessian: [[T::one(); D]; D],
        }
    }

    #[inline]
    fn scale(mut self, axis: usize, k: usize, weights: &SupportWeights<T, D>) -> Self {
        let w = weights.value(axis)[k];
        let w1 = weights.first(axis)[k];
        let w2 = weights.second(axis)[k];
        self.weight = self.weight * w;
        for a in 0..D {
            let f = if a == axis { w1 } else { w };
            self.gradient[a] = self.gradient[a] * f;
            for b in 0..D {
                let f = match (a == axis, b == axis) {
                    (true, true) => w2,
                    (true, false) | (false, true) => w1,
                    (false, false) => w,
                };
                self.hessian[a][b] = self.hessian[a][b] * f;
            }
        }
        self
    }
}
