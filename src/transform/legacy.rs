//! Flat evaluation by direct iteration over the support region.
use super::{BSplineTransform, MappedPoint};
use crate::weights::{Derivatives, SupportWeights};
use crate::TransformError;
use nalgebra::RealField;
use num_traits::Float;

impl<T: Float + RealField, const D: usize> BSplineTransform<T, D> {
    /// Map a point by visiting each of the `(order + 1)^D` support nodes with
    /// an odometer over the per-axis offsets, multiplying the weights afresh
    /// at every node.
    ///
    /// Gives the same result as [`BSplineTransform::transform_point`] up to
    /// summation order, at several times the cost. Kept for cross-checking.
    ///
    /// # Errors
    /// * If the point cannot be mapped to a grid index
    pub fn transform_point_old(&self, point: &[T; D]) -> Result<MappedPoint<T, D>, TransformError> {
        let (loc, start) = self.locate(point)?;
        if !loc.inside {
            return Ok(MappedPoint {
                point: *point,
                inside: false,
            });
        }

        let weights = SupportWeights::compute(self.order, &loc.offsets, Derivatives::None);
        let n = weights.support();

        let mut displacement = [T::zero(); D];
        let mut digits = [0_usize; D];
        loop {
            let mut w = T::one();
            let mut index = start;
            for i in 0..D {
                w = w * weights.value(i)[digits[i]];
                index += digits[i] * self.strides[i];
            }
            for (c, d) in displacement.iter_mut().enumerate() {
                *d = *d + w * self.parameters[c * self.nodes + index];
            }

            // Advance, axis 0 fastest
            let mut axis = 0;
            while axis < D {
                digits[axis] += 1;
                if digits[axis] < n {
                    break;
                }
                digits[axis] = 0;
                axis += 1;
            }
            if axis == D {
                break;
            }
        }

        let mut mapped = *point;
        for i in 0..D {
            mapped[i] = mapped[i] + displacement[i];
        }
        Ok(MappedPoint {
            point: mapped,
            inside: true,
        })
    }
}
