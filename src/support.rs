//! Locate the block of control points that influence a query point.
//!
//! The support region of a spline of order `n` is `n + 1` nodes wide along
//! each axis. Its first node is `floor(x - (n - 1) / 2)`, which centres the
//! region on the query for odd orders and on the nearest node for even orders.
use crate::{SplineOrder, TransformError};
use num_traits::{Float, NumCast};

/// Integer extent of the support region of one query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SupportRegion<const D: usize> {
    /// Grid index of the first node on each axis. May be negative for queries
    /// outside the grid.
    pub start: [isize; D],
    /// Number of nodes along each axis, `order + 1`.
    pub width: usize,
}

impl<const D: usize> SupportRegion<D> {
    /// Whether the whole region lies in `[0, size)` along every axis.
    #[inline]
    pub fn fits(&self, size: &[usize; D]) -> bool {
        (0..D).all(|i| {
            self.start[i] >= 0 && (self.start[i] as usize) + self.width <= size[i]
        })
    }
}

/// Result of locating a continuous index on the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location<T: Float, const D: usize> {
    pub region: SupportRegion<D>,
    /// Fractional offset `u` in `[0, 1)` along each axis, ready for the weight function.
    pub offsets: [T; D],
    /// False if any part of the region falls outside the grid.
    pub inside: bool,
}

/// Find the support region and fractional offsets for a continuous index.
///
/// # Errors
/// * If any coordinate is not finite or its floor does not fit in an `isize`
#[inline]
pub fn locate<T: Float, const D: usize>(
    cindex: &[T; D],
    order: SplineOrder,
    size: &[usize; D],
) -> Result<Location<T, D>, TransformError> {
    let shift: T = order.start_shift();
    let mut start = [0_isize; D];
    let mut offsets = [T::zero(); D];

    for i in 0..D {
        let x = cindex[i] - shift;
        if !x.is_finite() {
            return Err(TransformError::UnrepresentableCoordinate);
        }
        let floc = x.floor();
        start[i] = <isize as NumCast>::from(floc).ok_or(TransformError::UnrepresentableCoordinate)?;
        offsets[i] = x - floc;
    }

    let region = SupportRegion {
        start,
        width: order.support(),
    };
    let inside = region.fits(size);

    Ok(Location {
        region,
        offsets,
        inside,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cubic_region_is_centred() {
        let size = [10, 10];
        let loc = locate(&[4.3_f64, 5.0], SplineOrder::Cubic, &size).unwrap();
        assert_eq!(loc.region.start, [3, 4]);
        assert_eq!(loc.region.width, 4);
        assert!((loc.offsets[0] - 0.3).abs() < 1e-12);
        assert_eq!(loc.offsets[1], 0.0);
        assert!(loc.inside);
    }

    /// Even orders centre on the nearest node
    #[test]
    fn test_even_order_convention() {
        let size = [10];

        // Quadratic: floor(x - 1/2)
        let loc = locate(&[4.3_f64], SplineOrder::Quadratic, &size).unwrap();
        assert_eq!(loc.region.start, [3]);
        assert!((loc.offsets[0] - 0.8).abs() < 1e-12);
        let loc = locate(&[4.7_f64], SplineOrder::Quadratic, &size).unwrap();
        assert_eq!(loc.region.start, [4]);
        assert!((loc.offsets[0] - 0.2).abs() < 1e-12);

        // Constant: floor(x + 1/2), i.e. round half up
        let loc = locate(&[4.49_f64], SplineOrder::Constant, &size).unwrap();
        assert_eq!(loc.region.start, [4]);
        let loc = locate(&[4.5_f64], SplineOrder::Constant, &size).unwrap();
        assert_eq!(loc.region.start, [5]);
    }

    #[test]
    fn test_linear_region() {
        let loc = locate(&[2.25_f64], SplineOrder::Linear, &[4]).unwrap();
        assert_eq!(loc.region.start, [2]);
        assert_eq!(loc.region.width, 2);
        assert!((loc.offsets[0] - 0.25).abs() < 1e-12);
        assert!(loc.inside);
    }

    #[test]
    fn test_inside_bounds() {
        let size = [10];
        let order = SplineOrder::Cubic;
        // Valid cubic range on a 10-node axis is [1, 8)
        assert!(!locate(&[0.999_f64], order, &size).unwrap().inside);
        assert!(locate(&[1.0_f64], order, &size).unwrap().inside);
        assert!(locate(&[7.999_f64], order, &size).unwrap().inside);
        assert!(!locate(&[8.0_f64], order, &size).unwrap().inside);
        assert!(!locate(&[-3.0_f64], order, &size).unwrap().inside);
    }

    #[test]
    fn test_any_axis_outside_flags_query() {
        let loc = locate(&[4.0_f64, 12.0, 4.0], SplineOrder::Cubic, &[10, 10, 10]).unwrap();
        assert!(!loc.inside);
        assert_eq!(loc.region.start, [3, 11, 3]);
    }

    #[test]
    fn test_non_finite_is_error() {
        let order = SplineOrder::Cubic;
        assert_eq!(
            locate(&[f64::NAN, 1.0], order, &[10, 10]),
            Err(TransformError::UnrepresentableCoordinate)
        );
        assert_eq!(
            locate(&[1.0, f64::INFINITY], order, &[10, 10]),
            Err(TransformError::UnrepresentableCoordinate)
        );
        assert_eq!(
            locate(&[1e300_f64], order, &[10]),
            Err(TransformError::UnrepresentableCoordinate)
        );
    }
}
