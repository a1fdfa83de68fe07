//! Convenience methods for building observation points, echoing
//! the grid helpers common in scripting languages.
use crate::{GridGeometry, SplineOrder};
use itertools::Itertools;
use nalgebra::RealField;
use num_traits::{Float, NumCast};

/// Generates evenly spaced values from start to stop,
/// including the endpoint.
///
/// Returns `[start]` for `n == 1` and an empty vector for `n == 0`.
pub fn linspace<T>(start: T, stop: T, n: usize) -> Vec<T>
where
    T: Float,
{
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let steps = <T as NumCast>::from(n - 1).unwrap_or_else(T::infinity);
            let dx: T = (stop - start) / steps;
            (0..n)
                .map(|i| start + <T as NumCast>::from(i).unwrap_or_else(T::nan) * dx)
                .collect()
        }
    }
}

/// Regular lattice of physical points covering the region where a transform
/// of the given order is evaluated, `per_axis` points along each grid axis.
///
/// The lattice spans the half-open range of valid continuous indices, so every
/// point lies inside. Points are ordered with the last axis varying fastest.
pub fn sample_lattice<T, const D: usize>(
    geometry: &GridGeometry<T, D>,
    order: SplineOrder,
    per_axis: usize,
) -> Vec<[T; D]>
where
    T: Float + RealField,
{
    let shift: T = order.start_shift();
    let width = order.support();
    let axes: Vec<Vec<T>> = geometry
        .size()
        .iter()
        .map(|&size| {
            // Stop one step short of the open upper end
            let cells = size.saturating_sub(width) + 1;
            let span = <T as NumCast>::from(cells).unwrap_or_else(T::zero);
            let step = span / <T as NumCast>::from(per_axis.max(1)).unwrap_or_else(T::one);
            let last = <T as NumCast>::from(per_axis.saturating_sub(1)).unwrap_or_else(T::zero);
            linspace(shift, shift + last * step, per_axis)
        })
        .collect();

    axes.iter()
        .multi_cartesian_product()
        .map(|cindex| {
            let mut c = [T::zero(); D];
            for (dst, src) in c.iter_mut().zip(cindex) {
                *dst = *src;
            }
            geometry.index_to_point(&c)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::BSplineTransform;

    #[test]
    fn test_linspace() {
        let x = linspace(-1.0_f64, 1.0, 5);
        assert_eq!(x, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(3.0_f64, 4.0, 1), vec![3.0]);
        assert!(linspace(3.0_f64, 4.0, 0).is_empty());
    }

    #[test]
    fn test_lattice_is_inside() {
        let geometry = GridGeometry::axis_aligned([6, 7], [0.5_f64, 2.0], [1.0, -3.0]).unwrap();
        for order in [
            SplineOrder::Constant,
            SplineOrder::Linear,
            SplineOrder::Quadratic,
            SplineOrder::Cubic,
        ] {
            let transform = BSplineTransform::new(geometry, order).unwrap();
            let points = sample_lattice(&geometry, order, 9);
            assert_eq!(points.len(), 81);
            for p in points.iter() {
                assert!(transform.transform_point(p).unwrap().inside, "{order:?} {p:?}");
            }
        }

        // Cubic lattice starts on the first valid node and steps by cells / per_axis
        let points = sample_lattice(&geometry, SplineOrder::Cubic, 4);
        assert_eq!(points[0], geometry.index_to_point(&[1.0, 1.0]));
        assert_eq!(points[1], geometry.index_to_point(&[1.0, 2.0]));
        assert_eq!(points[4], geometry.index_to_point(&[1.75, 1.0]));
        assert_eq!(sample_lattice(&geometry, SplineOrder::Cubic, 1).len(), 1);
        assert!(sample_lattice(&geometry, SplineOrder::Cubic, 0).is_empty());
    }
}
