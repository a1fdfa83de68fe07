use crate::{BSplineTransform, GridGeometry, SplineOrder};
use rand::Rng;
use rand::SeedableRng;
use rand::distr::StandardUniform;
use rand::rngs::StdRng;

/// Fixed random seed to support repeatable testing
const SEED: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6,
    5, 4, 3, 2, 1,
];

/// Get a random number generator with a const seed for repeatable testing
pub fn rng_fixed_seed() -> StdRng {
    StdRng::from_seed(SEED)
}

/// Generate `n` random numbers using provided generator
pub fn randn<T>(rng: &mut StdRng, n: usize) -> Vec<T>
where
    StandardUniform: rand::distr::Distribution<T>,
{
    std::iter::repeat_with(|| rng.random::<T>())
        .take(n)
        .collect()
}

/// Rotation by `angle` in the plane of axes 0 and 1, identity elsewhere
pub fn rotation<const D: usize>(angle: f64) -> [[f64; D]; D] {
    let mut m = [[0.0; D]; D];
    for i in 0..D {
        m[i][i] = 1.0;
    }
    if D >= 2 {
        let (s, c) = angle.sin_cos();
        m[0][0] = c;
        m[0][1] = -s;
        m[1][0] = s;
        m[1][1] = c;
    }
    m
}

/// Transform on a rotated, anisotropic grid with random coefficients of
/// magnitude up to `amplitude`
pub fn random_transform<const D: usize>(
    rng: &mut StdRng,
    size: [usize; D],
    order: SplineOrder,
    amplitude: f64,
) -> BSplineTransform<f64, D> {
    let mut spacing = [0.0; D];
    let mut origin = [0.0; D];
    for i in 0..D {
        spacing[i] = 0.8 + 0.3 * i as f64;
        origin[i] = -1.0 - 0.5 * i as f64;
    }
    let geometry = GridGeometry::new(size, spacing, origin, rotation::<D>(0.3)).unwrap();
    let nodes: usize = size.iter().product();
    let params: Vec<f64> = randn::<f64>(rng, D * nodes)
        .into_iter()
        .map(|x| amplitude * (2.0 * x - 1.0))
        .collect();
    BSplineTransform::with_parameters(geometry, order, params).unwrap()
}

/// Physical points whose support regions lie strictly inside the grid,
/// kept away from cell boundaries so finite differences do not cross a knot
pub fn random_points_inside<const D: usize>(
    rng: &mut StdRng,
    transform: &BSplineTransform<f64, D>,
    n: usize,
) -> Vec<[f64; D]> {
    let geometry = transform.geometry();
    let shift = transform.order().start_shift::<f64>();
    let width = transform.order().support() as f64;
    (0..n)
        .map(|_| {
            let mut cindex = [0.0; D];
            for i in 0..D {
                // Valid continuous indices are [shift, size - width + shift)
                let lo = shift;
                let cells = (geometry.size()[i] as f64 - width).floor().max(0.0) as usize + 1;
                let cell = rng.random_range(0..cells) as f64;
                let u = 0.1 + 0.8 * rng.random::<f64>();
                cindex[i] = lo + cell + u;
            }
            geometry.index_to_point(&cindex)
        })
        .collect()
}
