#![allow(clippy::all)] // Clippy will attempt to remove black_box() internals

use criterion::*;
use gridgen::*;
use recursive_bspline::{BSplineTransform, ParameterJacobian, SplineOrder};

macro_rules! bench_transform_specific {
    ($group:ident, $ndims:expr, $gridsize:expr, $size:expr, $order:expr) => {
        $group.throughput(Throughput::Elements(*$size as u64));
        let order: SplineOrder = $order;
        let label = format!("{}x{}D order {}", $gridsize, $ndims, order.degree());

        $group.bench_with_input(
            BenchmarkId::new(format!("TransformPoint Recursive {label}"), $size),
            $size,
            |b, &size| {
                let transform: BSplineTransform<f64, $ndims> = gen_transform($gridsize, order);
                let obs = gen_obs_points(&transform, size);

                b.iter(|| {
                    black_box({
                        for p in obs.iter() {
                            black_box(transform.transform_point(p).unwrap());
                        }
                    })
                });
            },
        );

        $group.bench_with_input(
            BenchmarkId::new(format!("TransformPoint Flat {label}"), $size),
            $size,
            |b, &size| {
                let transform: BSplineTransform<f64, $ndims> = gen_transform($gridsize, order);
                let obs = gen_obs_points(&transform, size);

                b.iter(|| {
                    black_box({
                        for p in obs.iter() {
                            black_box(transform.transform_point_old(p).unwrap());
                        }
                    })
                });
            },
        );

        $group.bench_with_input(
            BenchmarkId::new(format!("Jacobian {label}"), $size),
            $size,
            |b, &size| {
                let transform: BSplineTransform<f64, $ndims> = gen_transform($gridsize, order);
                let obs = gen_obs_points(&transform, size);
                let mut jac = ParameterJacobian::new();

                b.iter(|| {
                    black_box({
                        for p in obs.iter() {
                            black_box(transform.jacobian_into(p, &mut jac).unwrap());
                        }
                    })
                });
            },
        );

        $group.bench_with_input(
            BenchmarkId::new(format!("SpatialJacobian {label}"), $size),
            $size,
            |b, &size| {
                let transform: BSplineTransform<f64, $ndims> = gen_transform($gridsize, order);
                let obs = gen_obs_points(&transform, size);

                b.iter(|| {
                    black_box({
                        for p in obs.iter() {
                            black_box(transform.spatial_jacobian(p).unwrap());
                        }
                    })
                });
            },
        );

        $group.bench_with_input(
            BenchmarkId::new(format!("Evaluate {label}"), $size),
            $size,
            |b, &size| {
                let transform: BSplineTransform<f64, $ndims> = gen_transform($gridsize, order);
                let obs = gen_obs_points(&transform, size);

                b.iter(|| {
                    black_box({
                        for p in obs.iter() {
                            black_box(transform.evaluate(p).unwrap());
                        }
                    })
                });
            },
        );
    };
}

fn bench_transform(c: &mut Criterion) {
    for gridsize in [10] {
        let mut group = c.benchmark_group(format!("Transform_2D_{gridsize}-grid"));
        for size in [1, 100, 10_000].iter() {
            bench_transform_specific!(group, 2, gridsize, size, SplineOrder::Cubic);
        }
        group.finish();
    }

    for gridsize in [10] {
        let mut group = c.benchmark_group(format!("Transform_3D_{gridsize}-grid"));
        for size in [1, 100, 10_000].iter() {
            bench_transform_specific!(group, 3, gridsize, size, SplineOrder::Cubic);
            bench_transform_specific!(group, 3, gridsize, size, SplineOrder::Linear);
        }
        group.finish();
    }
}

criterion_group!(benches_transform, bench_transform);
criterion_main!(benches_transform);

mod randn {
    use rand::distr::StandardUniform;
    use rand::rngs::StdRng;
    use rand::Rng;
    use rand::SeedableRng;

    /// Fixed random seed to support repeatable testing
    const SEED: [u8; 32] = [
        0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 15, 14, 13, 12, 11, 10, 9, 8, 7,
        6, 5, 4, 3, 2, 1,
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
        let out: Vec<T> = (0..n).map(|_| rng.random::<T>()).collect();
        out
    }
}

mod gridgen {
    use super::randn::*;
    use rand::seq::SliceRandom;
    use recursive_bspline::utils::*;
    use recursive_bspline::{BSplineTransform, GridGeometry, SplineOrder};

    // Generate a square grid with unit spacing and small random displacements.
    pub fn gen_transform<const D: usize>(size: usize, order: SplineOrder) -> BSplineTransform<f64, D> {
        let mut rng = rng_fixed_seed();
        let geometry = GridGeometry::axis_aligned([size; D], [1.0; D], [0.0; D]).unwrap();
        let params: Vec<f64> = randn::<f64>(&mut rng, D * geometry.number_of_nodes())
            .into_iter()
            .map(|x| x - 0.5)
            .collect();
        BSplineTransform::with_parameters(geometry, order, params).unwrap()
    }

    // Generate a shuffled set of observation points that are entirely inside
    // the valid region of the transform, truncated to `n` points.
    pub fn gen_obs_points<const D: usize>(
        transform: &BSplineTransform<f64, D>,
        n: usize,
    ) -> Vec<[f64; D]> {
        let mut rng = rng_fixed_seed();
        let m: usize = ((n as f64).powf(1.0 / (D as f64)) + 2.0) as usize;
        let mut obs = sample_lattice(transform.geometry(), transform.order(), m);
        obs.shuffle(&mut rng);
        obs.truncate(n);
        obs
    }
}
