#![allow(dead_code)]

use descale::{CoreParams, DescaleCore, Direction, Kernel, Sampling, ScalingWeights};
use nalgebra::{DMatrix, DVector};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn approx_eq(a: f32, b: f32, tol: f32) -> bool {
    (a - b).abs() < tol
}

/// Run a core over one contiguous vector.
pub fn solve_1d(core: &DescaleCore, src: &[f32]) -> Vec<f32> {
    assert_eq!(src.len(), core.src_dim);
    let mut dst = vec![0.0f32; core.dst_dim];
    core.process(
        Direction::Horizontal,
        1,
        core.src_dim,
        core.dst_dim,
        src,
        &mut dst,
    );
    dst
}

/// Descale core with default sampling for the given kernel.
pub fn descale_core(kernel: Kernel, src_dim: usize, dst_dim: usize) -> DescaleCore {
    DescaleCore::create(
        src_dim,
        dst_dim,
        &CoreParams {
            kernel,
            ..CoreParams::default()
        },
    )
    .expect("valid core")
}

/// Upscale core with default sampling for the given kernel.
pub fn upscale_core(kernel: Kernel, src_dim: usize, dst_dim: usize) -> DescaleCore {
    DescaleCore::create(
        src_dim,
        dst_dim,
        &CoreParams {
            kernel,
            upscale: true,
            ..CoreParams::default()
        },
    )
    .expect("valid upscale core")
}

/// The forward operator a default descale of `src_dim -> dst_dim` inverts.
pub fn forward_operator(kernel: &Kernel, src_dim: usize, dst_dim: usize) -> ScalingWeights {
    ScalingWeights::build(kernel, dst_dim, src_dim, &Sampling::new(dst_dim as f64))
}

/// Double-precision least-squares solution of `A x = y` through the dense
/// normal equations; the oracle the banded solver is checked against.
pub fn dense_least_squares(a: &ScalingWeights, y: &[f32]) -> Vec<f32> {
    let rows = a.rows();
    let cols = a.cols();
    assert_eq!(y.len(), rows);
    let m = DMatrix::from_fn(rows, cols, |i, j| a.get(i, j));
    let rhs = m.transpose() * DVector::from_fn(rows, |i, _| y[i] as f64);
    let normal = m.transpose() * &m;
    let x = normal.lu().solve(&rhs).expect("normal equations solvable");
    x.iter().map(|&v| v as f32).collect()
}

/// Dense forward application `y = A x`.
pub fn dense_forward(a: &ScalingWeights, x: &[f32]) -> Vec<f32> {
    let mut y = vec![0.0f32; a.rows()];
    for (i, out) in y.iter_mut().enumerate() {
        let mut sum = 0.0;
        for (j, &xv) in x.iter().enumerate() {
            sum += a.get(i, j) * xv as f64;
        }
        *out = sum as f32;
    }
    y
}
