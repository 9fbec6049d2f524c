//! The vector solver: projection, banded substitution and post-convolution.
//!
//! Descale cores solve `A'A x = A'b` per vector: project the source through
//! `A'`, forward-substitute through `L * D`, backward-substitute through
//! `L'`. Upscale cores stop after the projection, which for them applies the
//! forward operator directly. The horizontal and vertical paths differ only
//! in how samples are addressed; the arithmetic and its order are identical,
//! which keeps results bit-stable across layouts.
//!
//! No allocation happens per vector; the one scratch line needed by the
//! optional post-convolution is allocated once per call.

use super::{DescaleCore, Direction};

/// Apply `core` to `count` parallel vectors.
///
/// For [`Direction::Horizontal`] each vector is a contiguous row; strides
/// are the sample distance between consecutive vectors. For
/// [`Direction::Vertical`] each vector is a strided column and `count` is
/// the number of columns.
pub fn process_vectors(
    core: &DescaleCore,
    dir: Direction,
    count: usize,
    src_stride: usize,
    dst_stride: usize,
    srcp: &[f32],
    dstp: &mut [f32],
) {
    let mut scratch = if core.post_conv.is_empty() {
        Vec::new()
    } else {
        vec![0.0f32; core.dst_dim]
    };

    match dir {
        Direction::Horizontal => {
            for v in 0..count {
                let src = &srcp[v * src_stride..v * src_stride + core.src_dim];
                let dst = &mut dstp[v * dst_stride..v * dst_stride + core.dst_dim];
                solve_row(core, src, dst);
                if !core.post_conv.is_empty() {
                    scratch.copy_from_slice(dst);
                    convolve_mirrored(&core.post_conv, &scratch, |i, v| dst[i] = v);
                }
            }
        }
        Direction::Vertical => {
            for col in 0..count {
                solve_column(core, srcp, dstp, col, src_stride, dst_stride);
                if !core.post_conv.is_empty() {
                    for (i, s) in scratch.iter_mut().enumerate() {
                        *s = dstp[i * dst_stride + col];
                    }
                    convolve_mirrored(&core.post_conv, &scratch, |i, v| {
                        dstp[i * dst_stride + col] = v
                    });
                }
            }
        }
    }
}

/// Solve one contiguous vector.
fn solve_row(core: &DescaleCore, src: &[f32], dst: &mut [f32]) {
    let n = core.dst_dim;
    let width = core.weights_columns;

    match &core.factor {
        Some(factor) => {
            let c = (core.bandwidth + 1) / 2;

            // Solve L D y = A' b; the projection feeds straight into the
            // forward substitution since only earlier elements are read.
            for j in 0..n {
                let mut sum = 0.0f32;
                for k in core.left_idx[j]..core.right_idx[j] {
                    sum += core.weights[j * width + (k - core.left_idx[j])] * src[k];
                }

                let start = j.saturating_sub(c - 1);
                let mut lsum = 0.0f32;
                for k in start..j {
                    lsum += factor.lower[j * (c - 1) + (k - start)] * dst[k];
                }

                dst[j] = (sum - lsum) * factor.diagonal[j];
            }

            // Solve L' x = y.
            for j in (0..n.saturating_sub(1)).rev() {
                let start = (j + c - 1).min(n - 1);
                let mut sum = 0.0f32;
                for k in ((j + 1)..=start).rev() {
                    sum += factor.upper[j * (c - 1) + (k + c - 2 - start)] * dst[k];
                }
                dst[j] -= sum;
            }
        }
        None => {
            for j in 0..n {
                let mut sum = 0.0f32;
                for k in core.left_idx[j]..core.right_idx[j] {
                    sum += core.weights[j * width + (k - core.left_idx[j])] * src[k];
                }
                dst[j] = sum;
            }
        }
    }
}

/// Solve one strided column; same arithmetic as [`solve_row`].
fn solve_column(
    core: &DescaleCore,
    srcp: &[f32],
    dstp: &mut [f32],
    col: usize,
    src_stride: usize,
    dst_stride: usize,
) {
    let n = core.dst_dim;
    let width = core.weights_columns;

    match &core.factor {
        Some(factor) => {
            let c = (core.bandwidth + 1) / 2;

            for j in 0..n {
                let mut sum = 0.0f32;
                for k in core.left_idx[j]..core.right_idx[j] {
                    sum += core.weights[j * width + (k - core.left_idx[j])]
                        * srcp[k * src_stride + col];
                }

                let start = j.saturating_sub(c - 1);
                let mut lsum = 0.0f32;
                for k in start..j {
                    lsum += factor.lower[j * (c - 1) + (k - start)] * dstp[k * dst_stride + col];
                }

                dstp[j * dst_stride + col] = (sum - lsum) * factor.diagonal[j];
            }

            for j in (0..n.saturating_sub(1)).rev() {
                let start = (j + c - 1).min(n - 1);
                let mut sum = 0.0f32;
                for k in ((j + 1)..=start).rev() {
                    sum += factor.upper[j * (c - 1) + (k + c - 2 - start)]
                        * dstp[k * dst_stride + col];
                }
                dstp[j * dst_stride + col] -= sum;
            }
        }
        None => {
            for j in 0..n {
                let mut sum = 0.0f32;
                for k in core.left_idx[j]..core.right_idx[j] {
                    sum += core.weights[j * width + (k - core.left_idx[j])]
                        * srcp[k * src_stride + col];
                }
                dstp[j * dst_stride + col] = sum;
            }
        }
    }
}

/// Centred convolution with mirrored borders.
///
/// Positions reflect on the half-integer grid: index `-1` maps to `0`,
/// index `n` maps to `n - 1`. The validated tap count never reaches past a
/// single reflection.
fn convolve_mirrored(taps: &[f32], input: &[f32], mut write: impl FnMut(usize, f32)) {
    let n = input.len();
    let radius = (taps.len() / 2) as isize;
    debug_assert!(taps.len() % 2 == 1);
    debug_assert!(taps.len() <= 2 * n + 1);

    for i in 0..n {
        let mut sum = 0.0f32;
        for (t, &w) in taps.iter().enumerate() {
            let j = i as isize + t as isize - radius;
            let j = if j < 0 {
                (-j - 1) as usize
            } else if j >= n as isize {
                2 * n - j as usize - 1
            } else {
                j as usize
            };
            sum += w * input[j];
        }
        write(i, sum);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_post_conv_is_the_identity() {
        let input = [1.0f32, 2.0, 3.0, 4.0];
        let mut out = [0.0f32; 4];
        convolve_mirrored(&[0.0, 1.0, 0.0], &input, |i, v| out[i] = v);
        assert_eq!(out, input);
    }

    #[test]
    fn box_post_conv_mirrors_at_the_edges() {
        let input = [1.0f32, 0.0, 0.0, 1.0];
        let mut out = [0.0f32; 4];
        convolve_mirrored(&[0.25, 0.5, 0.25], &input, |i, v| out[i] = v);
        // Edge samples see themselves reflected.
        assert!((out[0] - 0.75).abs() < 1e-6);
        assert!((out[1] - 0.25).abs() < 1e-6);
        assert!((out[2] - 0.25).abs() < 1e-6);
        assert!((out[3] - 0.75).abs() < 1e-6);
    }
}
