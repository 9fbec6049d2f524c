//! Banded normal equations and their LDL' factorisation.
//!
//! The product `A'A` of a resampling operator is symmetric and banded, so
//! only the upper band is stored: a matrix of `n` rows and half-bandwidth
//! `c` packs into `n * c` doubles with `packed[i * c + t] = M[i][i + t]`.
//! The factorisation runs in place on that layout; afterwards the packed
//! diagonal holds `D` and the packed off-diagonals hold the rows of `L'`.
//!
//! Conversion to the solver's runtime layout goes through a full-matrix
//! expansion: expand the band, transpose to obtain `L`, fold `D` back into
//! the strict lower triangle, then extract per-row windows of the strict
//! lower and upper bands plus the reciprocal diagonal as `f32`.
//!
//! Every division carries a machine-epsilon guard; a zero pivot (possible
//! under extreme shifts) produces large but finite factors instead of NaN.

use crate::matrix::ScalingWeights;

/// Band-limited product `A' * A`.
///
/// `at` is the transposed operator (`n` rows) with per-row non-zero extents
/// `[left, right)`, and `a` the forward operator. Only entries within
/// `|i - j| < c` can be non-zero; the full `n * n` buffer is returned because
/// the later expansion steps work on square matrices.
pub(crate) fn normal_equations(
    n: usize,
    c: usize,
    left: &[usize],
    right: &[usize],
    at: &ScalingWeights,
    a: &ScalingWeights,
) -> Vec<f64> {
    let mut product = vec![0.0; n * n];
    for i in 0..n {
        let lo = i.saturating_sub(c - 1);
        let hi = (i + c).min(n);
        let at_row = at.row(i);
        for j in lo..hi {
            let mut sum = 0.0;
            for k in left[i]..right[i] {
                sum += at_row[k] * a.get(k, j);
            }
            product[i * n + j] = sum;
        }
    }
    product
}

/// Pack the upper band of a symmetric matrix into `n * c` doubles.
pub(crate) fn compress_symmetric_band(n: usize, c: usize, m: &[f64]) -> Vec<f64> {
    let mut packed = vec![0.0; n * c];
    for i in 0..n {
        for j in i..(i + c).min(n) {
            packed[i * c + (j - i)] = m[i * n + j];
        }
    }
    packed
}

/// In-place LDL' decomposition of a packed symmetric band.
///
/// On return `packed[k * c]` holds `D[k][k]` and `packed[k * c + j]` for
/// `j >= 1` holds `L'[k][k + j]`.
pub(crate) fn ldlt_in_place(n: usize, c: usize, packed: &mut [f64]) {
    let eps = f64::EPSILON;
    for k in 0..n {
        let last = (c - 1).min(n - 1 - k);

        for j in 1..=last {
            let d = packed[k * c + j] / (packed[k * c] + eps);
            for l in 0..=(last - j) {
                packed[(k + j) * c + l] -= d * packed[k * c + j + l];
            }
        }

        let e = 1.0 / (packed[k * c] + eps);
        for j in 1..c {
            packed[k * c + j] *= e;
        }
    }
}

/// Expand a packed symmetric band back to a full upper-triangular matrix.
pub(crate) fn expand_symmetric_band(n: usize, c: usize, packed: &[f64]) -> Vec<f64> {
    let mut full = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..c {
            let col = i + j;
            if col < n {
                full[i * n + col] = packed[i * c + j];
            }
        }
    }
    full
}

/// Transpose of a square matrix.
pub(crate) fn transpose_square(n: usize, m: &[f64]) -> Vec<f64> {
    let mut t = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            t[j * n + i] = m[i * n + j];
        }
    }
    t
}

/// Scale each strict-lower band entry of `L` by its column's diagonal,
/// turning `L` into `L * D` while leaving `D` itself on the diagonal.
pub(crate) fn fold_diagonal_into_lower(n: usize, c: usize, m: &mut [f64]) {
    for i in 1..n {
        let start = i.saturating_sub(c - 1);
        for j in start..i {
            m[i * n + j] *= m[j * n + j];
        }
    }
}

/// Extract the packed runtime factors from the full `L * D` and `L'`
/// matrices.
///
/// Lower windows are left-aligned per row, upper windows right-aligned, and
/// the diagonal is stored as guarded reciprocals, all in single precision.
pub(crate) fn extract_packed_factors(
    n: usize,
    c: usize,
    lower: &[f64],
    upper: &[f64],
) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let eps = f64::EPSILON;
    let mut packed_lower = vec![0.0f32; n * (c - 1)];
    let mut packed_upper = vec![0.0f32; n * (c - 1)];
    let mut diagonal = vec![0.0f32; n];

    for i in 0..n {
        let start = i.saturating_sub(c - 1);
        for j in start..(start + c - 1).min(n) {
            packed_lower[i * (c - 1) + (j - start)] = lower[i * n + j] as f32;
        }
    }

    for i in 0..n {
        let start = (i + c - 1).min(n - 1);
        for j in ((i + 1)..=start).rev() {
            packed_upper[i * (c - 1) + (c - 2 + j - start)] = upper[i * n + j] as f32;
        }
    }

    for i in 0..n {
        diagonal[i] = (1.0 / (lower[i * n + i] + eps)) as f32;
    }

    (packed_lower, packed_upper, diagonal)
}
