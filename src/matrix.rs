//! Construction of the separable resampling operator.
//!
//! [`ScalingWeights`] is the rectangular operator `A` that maps a
//! hypothesised native-resolution line to the observed upscaled line. It is
//! built row by row in double precision: each upscaled pixel is positioned
//! on the native grid, the kernel is sampled over its tap window, the raw
//! weights are normalised to unity, and out-of-range taps are folded back
//! into the image according to the border policy.
//!
//! Grid convention: pixel centres sit at half-integers, so the native index
//! of a tap position is its floor. Positions are computed as
//! `pos = (i + 0.5) / ratio + shift` with `ratio = scaled_dim / active_dim`,
//! which reproduces the centre alignment used by the resizers this crate
//! inverts.

use crate::kernel::{Kernel, KernelCache};
use log::debug;
use serde::Deserialize;

/// Policy for tap positions outside the native extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Border {
    /// Reflect the position around the image edge.
    #[default]
    Mirror,
    /// Discard the tap; the row total keeps its in-range normalisation.
    Zero,
    /// Clamp the position to the nearest valid pixel centre.
    Repeat,
}

/// Scalar sampling options shared by every row of one operator build.
#[derive(Clone, Copy, Debug)]
pub struct Sampling {
    /// Sub-pixel shift applied on the native grid.
    pub shift: f64,
    /// Fractional native extent that was actually sampled by the upscale.
    pub active_dim: f64,
    /// Kernel-width dilation factor; 1.0 leaves the kernel unchanged.
    pub blur: f64,
    /// Border policy for out-of-range taps.
    pub border: Border,
}

impl Sampling {
    /// Default sampling for a given active extent: no shift, no blur,
    /// mirrored borders.
    pub fn new(active_dim: f64) -> Self {
        Self {
            shift: 0.0,
            active_dim,
            blur: 1.0,
            border: Border::Mirror,
        }
    }
}

/// The dense double-precision resampling operator.
///
/// `rows` is the upscaled (observed) dimension and `cols` the native
/// (hypothesised) one. Rows are contiguous; each row holds at most
/// `2 * support * ceil(blur)` non-zeros before border folding.
#[derive(Clone, Debug)]
pub struct ScalingWeights {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl ScalingWeights {
    /// Build the operator mapping `native_dim` samples to `scaled_dim`
    /// samples with the given kernel and sampling options.
    pub fn build(
        kernel: &Kernel,
        native_dim: usize,
        scaled_dim: usize,
        sampling: &Sampling,
    ) -> Self {
        let support = kernel.support();
        let taps = 2 * support * sampling.blur.ceil() as usize;
        let ratio = scaled_dim as f64 / sampling.active_dim;
        let cache = KernelCache::new(kernel);

        let mut data = vec![0.0; scaled_dim * native_dim];
        for i in 0..scaled_dim {
            let pos = (i as f64 + 0.5) / ratio + sampling.shift;
            let begin = round_halfup(pos - support as f64 * sampling.blur) + 0.5;

            let mut total = 0.0;
            for j in 0..taps {
                total += cache.evaluate((begin + j as f64 - pos) / sampling.blur);
            }
            // Guard against degenerate rows; extreme shifts can cancel every
            // tap, and a zero total must not poison the row with NaN.
            let norm = 1.0 / (total + f64::EPSILON);

            let row = &mut data[i * native_dim..(i + 1) * native_dim];
            for j in 0..taps {
                let xpos = begin + j as f64;
                let weight = cache.evaluate((xpos - pos) / sampling.blur) * norm;
                let real_pos = match sampling.border {
                    Border::Mirror => {
                        if xpos < 0.0 {
                            -xpos
                        } else if xpos >= native_dim as f64 {
                            (2.0 * native_dim as f64 - xpos).min(native_dim as f64 - 0.5)
                        } else {
                            xpos
                        }
                    }
                    Border::Repeat => xpos.clamp(0.0, native_dim as f64 - 0.5),
                    Border::Zero => {
                        if xpos < 0.0 || xpos >= native_dim as f64 {
                            continue;
                        }
                        xpos
                    }
                };
                let idx = (real_pos.floor() as isize).clamp(0, native_dim as isize - 1) as usize;
                row[idx] += weight;
            }
        }

        debug!(
            "scaling weights built: {scaled_dim}x{native_dim} support={support} taps={taps} \
             border={:?}",
            sampling.border
        );

        Self {
            rows: scaled_dim,
            cols: native_dim,
            data,
        }
    }

    /// Number of rows (the upscaled dimension).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (the native dimension).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// One operator row.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Single coefficient.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// The transposed operator.
    pub fn transposed(&self) -> ScalingWeights {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        ScalingWeights {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Per-row non-zero extents: the first non-zero column and one past the
    /// last. All-zero rows report `(0, 0)`.
    pub fn row_extents(&self) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::with_capacity(self.rows);
        let mut right = Vec::with_capacity(self.rows);
        for i in 0..self.rows {
            let row = self.row(i);
            left.push(row.iter().position(|&w| w != 0.0).unwrap_or(0));
            right.push(row.iter().rposition(|&w| w != 0.0).map_or(0, |j| j + 1));
        }
        (left, right)
    }

    /// Pack each row to the widest extent, dropping leading zero columns.
    ///
    /// Returns the packed coefficients and the packed row width.
    pub(crate) fn packed(&self, left: &[usize], right: &[usize]) -> (Vec<f64>, usize) {
        let width = left
            .iter()
            .zip(right)
            .map(|(&l, &r)| r - l)
            .max()
            .unwrap_or(0);
        let mut packed = vec![0.0; self.rows * width];
        for i in 0..self.rows {
            let row = self.row(i);
            for j in 0..width {
                let col = left[i] + j;
                if col < self.cols {
                    packed[i * width + j] = row[col];
                }
            }
        }
        (packed, width)
    }
}

/// Round to nearest with halves away from zero.
///
/// Matches the reference resizers' pixel-grid rounding: `|x|` rounds to
/// nearest and the sign is reapplied, so half-to-even never splits a tap
/// window. On the positive half-axis, where sampling positions live, this
/// keeps `round(x - 1) == round(x) - 1`.
pub(crate) fn round_halfup(x: f64) -> f64 {
    x.round()
}
