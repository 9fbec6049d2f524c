//! Descale cores: one-time factorisation, many concurrent solves.
//!
//! A [`DescaleCore`] is built once per distinct (kernel, dimensions, shift,
//! active extent, blur, border) tuple and is immutable afterwards; any
//! number of threads may run [`DescaleCore::process`] on the same core
//! simultaneously as long as their destination buffers are disjoint.
//!
//! Construction forms the forward operator `A`, the banded normal equations
//! `A'A`, and their LDL' factorisation, all in double precision, and packs
//! the runtime arrays as `f32`. Upscale cores skip the factorisation and
//! keep only the row-packed forward operator.

mod banded;
mod dispatch;
mod process;

pub use dispatch::{DescaleApi, Opt, ProcessFn};
pub use process::process_vectors;

use crate::error::DescaleError;
use crate::kernel::Kernel;
use crate::matrix::{Border, Sampling, ScalingWeights};
use log::debug;

/// Axis along which vectors are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Vectors are contiguous rows.
    Horizontal,
    /// Vectors are strided columns.
    Vertical,
}

/// Per-axis solve parameters.
#[derive(Clone, Debug)]
pub struct CoreParams {
    pub kernel: Kernel,
    /// Sub-pixel shift on the native grid.
    pub shift: f64,
    /// Fractional native extent sampled by the original resize. Defaults to
    /// the native dimension of the build (output when descaling, input when
    /// upscaling).
    pub active_dim: Option<f64>,
    /// Kernel-width dilation in `(0, min(src, dst))`, at least `1/support`.
    pub blur: f64,
    pub border: Border,
    /// Optional odd-length convolution applied to each solved vector.
    pub post_conv: Vec<f64>,
    /// Apply the forward operator instead of inverting it.
    pub upscale: bool,
}

impl Default for CoreParams {
    fn default() -> Self {
        Self {
            kernel: Kernel::default(),
            shift: 0.0,
            active_dim: None,
            blur: 1.0,
            border: Border::Mirror,
            post_conv: Vec::new(),
            upscale: false,
        }
    }
}

impl CoreParams {
    /// Check every parameter against the `src_dim -> dst_dim` geometry
    /// without building anything.
    pub fn validate(&self, src_dim: usize, dst_dim: usize) -> Result<(), DescaleError> {
        if dst_dim < 1 {
            return Err(DescaleError::EmptyOutput);
        }
        if !self.upscale && dst_dim > src_dim {
            return Err(DescaleError::OutputExceedsInput {
                src: src_dim,
                dst: dst_dim,
            });
        }
        if self.upscale && dst_dim < src_dim {
            return Err(DescaleError::OutputSmallerThanInput {
                src: src_dim,
                dst: dst_dim,
            });
        }

        match &self.kernel {
            Kernel::Lanczos { taps } if *taps < 1 => {
                return Err(DescaleError::InvalidTaps(*taps));
            }
            Kernel::Custom(k) if k.taps() < 1 => {
                return Err(DescaleError::UnusableCustomKernel(k.taps()));
            }
            _ => {}
        }

        let support = self.kernel.support();
        let min_dim = src_dim.min(dst_dim) as f64;
        if self.blur <= 0.0 || self.blur >= min_dim || self.blur < 1.0 / support as f64 {
            return Err(DescaleError::BlurOutOfRange {
                blur: self.blur,
                src: src_dim,
                dst: dst_dim,
            });
        }

        if !self.post_conv.is_empty() {
            if self.post_conv.len() % 2 != 1 {
                return Err(DescaleError::EvenPostConv(self.post_conv.len()));
            }
            if self.post_conv.len() > 2 * dst_dim + 1 {
                return Err(DescaleError::PostConvTooLarge {
                    len: self.post_conv.len(),
                    max: 2 * dst_dim + 1,
                });
            }
        }

        Ok(())
    }

    fn resolved_active(&self, src_dim: usize, dst_dim: usize) -> f64 {
        self.active_dim
            .unwrap_or(if self.upscale { src_dim } else { dst_dim } as f64)
    }
}

/// Packed LDL' factor of the normal equations.
#[derive(Clone, Debug)]
pub struct BandedFactor {
    /// Strict lower band of `L * D`, `dst_dim * (c - 1)` left-aligned rows.
    pub lower: Vec<f32>,
    /// Strict upper band of `L'`, `dst_dim * (c - 1)` right-aligned rows.
    pub upper: Vec<f32>,
    /// Guarded reciprocals `1 / (D[i][i] + eps)`.
    pub diagonal: Vec<f32>,
}

/// Immutable solve state for one axis.
#[derive(Debug)]
pub struct DescaleCore {
    /// Input dimension of a vector.
    pub src_dim: usize,
    /// Output dimension of a vector.
    pub dst_dim: usize,
    /// Band width of the normal equations, `2c - 1`.
    pub bandwidth: usize,
    /// Row-packed projection weights, `dst_dim` rows of `weights_columns`.
    pub weights: Vec<f32>,
    pub weights_columns: usize,
    /// Per-row column ranges of the projection into the source vector.
    pub left_idx: Vec<usize>,
    pub right_idx: Vec<usize>,
    /// Present for descale cores, absent for upscale cores.
    pub factor: Option<BandedFactor>,
    /// Optional post-convolution taps, odd length or empty.
    pub post_conv: Vec<f32>,
}

impl DescaleCore {
    /// Validate `params` and build the core for `src_dim -> dst_dim`
    /// vectors.
    pub fn create(
        src_dim: usize,
        dst_dim: usize,
        params: &CoreParams,
    ) -> Result<Self, DescaleError> {
        params.validate(src_dim, dst_dim)?;

        let support = params.kernel.support();
        // Blur widens every tap window, and with it the band of A'A.
        let effective_support = support * params.blur.ceil() as usize;
        let c = 2 * effective_support;
        let bandwidth = 2 * c - 1;

        let sampling = Sampling {
            shift: params.shift,
            active_dim: params.resolved_active(src_dim, dst_dim),
            blur: params.blur,
            border: params.border,
        };
        let post_conv: Vec<f32> = params.post_conv.iter().map(|&t| t as f32).collect();

        let core = if params.upscale {
            // Forward operator only: native src_dim in, scaled dst_dim out.
            let a = ScalingWeights::build(&params.kernel, src_dim, dst_dim, &sampling);
            let (left_idx, right_idx) = a.row_extents();
            let (packed, weights_columns) = a.packed(&left_idx, &right_idx);

            Self {
                src_dim,
                dst_dim,
                bandwidth,
                weights: packed.iter().map(|&w| w as f32).collect(),
                weights_columns,
                left_idx,
                right_idx,
                factor: None,
                post_conv,
            }
        } else {
            let a = ScalingWeights::build(&params.kernel, dst_dim, src_dim, &sampling);
            let at = a.transposed();
            let (left_idx, right_idx) = at.row_extents();

            let m = banded::normal_equations(dst_dim, c, &left_idx, &right_idx, &at, &a);
            let mut packed_band = banded::compress_symmetric_band(dst_dim, c, &m);
            banded::ldlt_in_place(dst_dim, c, &mut packed_band);
            let upper = banded::expand_symmetric_band(dst_dim, c, &packed_band);
            let mut lower = banded::transpose_square(dst_dim, &upper);
            banded::fold_diagonal_into_lower(dst_dim, c, &mut lower);
            let (lower, upper, diagonal) =
                banded::extract_packed_factors(dst_dim, c, &lower, &upper);

            let (packed, weights_columns) = at.packed(&left_idx, &right_idx);

            Self {
                src_dim,
                dst_dim,
                bandwidth,
                weights: packed.iter().map(|&w| w as f32).collect(),
                weights_columns,
                left_idx,
                right_idx,
                factor: Some(BandedFactor {
                    lower,
                    upper,
                    diagonal,
                }),
                post_conv,
            }
        };

        debug!(
            "descale core built: {}->{} {:?} bandwidth={} upscale={} post_conv={}",
            src_dim,
            dst_dim,
            params.kernel,
            bandwidth,
            params.upscale,
            core.post_conv.len()
        );

        Ok(core)
    }

    /// Apply the core to `count` parallel vectors; see
    /// [`process_vectors`].
    pub fn process(
        &self,
        dir: Direction,
        count: usize,
        src_stride: usize,
        dst_stride: usize,
        srcp: &[f32],
        dstp: &mut [f32],
    ) {
        process_vectors(self, dir, count, src_stride, dst_stride, srcp, dstp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_core_passes_vectors_through() {
        let core = DescaleCore::create(
            6,
            6,
            &CoreParams {
                kernel: Kernel::Bilinear,
                ..CoreParams::default()
            },
        )
        .unwrap();
        let src = [0.1f32, 0.9, 0.3, 0.7, 0.5, 0.2];
        let mut dst = [0.0f32; 6];
        core.process(Direction::Horizontal, 1, 6, 6, &src, &mut dst);
        for (a, b) in src.iter().zip(&dst) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn vertical_matches_horizontal() {
        let params = CoreParams {
            kernel: Kernel::Bicubic { b: 0.0, c: 0.5 },
            ..CoreParams::default()
        };
        let core = DescaleCore::create(12, 6, &params).unwrap();
        let line: Vec<f32> = (0..12).map(|i| ((i * 7) % 5) as f32 * 0.2).collect();

        let mut horizontal = vec![0.0f32; 6];
        core.process(Direction::Horizontal, 1, 12, 6, &line, &mut horizontal);

        // The same data as a single strided column.
        let stride = 3;
        let mut column_src = vec![0.0f32; 12 * stride];
        for (i, &v) in line.iter().enumerate() {
            column_src[i * stride] = v;
        }
        let mut column_dst = vec![0.0f32; 6 * stride];
        core.process(
            Direction::Vertical,
            1,
            stride,
            stride,
            &column_src,
            &mut column_dst,
        );

        for i in 0..6 {
            assert_eq!(horizontal[i], column_dst[i * stride], "element {i}");
        }
    }

    #[test]
    fn validation_rejects_bad_parameters() {
        let p = CoreParams::default();
        assert!(matches!(
            DescaleCore::create(4, 0, &p),
            Err(DescaleError::EmptyOutput)
        ));
        assert!(matches!(
            DescaleCore::create(4, 8, &p),
            Err(DescaleError::OutputExceedsInput { .. })
        ));

        let p = CoreParams {
            blur: 0.0,
            ..CoreParams::default()
        };
        assert!(matches!(
            DescaleCore::create(8, 4, &p),
            Err(DescaleError::BlurOutOfRange { .. })
        ));

        let p = CoreParams {
            kernel: Kernel::Lanczos { taps: 0 },
            ..CoreParams::default()
        };
        assert!(matches!(
            DescaleCore::create(8, 4, &p),
            Err(DescaleError::InvalidTaps(0))
        ));

        let p = CoreParams {
            post_conv: vec![0.5, 0.5],
            ..CoreParams::default()
        };
        assert!(matches!(
            DescaleCore::create(8, 4, &p),
            Err(DescaleError::EvenPostConv(2))
        ));

        let p = CoreParams {
            post_conv: vec![0.1; 11],
            ..CoreParams::default()
        };
        assert!(matches!(
            DescaleCore::create(8, 4, &p),
            Err(DescaleError::PostConvTooLarge { .. })
        ));
    }

    #[test]
    fn upscale_rejects_shrinking() {
        let p = CoreParams {
            upscale: true,
            ..CoreParams::default()
        };
        assert!(matches!(
            DescaleCore::create(8, 4, &p),
            Err(DescaleError::OutputSmallerThanInput { .. })
        ));
        assert!(DescaleCore::create(4, 8, &p).is_ok());
    }

    #[test]
    fn upscale_core_has_no_factor() {
        let p = CoreParams {
            kernel: Kernel::Bilinear,
            upscale: true,
            ..CoreParams::default()
        };
        let core = DescaleCore::create(2, 4, &p).unwrap();
        assert!(core.factor.is_none());
        let src = [1.0f32, 3.0];
        let mut dst = [0.0f32; 4];
        core.process(Direction::Horizontal, 1, 2, 4, &src, &mut dst);
        // Known bilinear 2 -> 4 operator rows.
        let expected = [1.0, 1.5, 2.5, 3.0];
        for (a, b) in dst.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }
}
