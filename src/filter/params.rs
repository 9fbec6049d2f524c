//! The shared parameter set exposed by every named filter.

use crate::kernel::Kernel;
use crate::matrix::Border;
use crate::solver::Opt;
use serde::Deserialize;

/// Parameters accepted by [`crate::Descaler::new`].
///
/// Every field except the output dimensions has a default matching the
/// behaviour of plain descaling: no shift, full active extent, no blur, no
/// post-convolution, mirrored borders, automatic implementation choice.
#[derive(Clone, Debug, Deserialize)]
pub struct FilterParams {
    /// Output width.
    pub width: usize,
    /// Output height.
    pub height: usize,
    /// Kernel believed to have produced the input.
    #[serde(default)]
    pub kernel: Kernel,
    /// Horizontal sub-pixel shift of the original resize.
    #[serde(default)]
    pub src_left: f64,
    /// Vertical sub-pixel shift of the original resize.
    #[serde(default)]
    pub src_top: f64,
    /// Fractional active width sampled by the original resize.
    #[serde(default)]
    pub src_width: Option<f64>,
    /// Fractional active height sampled by the original resize.
    #[serde(default)]
    pub src_height: Option<f64>,
    /// Kernel-width dilation factor.
    #[serde(default = "default_blur")]
    pub blur: f64,
    /// Border policy for out-of-range kernel taps.
    #[serde(default)]
    pub border_handling: Border,
    /// Odd-length convolution applied to each solved vector.
    #[serde(default)]
    pub post_conv: Vec<f64>,
    /// Process both axes even when they look like no-ops.
    #[serde(default)]
    pub force: bool,
    /// Process the horizontal axis even when it looks like a no-op.
    #[serde(default)]
    pub force_h: bool,
    /// Process the vertical axis even when it looks like a no-op.
    #[serde(default)]
    pub force_v: bool,
    /// Vector-solver implementation preference.
    #[serde(default)]
    pub opt: Opt,
    /// Apply the forward operator instead of inverting it.
    #[serde(default)]
    pub upscale: bool,
}

fn default_blur() -> f64 {
    1.0
}

impl FilterParams {
    /// Parameters for a plain descale to `width x height`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            kernel: Kernel::default(),
            src_left: 0.0,
            src_top: 0.0,
            src_width: None,
            src_height: None,
            blur: 1.0,
            border_handling: Border::Mirror,
            post_conv: Vec::new(),
            force: false,
            force_h: false,
            force_v: false,
            opt: Opt::Auto,
            upscale: false,
        }
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_shift(mut self, src_left: f64, src_top: f64) -> Self {
        self.src_left = src_left;
        self.src_top = src_top;
        self
    }

    pub fn with_active(mut self, src_width: f64, src_height: f64) -> Self {
        self.src_width = Some(src_width);
        self.src_height = Some(src_height);
        self
    }

    pub fn with_blur(mut self, blur: f64) -> Self {
        self.blur = blur;
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border_handling = border;
        self
    }

    pub fn with_post_conv(mut self, taps: Vec<f64>) -> Self {
        self.post_conv = taps;
        self
    }

    pub fn with_force(mut self, force_h: bool, force_v: bool) -> Self {
        self.force_h = force_h;
        self.force_v = force_v;
        self
    }

    pub fn with_opt(mut self, opt: Opt) -> Self {
        self.opt = opt;
        self
    }

    pub fn with_upscale(mut self, upscale: bool) -> Self {
        self.upscale = upscale;
        self
    }
}
