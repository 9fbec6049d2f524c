//! Resampling kernel definitions and evaluation.
//!
//! A [`Kernel`] names one of the supported resampling filters together with
//! its parameters. [`Kernel::evaluate`] returns the filter response at a
//! signed distance measured in destination pixels; every kernel is even in
//! its argument and zero outside `[-support, support]`.
//!
//! The piecewise polynomials match the coefficients used by the common
//! resizer implementations on double inputs, so operators built from them
//! reproduce upscales done with those resizers.

mod custom;
mod spline;

pub use custom::CustomKernel;
pub(crate) use custom::KernelCache;

use serde::Deserialize;

/// A named resampling kernel with its parameters.
///
/// The serde representation is internally tagged on `kind`, e.g.
/// `{"kind": "lanczos", "taps": 3}`. Custom kernels carry a callback and are
/// only constructible from code.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Kernel {
    /// Triangle filter, support 1.
    Bilinear,
    /// Mitchell-Netravali family, support 2. `b = 0, c = 0.5` is Catmull-Rom.
    Bicubic {
        #[serde(default)]
        b: f64,
        #[serde(default = "default_bicubic_c")]
        c: f64,
    },
    /// Sinc windowed by a wider sinc; support equals `taps`.
    Lanczos {
        #[serde(default = "default_lanczos_taps")]
        taps: usize,
    },
    /// Cubic spline through 4 sample points, support 2.
    Spline16,
    /// Cubic spline through 6 sample points, support 3.
    Spline36,
    /// Cubic spline through 8 sample points, support 4.
    Spline64,
    /// Caller-supplied kernel function.
    #[serde(skip)]
    Custom(CustomKernel),
}

fn default_bicubic_c() -> f64 {
    0.5
}

fn default_lanczos_taps() -> usize {
    3
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Bicubic { b: 0.0, c: 0.5 }
    }
}

impl Kernel {
    /// Half-width of the kernel's non-zero extent in destination pixels.
    pub fn support(&self) -> usize {
        match self {
            Kernel::Bilinear => 1,
            Kernel::Bicubic { .. } | Kernel::Spline16 => 2,
            Kernel::Lanczos { taps } => *taps,
            Kernel::Spline36 => 3,
            Kernel::Spline64 => 4,
            Kernel::Custom(k) => k.taps(),
        }
    }

    /// Evaluate the kernel response at a signed `distance`.
    pub fn evaluate(&self, distance: f64) -> f64 {
        let d = distance.abs();
        match self {
            Kernel::Bilinear => (1.0 - d).max(0.0),
            Kernel::Bicubic { b, c } => bicubic_weight(*b, *c, d),
            Kernel::Lanczos { taps } => {
                let taps = *taps as f64;
                if d < taps {
                    sinc(d) * sinc(d / taps)
                } else {
                    0.0
                }
            }
            Kernel::Spline16 => spline::spline16(d),
            Kernel::Spline36 => spline::spline36(d),
            Kernel::Spline64 => spline::spline64(d),
            Kernel::Custom(k) => k.evaluate(d),
        }
    }
}

fn bicubic_weight(b: f64, c: f64, d: f64) -> f64 {
    if d < 1.0 {
        ((12.0 - 9.0 * b - 6.0 * c) * cube(d) + (-18.0 + 12.0 * b + 6.0 * c) * square(d)
            + (6.0 - 2.0 * b))
            / 6.0
    } else if d < 2.0 {
        ((-b - 6.0 * c) * cube(d) + (6.0 * b + 30.0 * c) * square(d)
            + (-12.0 * b - 48.0 * c) * d
            + (8.0 * b + 24.0 * c))
            / 6.0
    } else {
        0.0
    }
}

/// Normalised sinc with `sinc(0) = 1`.
fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (x * std::f64::consts::PI).sin() / (x * std::f64::consts::PI)
    }
}

#[inline]
pub(crate) fn square(x: f64) -> f64 {
    x * x
}

#[inline]
pub(crate) fn cube(x: f64) -> f64 {
    x * x * x
}
