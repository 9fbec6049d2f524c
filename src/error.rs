//! Error types reported while validating and building descale cores.
//!
//! Every failure is reported at construction time; solves never fail. The
//! variants carry the offending values so callers can print actionable
//! messages, and [`DescaleError::kind`] groups them into the three broad
//! classes a host usually dispatches on.

use thiserror::Error;

/// Broad classification of a construction-time failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Dimensions or plane layout incompatible with the request.
    Shape,
    /// A numeric parameter outside its valid range.
    Parameter,
    /// A defect in the supplied kernel definition.
    Kernel,
}

/// Errors returned by [`crate::DescaleCore::create`] and [`crate::Descaler::new`].
#[derive(Debug, Error)]
pub enum DescaleError {
    #[error("output dimension must be at least 1")]
    EmptyOutput,

    #[error("output dimension {dst} must not exceed input dimension {src} when descaling")]
    OutputExceedsInput { src: usize, dst: usize },

    #[error("output dimension {dst} must not be smaller than input dimension {src} when upscaling")]
    OutputSmallerThanInput { src: usize, dst: usize },

    #[error("output {axis} {dim} is not divisible by the subsampling factor {factor}")]
    IncompatibleSubsampling {
        axis: &'static str,
        dim: usize,
        factor: usize,
    },

    #[error("blur {blur} is out of range for a {src} to {dst} solve")]
    BlurOutOfRange { blur: f64, src: usize, dst: usize },

    #[error("kernel taps must be at least 1, got {0}")]
    InvalidTaps(usize),

    #[error("custom kernel support must be at least 1 tap, got {0}")]
    UnusableCustomKernel(usize),

    #[error("post-convolution kernel must have odd length, got {0}")]
    EvenPostConv(usize),

    #[error("post-convolution kernel of length {len} exceeds the output dimension (max {max})")]
    PostConvTooLarge { len: usize, max: usize },

    #[error("frame has {0} planes, expected 1 or 3")]
    BadPlaneCount(usize),

    #[error("plane {plane} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    PlaneDimensionMismatch {
        plane: usize,
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
}

impl DescaleError {
    /// Classify this error for hosts that only branch on the broad kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyOutput
            | Self::OutputExceedsInput { .. }
            | Self::OutputSmallerThanInput { .. }
            | Self::IncompatibleSubsampling { .. }
            | Self::BadPlaneCount(_)
            | Self::PlaneDimensionMismatch { .. } => ErrorKind::Shape,
            Self::BlurOutOfRange { .. }
            | Self::InvalidTaps(_)
            | Self::EvenPostConv(_)
            | Self::PostConvTooLarge { .. } => ErrorKind::Parameter,
            Self::UnusableCustomKernel(_) => ErrorKind::Kernel,
        }
    }
}
