#![doc = include_str!("../README.md")]

pub mod error;
pub mod filter;
pub mod frame;
pub mod image;
pub mod kernel;
pub mod matrix;
pub mod solver;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{DescaleError, ErrorKind};
pub use crate::filter::{Descaler, FilterParams, ParallelPolicy};
pub use crate::frame::Frame;
pub use crate::image::Plane;
pub use crate::kernel::{CustomKernel, Kernel};
pub use crate::matrix::{Border, Sampling, ScalingWeights};
pub use crate::solver::{
    BandedFactor, CoreParams, DescaleApi, DescaleCore, Direction, Opt,
};

/// Small prelude for quick experiments.
///
/// ```no_run
/// use descale::prelude::*;
///
/// # fn main() -> Result<(), descale::DescaleError> {
/// let observed = Plane::new(100, 100);
/// let descaler = Descaler::new(100, 100, FilterParams::new(50, 50))?;
/// let native = descaler.process_plane(&observed);
/// assert_eq!((native.w, native.h), (50, 50));
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{Border, Descaler, FilterParams, Frame, Kernel, Plane};
}
