//! Runtime selection of the vector-processing implementation.
//!
//! The solver entry point is carried as a function pointer inside a
//! [`DescaleApi`] value selected once, when a filter is constructed. There
//! is no process-wide state; callers hold the table they picked. Only the
//! scalar implementation is compiled in, so every selection currently
//! resolves to it.

use super::{process, DescaleCore, Direction};
use log::debug;
use serde::Deserialize;

/// Implementation preference for the vector solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opt {
    /// Pick the best implementation available.
    #[default]
    Auto,
    /// Force the portable scalar implementation.
    None,
    /// Request the AVX2 implementation where available.
    Avx2,
}

/// Signature of a vector-processing entry point.
pub type ProcessFn =
    fn(&DescaleCore, Direction, usize, usize, usize, &[f32], &mut [f32]);

/// A selected, immutable function table.
#[derive(Clone, Copy, Debug)]
pub struct DescaleApi {
    pub process_vectors: ProcessFn,
}

impl DescaleApi {
    /// Select a table according to `opt`.
    pub fn select(opt: Opt) -> Self {
        match opt {
            Opt::Avx2 => {
                debug!("avx2 vector path requested but not compiled in, using scalar");
                Self::scalar()
            }
            Opt::Auto | Opt::None => Self::scalar(),
        }
    }

    fn scalar() -> Self {
        Self {
            process_vectors: process::process_vectors,
        }
    }
}
