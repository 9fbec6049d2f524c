//! Caller-supplied kernels and the per-build evaluation cache.

use log::warn;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A user-defined resampling kernel.
///
/// The function receives the absolute distance in destination pixels and
/// returns the kernel response. It must be pure: the weight builder may call
/// it many times for the same argument and is allowed to cache results by
/// the bit pattern of the input. A non-finite return value is tolerated and
/// treated as 0, with a warning.
#[derive(Clone)]
pub struct CustomKernel {
    f: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
    taps: usize,
}

impl CustomKernel {
    pub fn new<F>(taps: usize, f: F) -> Self
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Self { f: Arc::new(f), taps }
    }

    /// Half-width of the kernel in destination pixels.
    pub fn taps(&self) -> usize {
        self.taps
    }

    pub(crate) fn evaluate(&self, d: f64) -> f64 {
        let v = (self.f)(d);
        if v.is_finite() {
            v
        } else {
            warn!("custom kernel returned {v} at distance {d}, using 0");
            0.0
        }
    }
}

impl fmt::Debug for CustomKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomKernel")
            .field("taps", &self.taps)
            .finish_non_exhaustive()
    }
}

/// Memoises kernel evaluations for the duration of one operator build.
///
/// Only custom kernels are cached; the built-in kernels are cheaper to
/// re-evaluate than to look up. Keys are the bit patterns of the distance,
/// which is sound because the builder always derives distances from the same
/// grid arithmetic.
pub(crate) struct KernelCache<'a> {
    kernel: &'a super::Kernel,
    cache: Option<RefCell<HashMap<u64, f64>>>,
}

impl<'a> KernelCache<'a> {
    pub(crate) fn new(kernel: &'a super::Kernel) -> Self {
        let cache = match kernel {
            super::Kernel::Custom(_) => Some(RefCell::new(HashMap::new())),
            _ => None,
        };
        Self { kernel, cache }
    }

    pub(crate) fn evaluate(&self, distance: f64) -> f64 {
        match &self.cache {
            None => self.kernel.evaluate(distance),
            Some(cache) => {
                let key = distance.abs().to_bits();
                if let Some(&v) = cache.borrow().get(&key) {
                    return v;
                }
                let v = self.kernel.evaluate(distance);
                cache.borrow_mut().insert(key, v);
                v
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn custom_kernel_evaluates_through_the_callback() {
        let k = CustomKernel::new(1, |d| (1.0 - d).max(0.0));
        assert_eq!(k.evaluate(0.0), 1.0);
        assert_eq!(k.evaluate(0.25), 0.75);
        assert_eq!(k.evaluate(2.0), 0.0);
    }

    #[test]
    fn non_finite_returns_become_zero() {
        let k = CustomKernel::new(1, |_| f64::NAN);
        assert_eq!(k.evaluate(0.5), 0.0);
    }

    #[test]
    fn cache_coalesces_repeated_distances() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let kernel = Kernel::Custom(CustomKernel::new(2, move |d| {
            counter.fetch_add(1, Ordering::Relaxed);
            (1.0 - d / 2.0).max(0.0)
        }));
        let cache = KernelCache::new(&kernel);
        for _ in 0..10 {
            cache.evaluate(0.25);
            cache.evaluate(-0.25);
            cache.evaluate(1.75);
        }
        // One call per distinct |distance|.
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn builtin_kernels_bypass_the_cache() {
        let kernel = Kernel::Bilinear;
        let cache = KernelCache::new(&kernel);
        assert!(cache.cache.is_none());
        assert_eq!(cache.evaluate(0.5), 0.5);
    }
}
