//! Separable 2-D orchestration of the per-axis solver.
//!
//! A [`Descaler`] owns validated parameters and a lazily built set of
//! per-axis cores. The first call that needs the cores builds them behind a
//! one-shot gate; afterwards the filter is immutable and callable from any
//! number of threads. A 2-D request runs the horizontal core over all rows
//! into an intermediate plane, then the vertical core over all columns;
//! axes that need no work are skipped, and when neither does the input is
//! passed through unchanged.

mod params;

pub use params::FilterParams;

use crate::error::DescaleError;
use crate::frame::Frame;
use crate::image::Plane;
use crate::solver::{CoreParams, DescaleApi, DescaleCore, Direction};
use log::debug;
use std::sync::OnceLock;

/// Runtime gate for splitting horizontal passes across threads.
///
/// Only horizontal passes parallelise: their destination rows are disjoint
/// memory chunks. Vertical passes interleave columns and stay sequential.
#[derive(Clone, Copy, Debug)]
pub struct ParallelPolicy {
    enabled: bool,
    min_vectors_for_parallel: usize,
    chunk_rows: usize,
}

impl ParallelPolicy {
    pub fn new(enabled: bool, min_vectors_for_parallel: usize) -> Self {
        Self {
            enabled,
            min_vectors_for_parallel: min_vectors_for_parallel.max(1),
            chunk_rows: 32,
        }
    }

    /// Never split, regardless of row count.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_vectors_for_parallel: usize::MAX,
            chunk_rows: 32,
        }
    }

    /// True when a pass over `count` vectors should be split.
    pub fn should_parallelize(&self, count: usize) -> bool {
        self.enabled && count >= self.min_vectors_for_parallel
    }

    /// Rows per work unit when splitting.
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            min_vectors_for_parallel: 64,
            chunk_rows: 32,
        }
    }
}

/// Cores for the axes and plane resolutions this filter can touch.
#[derive(Debug)]
struct CoreSet {
    h_full: Option<DescaleCore>,
    h_sub: Option<DescaleCore>,
    v_full: Option<DescaleCore>,
    v_sub: Option<DescaleCore>,
}

/// A validated, reusable 2-D descale (or upscale) filter.
#[derive(Debug)]
pub struct Descaler {
    params: FilterParams,
    src_width: usize,
    src_height: usize,
    subsampling_w: u32,
    subsampling_h: u32,
    process_h: bool,
    process_v: bool,
    api: DescaleApi,
    parallel: ParallelPolicy,
    cores: OnceLock<CoreSet>,
}

impl Descaler {
    /// Filter for single-plane input of `src_width x src_height`.
    pub fn new(
        src_width: usize,
        src_height: usize,
        params: FilterParams,
    ) -> Result<Self, DescaleError> {
        Self::new_planar(src_width, src_height, 0, 0, params)
    }

    /// Filter for planar input with power-of-two chroma subsampling.
    pub fn new_planar(
        src_width: usize,
        src_height: usize,
        subsampling_w: u32,
        subsampling_h: u32,
        params: FilterParams,
    ) -> Result<Self, DescaleError> {
        if params.width < 1 || params.height < 1 {
            return Err(DescaleError::EmptyOutput);
        }
        if params.width % (1 << subsampling_w) != 0 {
            return Err(DescaleError::IncompatibleSubsampling {
                axis: "width",
                dim: params.width,
                factor: 1 << subsampling_w,
            });
        }
        if params.height % (1 << subsampling_h) != 0 {
            return Err(DescaleError::IncompatibleSubsampling {
                axis: "height",
                dim: params.height,
                factor: 1 << subsampling_h,
            });
        }

        let active_w = params
            .src_width
            .unwrap_or(if params.upscale { src_width } else { params.width } as f64);
        let active_h = params
            .src_height
            .unwrap_or(if params.upscale { src_height } else { params.height } as f64);

        let process_h = params.width != src_width
            || params.src_left != 0.0
            || active_w != params.width as f64
            || params.force
            || params.force_h;
        let process_v = params.height != src_height
            || params.src_top != 0.0
            || active_h != params.height as f64
            || params.force
            || params.force_v;

        let filter = Self {
            api: DescaleApi::select(params.opt),
            params,
            src_width,
            src_height,
            subsampling_w,
            subsampling_h,
            process_h,
            process_v,
            parallel: ParallelPolicy::default(),
            cores: OnceLock::new(),
        };

        // Validate every core this filter could build, so the lazy build
        // cannot fail later.
        if process_h {
            filter
                .axis_params(Direction::Horizontal, 0)
                .validate(src_width, filter.params.width)?;
            if subsampling_w > 0 {
                filter
                    .axis_params(Direction::Horizontal, subsampling_w)
                    .validate(src_width >> subsampling_w, filter.params.width >> subsampling_w)?;
            }
        }
        if process_v {
            filter
                .axis_params(Direction::Vertical, 0)
                .validate(src_height, filter.params.height)?;
            if subsampling_h > 0 {
                filter
                    .axis_params(Direction::Vertical, subsampling_h)
                    .validate(
                        src_height >> subsampling_h,
                        filter.params.height >> subsampling_h,
                    )?;
            }
        }

        debug!(
            "descaler {}x{} -> {}x{} process_h={} process_v={} upscale={}",
            src_width,
            src_height,
            filter.params.width,
            filter.params.height,
            process_h,
            process_v,
            filter.params.upscale
        );

        Ok(filter)
    }

    /// Replace the parallel-split policy.
    pub fn with_parallel_policy(mut self, policy: ParallelPolicy) -> Self {
        self.parallel = policy;
        self
    }

    /// The policy currently in effect.
    pub fn parallel_policy(&self) -> ParallelPolicy {
        self.parallel
    }

    /// Output width.
    pub fn dst_width(&self) -> usize {
        self.params.width
    }

    /// Output height.
    pub fn dst_height(&self) -> usize {
        self.params.height
    }

    /// False when every plane would pass through untouched.
    pub fn needs_work(&self) -> bool {
        self.process_h || self.process_v
    }

    fn axis_params(&self, dir: Direction, sub: u32) -> CoreParams {
        let (shift, active) = match dir {
            Direction::Horizontal => (self.params.src_left, self.params.src_width),
            Direction::Vertical => (self.params.src_top, self.params.src_height),
        };
        CoreParams {
            kernel: self.params.kernel.clone(),
            shift,
            active_dim: active.map(|a| a / (1u64 << sub) as f64),
            blur: self.params.blur,
            border: self.params.border_handling,
            post_conv: self.params.post_conv.clone(),
            upscale: self.params.upscale,
        }
    }

    fn cores(&self) -> &CoreSet {
        self.cores.get_or_init(|| {
            let build = |dir: Direction, sub: u32, src: usize, dst: usize| {
                DescaleCore::create(src >> sub, dst >> sub, &self.axis_params(dir, sub))
                    .expect("core parameters validated at filter construction")
            };
            CoreSet {
                h_full: self
                    .process_h
                    .then(|| build(Direction::Horizontal, 0, self.src_width, self.params.width)),
                h_sub: (self.process_h && self.subsampling_w > 0).then(|| {
                    build(
                        Direction::Horizontal,
                        self.subsampling_w,
                        self.src_width,
                        self.params.width,
                    )
                }),
                v_full: self
                    .process_v
                    .then(|| build(Direction::Vertical, 0, self.src_height, self.params.height)),
                v_sub: (self.process_v && self.subsampling_h > 0).then(|| {
                    build(
                        Direction::Vertical,
                        self.subsampling_h,
                        self.src_height,
                        self.params.height,
                    )
                }),
            }
        })
    }

    /// Process one full-resolution plane.
    pub fn process_plane(&self, src: &Plane) -> Plane {
        assert_eq!(
            (src.w, src.h),
            (self.src_width, self.src_height),
            "plane dimensions do not match the filter"
        );
        self.run_plane(src, false)
    }

    /// Process a planar frame; chroma planes use the subsampled cores.
    pub fn process_frame(&self, frame: &Frame) -> Result<Frame, DescaleError> {
        if frame.width() != self.src_width || frame.height() != self.src_height {
            return Err(DescaleError::PlaneDimensionMismatch {
                plane: 0,
                got_w: frame.width(),
                got_h: frame.height(),
                want_w: self.src_width,
                want_h: self.src_height,
            });
        }
        for (i, p) in frame.planes.iter().enumerate().skip(1) {
            let want_w = self.src_width >> self.subsampling_w;
            let want_h = self.src_height >> self.subsampling_h;
            if p.w != want_w || p.h != want_h {
                return Err(DescaleError::PlaneDimensionMismatch {
                    plane: i,
                    got_w: p.w,
                    got_h: p.h,
                    want_w,
                    want_h,
                });
            }
        }

        let planes = frame
            .planes
            .iter()
            .enumerate()
            .map(|(i, p)| self.run_plane(p, i > 0))
            .collect();
        Frame::new(planes, self.subsampling_w, self.subsampling_h)
    }

    fn run_plane(&self, src: &Plane, chroma: bool) -> Plane {
        let (sub_w, sub_h) = if chroma {
            (self.subsampling_w, self.subsampling_h)
        } else {
            (0, 0)
        };
        let dst_w = self.params.width >> sub_w;
        let dst_h = self.params.height >> sub_h;

        if !self.process_h && !self.process_v {
            return src.clone();
        }

        let cores = self.cores();
        let h_core = if chroma && self.subsampling_w > 0 {
            cores.h_sub.as_ref()
        } else {
            cores.h_full.as_ref()
        };
        let v_core = if chroma && self.subsampling_h > 0 {
            cores.v_sub.as_ref()
        } else {
            cores.v_full.as_ref()
        };

        match (self.process_h, self.process_v) {
            (true, true) => {
                let h_core = h_core.expect("horizontal core built");
                let v_core = v_core.expect("vertical core built");
                let mut intermediate = Plane::new(dst_w, src.h);
                self.run_axis(
                    h_core,
                    Direction::Horizontal,
                    src.h,
                    src.stride,
                    intermediate.stride,
                    &src.data,
                    &mut intermediate.data,
                );
                let mut out = Plane::new(dst_w, dst_h);
                self.run_axis(
                    v_core,
                    Direction::Vertical,
                    dst_w,
                    intermediate.stride,
                    out.stride,
                    &intermediate.data,
                    &mut out.data,
                );
                out
            }
            (true, false) => {
                let h_core = h_core.expect("horizontal core built");
                let mut out = Plane::new(dst_w, src.h);
                self.run_axis(
                    h_core,
                    Direction::Horizontal,
                    src.h,
                    src.stride,
                    out.stride,
                    &src.data,
                    &mut out.data,
                );
                out
            }
            (false, true) => {
                let v_core = v_core.expect("vertical core built");
                let mut out = Plane::new(src.w, dst_h);
                self.run_axis(
                    v_core,
                    Direction::Vertical,
                    src.w,
                    src.stride,
                    out.stride,
                    &src.data,
                    &mut out.data,
                );
                out
            }
            (false, false) => unreachable!("handled by the passthrough above"),
        }
    }

    fn run_axis(
        &self,
        core: &DescaleCore,
        dir: Direction,
        count: usize,
        src_stride: usize,
        dst_stride: usize,
        srcp: &[f32],
        dstp: &mut [f32],
    ) {
        #[cfg(feature = "parallel")]
        {
            if dir == Direction::Horizontal && self.parallel.should_parallelize(count) {
                use rayon::prelude::*;

                let rows = self.parallel.chunk_rows();
                dstp.par_chunks_mut(rows * dst_stride)
                    .zip(srcp.par_chunks(rows * src_stride))
                    .for_each(|(dst_chunk, src_chunk)| {
                        let n = dst_chunk.len() / dst_stride;
                        (self.api.process_vectors)(
                            core, dir, n, src_stride, dst_stride, src_chunk, dst_chunk,
                        );
                    });
                return;
            }
        }

        (self.api.process_vectors)(core, dir, count, src_stride, dst_stride, srcp, dstp);
    }
}
