//! Planar frames with power-of-two chroma subsampling.

use crate::error::DescaleError;
use crate::image::Plane;

/// A single- or three-plane float frame.
///
/// Plane 0 carries the full-resolution dimensions; planes 1 and 2, when
/// present, are subsampled by `2^subsampling_w` horizontally and
/// `2^subsampling_h` vertically.
#[derive(Clone, Debug)]
pub struct Frame {
    pub planes: Vec<Plane>,
    pub subsampling_w: u32,
    pub subsampling_h: u32,
}

impl Frame {
    /// Validate plane count and per-plane dimensions.
    pub fn new(
        planes: Vec<Plane>,
        subsampling_w: u32,
        subsampling_h: u32,
    ) -> Result<Self, DescaleError> {
        if planes.len() != 1 && planes.len() != 3 {
            return Err(DescaleError::BadPlaneCount(planes.len()));
        }
        let (w, h) = (planes[0].w, planes[0].h);
        for (i, p) in planes.iter().enumerate().skip(1) {
            let want_w = w >> subsampling_w;
            let want_h = h >> subsampling_h;
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
        Ok(Self {
            planes,
            subsampling_w,
            subsampling_h,
        })
    }

    /// Single-plane frame without subsampling.
    pub fn gray(plane: Plane) -> Self {
        Self {
            planes: vec![plane],
            subsampling_w: 0,
            subsampling_h: 0,
        }
    }

    /// Full-resolution width.
    pub fn width(&self) -> usize {
        self.planes[0].w
    }

    /// Full-resolution height.
    pub fn height(&self) -> usize {
        self.planes[0].h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_plane_counts_and_dimensions() {
        assert!(matches!(
            Frame::new(vec![Plane::new(4, 4), Plane::new(2, 2)], 1, 1),
            Err(DescaleError::BadPlaneCount(2))
        ));

        let planes = vec![Plane::new(4, 4), Plane::new(4, 4), Plane::new(2, 2)];
        assert!(matches!(
            Frame::new(planes, 1, 1),
            Err(DescaleError::PlaneDimensionMismatch { plane: 1, .. })
        ));

        let planes = vec![Plane::new(4, 4), Plane::new(2, 2), Plane::new(2, 2)];
        assert!(Frame::new(planes, 1, 1).is_ok());
    }
}
