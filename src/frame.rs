use crate::error::Error;
use ndarray::prelude::*;

/// One depth frame together with its foreground mask.
pub struct Frame {
    pub depth: Array2<f32>,
    pub mask: Array2<bool>,
}

impl Frame {
    pub fn new(depth: Array2<f32>, mask: Array2<bool>) -> Result<Self, Error> {
        if depth.dim() != mask.dim() {
            return Err(Error::ShapeMismatch {
                depth: depth.dim(),
                mask: mask.dim(),
            });
        }

        Ok(Self { depth, mask })
    }

    /// Frame with an all-false mask.
    pub fn unmasked(depth: Array2<f32>) -> Self {
        let mask = Array2::from_elem(depth.dim(), false);

        Self { depth, mask }
    }

    /// (rows, cols)
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.depth.dim()
    }

    #[inline]
    pub fn depth_at(&self, x: i64, y: i64) -> Option<f32> {
        if x < 0 || y < 0 {
            return None;
        }

        self.depth.get((y as usize, x as usize)).copied()
    }

    #[inline]
    pub fn is_foreground(&self, row: usize, col: usize) -> bool {
        self.mask.get((row, col)).copied().unwrap_or(false)
    }
}
