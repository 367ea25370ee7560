use crate::joint::Joint;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Skeleton is not initialized: all seed points must be set first")]
    Uninitialized,

    #[error("Skeleton seeding is already complete")]
    SeedingComplete,

    #[error("History frame {frame} is beyond the calculated prefix (calculated up to {calculated})")]
    HistoryGap { frame: usize, calculated: usize },

    #[error("Frame {frame} is out of range (history holds {len} frames)")]
    FrameOutOfRange { frame: usize, len: usize },

    #[error("Depth frame shape {depth:?} does not match mask shape {mask:?}")]
    ShapeMismatch {
        depth: (usize, usize),
        mask: (usize, usize),
    },

    #[error("Joint {0} cannot be adjusted manually")]
    NotAdjustable(Joint),

    #[error("History parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
}
