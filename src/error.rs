use crate::enums::Orientation;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResliceError {
    #[error("source geometry unavailable: missing {0}")]
    SourceGeometryUnavailable(&'static str),

    #[error("unsupported orientation transform: {from:?} -> {to:?}")]
    UnsupportedTransform { from: Orientation, to: Orientation },

    #[error("native series '{0}' is not ready")]
    NativeNotReady(String),

    #[error("series contains no slices")]
    EmptySeries,

    #[error("inconsistent slice dimensions")]
    InconsistentDimensions,

    #[error("frame {frame} out of range for stack depth {depth}")]
    FrameOutOfRange { frame: usize, depth: usize },

    #[error("pixel buffer missing for slice '{0}'")]
    MissingPixels(String),

    #[error("slice '{0}' carries no reslice origin")]
    NotDerived(String),

    #[error("reslice cancelled")]
    Cancelled,
}
