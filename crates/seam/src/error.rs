use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeamError {
    #[error("No candidate mask with a non-empty footprint")]
    NoCandidateMask,

    #[error("Skeleton yielded {found} point(s), at least 2 are required")]
    InsufficientSkeletonPoints { found: usize },

    #[error("Contour fallback yielded {found} point(s), at least 2 are required")]
    InsufficientContourPoints { found: usize },

    #[error("Line fit is degenerate: all points coincide")]
    DegenerateLineFit,

    #[error("Mask {index} is {found:?} pixels, expected {expected:?}")]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

impl SeamError {
    /// True for the outcomes that mean "no line in this input" rather than bad input.
    pub fn is_no_result(&self) -> bool {
        matches!(
            self,
            Self::NoCandidateMask
                | Self::InsufficientSkeletonPoints { .. }
                | Self::InsufficientContourPoints { .. }
                | Self::DegenerateLineFit
        )
    }
}

pub type Result<T> = std::result::Result<T, SeamError>;
