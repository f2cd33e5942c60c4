use crate::{
    error::Result,
    types::{
        BinaryMask, LineModel, MaskCandidate, PointOutcome, PointSet, PointSourceKind,
        ProbabilityMask, Segment,
    },
};

/// Trait for choosing one mask out of the segmentation candidates
pub trait MaskSelector: Send + Sync {
    /// Binarize the candidates and pick one, or fail with `NoCandidateMask`
    fn select(&self, masks: &[ProbabilityMask]) -> Result<MaskCandidate>;
}

/// Trait for thinning a binary mask
pub trait Skeletonizer: Send + Sync {
    /// Produce a skeleton that is a subset of `mask`
    fn skeletonize(&self, mask: &BinaryMask) -> Result<BinaryMask>;
}

/// One attempt at collecting the points a line is fitted through
pub trait PointSource: Send + Sync {
    fn kind(&self) -> PointSourceKind;

    /// Collect points from the selected mask or its skeleton
    fn collect(&self, mask: &BinaryMask, skeleton: &BinaryMask) -> PointOutcome;
}

/// Trait for line fitting algorithms
pub trait LineFitter: Send + Sync {
    fn fit(&self, points: &PointSet) -> Result<LineModel>;
}

/// Trait for turning a fitted line into a bounded segment
pub trait SegmentProjector: Send + Sync {
    fn project(&self, points: &PointSet, line: &LineModel) -> Result<Segment>;
}
