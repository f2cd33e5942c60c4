use tracing::trace;

use crate::{
    error::{Result, SeamError},
    traits::MaskSelector,
    types::{MaskCandidate, ProbabilityMask},
};

/// Probability above which a pixel belongs to the mask
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Picks the candidate with the largest thresholded footprint.
///
/// Ties keep the earliest candidate, and a candidate with zero area is never selected.
#[derive(Debug, Clone)]
pub struct LargestAreaSelector {
    pub threshold: f32,
}

impl Default for LargestAreaSelector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl MaskSelector for LargestAreaSelector {
    fn select(&self, masks: &[ProbabilityMask]) -> Result<MaskCandidate> {
        let Some(first) = masks.first() else {
            return Err(SeamError::NoCandidateMask);
        };
        let expected = first.dimensions();

        let mut best: Option<MaskCandidate> = None;
        for (index, probabilities) in masks.iter().enumerate() {
            let found = probabilities.dimensions();
            if found != expected {
                return Err(SeamError::DimensionMismatch {
                    index,
                    expected,
                    found,
                });
            }

            let candidate = MaskCandidate::from_probabilities(index, probabilities, self.threshold);
            trace!(index, area = candidate.area, "thresholded mask candidate");

            let best_area = best.as_ref().map_or(0, |b| b.area);
            if candidate.area > best_area {
                best = Some(candidate);
            }
        }

        best.ok_or(SeamError::NoCandidateMask)
    }
}
