use image::GrayImage;
use imageproc::{
    distance_transform::Norm,
    morphology::{dilate, erode},
};
use tracing::{debug, warn};

use crate::{
    error::Result,
    traits::Skeletonizer,
    types::{BinaryMask, MASK_ON},
};

/// Morphological skeleton by erosion/opening-residue accumulation.
///
/// Each round erodes the working mask with a 3x3 cross, re-dilates it to get the
/// opening, and keeps whatever the opening failed to recover. The working mask is
/// then replaced by its erosion until nothing is left. Pixels outside the grid take
/// part in neither erosion nor dilation.
#[derive(Debug, Clone, Default)]
pub struct MorphologicalSkeletonizer {
    /// Overrides the default cap of `width + height` rounds, which bounds the L1
    /// distance from any pixel to the nearest background pixel inside the grid.
    pub max_iterations: Option<u32>,
}

impl MorphologicalSkeletonizer {
    pub fn with_max_iterations(max_iterations: u32) -> Self {
        Self {
            max_iterations: Some(max_iterations),
        }
    }

    fn iteration_cap(&self, width: u32, height: u32) -> u32 {
        self.max_iterations
            .unwrap_or_else(|| width.saturating_add(height))
            .max(1)
    }
}

impl Skeletonizer for MorphologicalSkeletonizer {
    fn skeletonize(&self, mask: &BinaryMask) -> Result<BinaryMask> {
        let (width, height) = mask.dimensions();
        let mut skeleton = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return Ok(skeleton);
        }

        let cap = self.iteration_cap(width, height);
        let mut working = mask.clone();

        for round in 1..=cap {
            // L1 radius 1 is the 4-connected cross
            let eroded = erode(&working, Norm::L1, 1);
            let opened = dilate(&eroded, Norm::L1, 1);
            accumulate_residue(&mut skeleton, &working, &opened);

            if foreground_count(&eroded) == 0 {
                debug!(rounds = round, "skeleton converged");
                return Ok(skeleton);
            }
            working = eroded;
        }

        warn!(
            cap,
            remaining = foreground_count(&working),
            "skeleton did not converge within the iteration cap"
        );
        Ok(skeleton)
    }
}

/// `skeleton |= working & !opened`
fn accumulate_residue(skeleton: &mut GrayImage, working: &GrayImage, opened: &GrayImage) {
    for ((s, w), o) in skeleton.iter_mut().zip(working.iter()).zip(opened.iter()) {
        if *w > 0 && *o == 0 {
            *s = MASK_ON;
        }
    }
}

pub fn foreground_count(mask: &BinaryMask) -> usize {
    mask.iter().filter(|&&v| v > 0).count()
}
