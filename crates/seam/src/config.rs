use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{DEFAULT_ISOTROPY_TOLERANCE, DEFAULT_THRESHOLD},
    error::{Result, SeamError},
};

/// Tunable parameters of the seam pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PipelineConfig {
    /// Probability above which a mask pixel is foreground
    #[schemars(range(min = 0.0, max = 1.0))]
    pub threshold: f32,

    /// Thinning round limit; defaults to the mask width plus height
    pub max_thinning_iterations: Option<u32>,

    /// Fall back to the mask's largest contour when the skeleton has too few points
    pub contour_fallback: bool,

    /// Relative eigenvalue gap under which the point scatter counts as isotropic
    pub isotropy_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_thinning_iterations: None,
            contour_fallback: true,
            isotropy_tolerance: DEFAULT_ISOTROPY_TOLERANCE,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold.is_finite() && (0.0..1.0).contains(&self.threshold)) {
            return Err(SeamError::InvalidConfig(format!(
                "threshold must be in [0, 1), got {}",
                self.threshold
            )));
        }
        if self.max_thinning_iterations == Some(0) {
            return Err(SeamError::InvalidConfig(
                "max_thinning_iterations must be at least 1".to_string(),
            ));
        }
        if !(self.isotropy_tolerance.is_finite() && self.isotropy_tolerance >= 0.0) {
            return Err(SeamError::InvalidConfig(format!(
                "isotropy_tolerance must be a non-negative number, got {}",
                self.isotropy_tolerance
            )));
        }
        Ok(())
    }
}
