use crate::{
    algorithms::{
        ExtentProjector, LargestAreaSelector, LargestContourPoints, MorphologicalSkeletonizer,
        SkeletonPoints, TotalLeastSquaresFitter,
    },
    config::PipelineConfig,
    error::Result,
    pipeline::Pipeline,
    traits::{LineFitter, MaskSelector, PointSource, SegmentProjector, Skeletonizer},
};

/// Builder for creating seam pipelines with a fluent API.
///
/// Stages left unset fall back to the default implementations. Without explicit
/// point sources the pipeline tries the skeleton first and then, unless disabled,
/// the largest mask contour.
pub struct PipelineBuilder {
    selector: Option<Box<dyn MaskSelector>>,
    skeletonizer: Option<Box<dyn Skeletonizer>>,
    point_sources: Vec<Box<dyn PointSource>>,
    contour_fallback: bool,
    fitter: Option<Box<dyn LineFitter>>,
    projector: Option<Box<dyn SegmentProjector>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            selector: None,
            skeletonizer: None,
            point_sources: Vec::new(),
            contour_fallback: true,
            fitter: None,
            projector: None,
        }
    }

    /// Start from a validated configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new()
            .with_threshold(config.threshold)
            .set_line_fitter(TotalLeastSquaresFitter {
                isotropy_tolerance: config.isotropy_tolerance,
            });
        if let Some(cap) = config.max_thinning_iterations {
            builder = builder.with_thinning_cap(cap);
        }
        if !config.contour_fallback {
            builder = builder.without_contour_fallback();
        }
        Ok(builder)
    }

    /// Set the mask selector (replaces any existing one)
    pub fn set_selector<S>(mut self, selector: S) -> Self
    where
        S: MaskSelector + 'static,
    {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Set the skeletonizer (replaces any existing one)
    pub fn set_skeletonizer<S>(mut self, skeletonizer: S) -> Self
    where
        S: Skeletonizer + 'static,
    {
        self.skeletonizer = Some(Box::new(skeletonizer));
        self
    }

    /// Append a point source; sources are tried in the order they were added
    pub fn add_point_source<P>(mut self, source: P) -> Self
    where
        P: PointSource + 'static,
    {
        self.point_sources.push(Box::new(source));
        self
    }

    /// Set the line fitter (replaces any existing one)
    pub fn set_line_fitter<F>(mut self, fitter: F) -> Self
    where
        F: LineFitter + 'static,
    {
        self.fitter = Some(Box::new(fitter));
        self
    }

    /// Set the segment projector (replaces any existing one)
    pub fn set_projector<P>(mut self, projector: P) -> Self
    where
        P: SegmentProjector + 'static,
    {
        self.projector = Some(Box::new(projector));
        self
    }

    /// Select masks with the largest area above `threshold`
    pub fn with_threshold(self, threshold: f32) -> Self {
        self.set_selector(LargestAreaSelector { threshold })
    }

    /// Limit the number of thinning rounds
    pub fn with_thinning_cap(self, max_iterations: u32) -> Self {
        self.set_skeletonizer(MorphologicalSkeletonizer::with_max_iterations(max_iterations))
    }

    /// Only use skeleton points; a degenerate skeleton ends the run
    pub fn without_contour_fallback(mut self) -> Self {
        self.contour_fallback = false;
        self
    }

    pub fn build(self) -> Pipeline {
        let selector = self.selector
            .unwrap_or_else(|| Box::new(LargestAreaSelector::default()));

        let skeletonizer = self.skeletonizer
            .unwrap_or_else(|| Box::new(MorphologicalSkeletonizer::default()));

        let mut point_sources = self.point_sources;
        if point_sources.is_empty() {
            point_sources.push(Box::new(SkeletonPoints));
            if self.contour_fallback {
                point_sources.push(Box::new(LargestContourPoints));
            }
        }

        let fitter = self.fitter
            .unwrap_or_else(|| Box::new(TotalLeastSquaresFitter::default()));

        let projector = self.projector
            .unwrap_or_else(|| Box::new(ExtentProjector));

        Pipeline::new(selector, skeletonizer, point_sources, fitter, projector)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
