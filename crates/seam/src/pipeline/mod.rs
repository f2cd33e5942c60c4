pub mod builder;

use tracing::debug;

use crate::{
    config::PipelineConfig,
    error::{Result, SeamError},
    traits::{LineFitter, MaskSelector, PointSource, SegmentProjector, Skeletonizer},
    types::{BinaryMask, PointOutcome, PointSet, ProbabilityMask, SeamDetection, Segment},
};

/// The seam extraction pipeline.
///
/// Stages run strictly in order: mask selection, skeletonization, point collection,
/// line fitting, segment projection. Point sources are tried in sequence until one
/// yields enough points. A pipeline holds no per-run state and can be shared across
/// threads.
pub struct Pipeline {
    selector: Box<dyn MaskSelector>,
    skeletonizer: Box<dyn Skeletonizer>,
    point_sources: Vec<Box<dyn PointSource>>,
    fitter: Box<dyn LineFitter>,
    projector: Box<dyn SegmentProjector>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Build the default stages with the given parameters
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Ok(builder::PipelineBuilder::from_config(config)?.build())
    }

    pub fn new(
        selector: Box<dyn MaskSelector>,
        skeletonizer: Box<dyn Skeletonizer>,
        point_sources: Vec<Box<dyn PointSource>>,
        fitter: Box<dyn LineFitter>,
        projector: Box<dyn SegmentProjector>,
    ) -> Self {
        Self {
            selector,
            skeletonizer,
            point_sources,
            fitter,
            projector,
        }
    }

    /// Run every stage over the candidate masks.
    ///
    /// Fails with one of the "no result" errors (see [`SeamError::is_no_result`]) when
    /// no line can be extracted, or with an input error for inconsistent masks.
    pub fn process(&self, masks: &[ProbabilityMask]) -> Result<SeamDetection> {
        let candidate = self.selector.select(masks)?;
        debug!(index = candidate.index, area = candidate.area, "selected mask candidate");

        let skeleton = self.skeletonizer.skeletonize(&candidate.mask)?;
        let points = self.collect_points(&candidate.mask, &skeleton)?;
        debug!(source = %points.source, count = points.len(), "collected fit points");

        let line = self.fitter.fit(&points)?;
        let segment = self.projector.project(&points, &line)?;
        debug!(?segment, angle = line.angle_degrees(), "fitted seam segment");

        let (image_width, image_height) = candidate.mask.dimensions();
        Ok(SeamDetection {
            segment,
            line,
            source: points.source,
            point_count: points.len(),
            candidate_index: candidate.index,
            candidate_area: candidate.area,
            image_width,
            image_height,
        })
    }

    /// Like [`Pipeline::process`], but folds every "no result" outcome into `None`.
    pub fn detect(&self, masks: &[ProbabilityMask]) -> Result<Option<Segment>> {
        match self.process(masks) {
            Ok(detection) => Ok(Some(detection.segment)),
            Err(err) if err.is_no_result() => {
                debug!(%err, "no seam line");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn collect_points(&self, mask: &BinaryMask, skeleton: &BinaryMask) -> Result<PointSet> {
        let mut shortfall = None;
        for source in &self.point_sources {
            match source.collect(mask, skeleton) {
                PointOutcome::Points(points) => return Ok(points),
                PointOutcome::Insufficient { source, found } => {
                    debug!(%source, found, "too few points from source");
                    shortfall = Some(source.insufficient(found));
                }
            }
        }

        Err(shortfall.unwrap_or_else(|| {
            SeamError::InvalidConfig("pipeline has no point sources".to_string())
        }))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        let sources: Vec<String> = self
            .point_sources
            .iter()
            .map(|source| source.kind().to_string())
            .collect();
        format!("Pipeline: point sources [{}]", sources.join(" -> "))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        builder::PipelineBuilder::new().build()
    }
}
