use crate::{
    error::Result,
    traits::SegmentProjector,
    types::{LineModel, PointSet, Segment},
};

/// Clips the fitted line to the extent of the point cloud along it.
///
/// Endpoints are rounded to the nearest pixel, halves away from zero. A cloud that
/// projects to a single parameter gives a zero-length segment.
#[derive(Debug, Clone, Default)]
pub struct ExtentProjector;

impl SegmentProjector for ExtentProjector {
    fn project(&self, points: &PointSet, line: &LineModel) -> Result<Segment> {
        if points.is_empty() {
            return Err(points.source.insufficient(0));
        }

        let (t_min, t_max) = points
            .iter()
            .map(|&[x, y]| line.parameter_of([f64::from(x), f64::from(y)]))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
                (lo.min(t), hi.max(t))
            });

        Ok(Segment::new(
            to_pixel(line.point_at(t_min)),
            to_pixel(line.point_at(t_max)),
        ))
    }
}

#[inline]
fn to_pixel(p: [f64; 2]) -> [i32; 2] {
    [p[0].round() as i32, p[1].round() as i32]
}
