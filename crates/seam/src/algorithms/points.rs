use geo::Area;
use geo_types::{Coord, LineString, Polygon};
use image::{imageops, GrayImage};
use imageproc::contours::{find_contours, BorderType};

use crate::{
    traits::PointSource,
    types::{BinaryMask, PointOutcome, PointSourceKind},
};

/// Uses every foreground pixel of the skeleton, in row-major order
#[derive(Debug, Clone, Default)]
pub struct SkeletonPoints;

impl PointSource for SkeletonPoints {
    fn kind(&self) -> PointSourceKind {
        PointSourceKind::Skeleton
    }

    fn collect(&self, _mask: &BinaryMask, skeleton: &BinaryMask) -> PointOutcome {
        PointOutcome::from_points(self.kind(), foreground_points(skeleton))
    }
}

/// Falls back to the boundary of the mask itself: the vertices of the external
/// contour enclosing the largest area
#[derive(Debug, Clone, Default)]
pub struct LargestContourPoints;

impl PointSource for LargestContourPoints {
    fn kind(&self) -> PointSourceKind {
        PointSourceKind::Contour
    }

    fn collect(&self, mask: &BinaryMask, _skeleton: &BinaryMask) -> PointOutcome {
        let points = largest_external_contour(mask).unwrap_or_default();
        PointOutcome::from_points(self.kind(), points)
    }
}

pub fn foreground_points(mask: &BinaryMask) -> Vec<[i32; 2]> {
    mask.enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| [x as i32, y as i32])
        .collect()
}

/// Outermost contour with the largest enclosed area; the first one wins ties.
///
/// Pixels outside the grid count as background, so shapes touching the border
/// are traced along it.
pub fn largest_external_contour(mask: &BinaryMask) -> Option<Vec<[i32; 2]>> {
    let mut best: Option<(f64, Vec<[i32; 2]>)> = None;

    let external = find_contours::<i32>(&with_background_border(mask))
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none());

    for contour in external {
        let points: Vec<[i32; 2]> = contour.points.iter().map(|p| [p.x - 1, p.y - 1]).collect();
        let area = contour_area(&points);

        if best.as_ref().map_or(true, |(best_area, _)| area > *best_area) {
            best = Some((area, points));
        }
    }

    best.map(|(_, points)| points)
}

/// `mask` inset by one pixel into an empty grid
fn with_background_border(mask: &BinaryMask) -> GrayImage {
    let (width, height) = mask.dimensions();
    let mut padded = GrayImage::new(width + 2, height + 2);
    imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Shoelace area of the closed polygon through `points`
pub fn contour_area(points: &[[i32; 2]]) -> f64 {
    let coords: Vec<Coord<f64>> = points
        .iter()
        .map(|&[x, y]| Coord {
            x: f64::from(x),
            y: f64::from(y),
        })
        .collect();

    Polygon::new(LineString::new(coords), vec![]).unsigned_area()
}
