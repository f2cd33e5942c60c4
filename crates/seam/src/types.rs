use image::{GrayImage, ImageBuffer, Luma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::SeamError;

/// Per-pixel foreground probabilities for one detected instance.
pub type ProbabilityMask = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Binarized mask: `0` is background, [`MASK_ON`] is foreground.
pub type BinaryMask = GrayImage;

/// Pixel value of a foreground pixel in a [`BinaryMask`].
pub const MASK_ON: u8 = 255;

/// Fewest points a line can be fitted through.
pub const MIN_FIT_POINTS: usize = 2;

/// A thresholded instance mask and its footprint area
#[derive(Debug, Clone)]
pub struct MaskCandidate {
    /// Position of the candidate in the input sequence
    pub index: usize,
    pub mask: BinaryMask,
    /// Number of foreground pixels
    pub area: u64,
}

impl MaskCandidate {
    /// Binarize a probability grid; pixels strictly above `threshold` are foreground.
    pub fn from_probabilities(index: usize, probabilities: &ProbabilityMask, threshold: f32) -> Self {
        let (width, height) = probabilities.dimensions();
        let mut mask = GrayImage::new(width, height);
        let mut area = 0u64;

        for (x, y, p) in probabilities.enumerate_pixels() {
            if p[0] > threshold {
                mask.put_pixel(x, y, Luma([MASK_ON]));
                area += 1;
            }
        }

        Self { index, mask, area }
    }
}

/// Where a point set came from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PointSourceKind {
    /// Foreground pixels of the morphological skeleton
    Skeleton,
    /// Vertices of the mask's largest external contour
    Contour,
}

impl PointSourceKind {
    /// The error reported when this source is the last one and came up short.
    pub fn insufficient(self, found: usize) -> SeamError {
        match self {
            Self::Skeleton => SeamError::InsufficientSkeletonPoints { found },
            Self::Contour => SeamError::InsufficientContourPoints { found },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointSet {
    pub source: PointSourceKind,
    /// Integer `[x, y]` pixel coordinates, in collection order
    pub points: Vec<[i32; 2]>,
}

impl PointSet {
    pub fn new(source: PointSourceKind, points: Vec<[i32; 2]>) -> Self {
        Self { source, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[i32; 2]> {
        self.points.iter()
    }
}

/// Result of one point-collection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOutcome {
    Points(PointSet),
    Insufficient { source: PointSourceKind, found: usize },
}

impl PointOutcome {
    /// Wrap `points` as usable only if there are enough of them to fit a line.
    pub fn from_points(source: PointSourceKind, points: Vec<[i32; 2]>) -> Self {
        if points.len() < MIN_FIT_POINTS {
            Self::Insufficient {
                source,
                found: points.len(),
            }
        } else {
            Self::Points(PointSet::new(source, points))
        }
    }
}

/// A line through `anchor` along the unit vector `direction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LineModel {
    pub direction: [f64; 2],
    pub anchor: [f64; 2],
}

impl LineModel {
    /// Scalar projection of `point` onto the line, measured from the anchor.
    #[inline]
    pub fn parameter_of(&self, point: [f64; 2]) -> f64 {
        (point[0] - self.anchor[0]) * self.direction[0]
            + (point[1] - self.anchor[1]) * self.direction[1]
    }

    #[inline]
    pub fn point_at(&self, t: f64) -> [f64; 2] {
        [
            self.anchor[0] + t * self.direction[0],
            self.anchor[1] + t * self.direction[1],
        ]
    }

    /// Orientation of the direction vector in degrees, in `(-180, 180]`.
    pub fn angle_degrees(&self) -> f64 {
        self.direction[1].atan2(self.direction[0]).to_degrees()
    }
}

/// The extracted seam: two integer endpoints in image pixel coordinates.
///
/// Serializes as `{"x1":..,"y1":..,"x2":..,"y2":..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(start: [i32; 2], end: [i32; 2]) -> Self {
        Self {
            x1: start[0],
            y1: start[1],
            x2: end[0],
            y2: end[1],
        }
    }

    pub fn start(&self) -> [i32; 2] {
        [self.x1, self.y1]
    }

    pub fn end(&self) -> [i32; 2] {
        [self.x2, self.y2]
    }

    pub fn length(&self) -> f64 {
        let dx = f64::from(self.x2 - self.x1);
        let dy = f64::from(self.y2 - self.y1);
        (dx * dx + dy * dy).sqrt()
    }

    /// Both endpoints coincide
    pub fn is_degenerate(&self) -> bool {
        self.start() == self.end()
    }
}

/// Everything one successful pipeline run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SeamDetection {
    pub segment: Segment,
    pub line: LineModel,
    /// Which point source the line was fitted through
    pub source: PointSourceKind,
    pub point_count: usize,
    /// Index of the selected mask in the input sequence
    pub candidate_index: usize,
    pub candidate_area: u64,
    /// Original image dimensions
    pub image_width: u32,
    pub image_height: u32,
}
