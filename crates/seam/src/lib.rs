//! # Weld Seam Line Extraction
//!
//! Extracts a single straight seam line from the instance masks of a segmentation
//! model. The pipeline picks the largest mask, thins it to a morphological skeleton,
//! fits a total-least-squares line through the skeleton pixels (or the mask contour
//! when the skeleton is degenerate) and clips that line to the extent of the points.
//!
//! ## Core Features
//!
//! - **Trait-based Stages**: every stage is a trait with a default implementation
//! - **Typed Fallbacks**: point sources are tried in order, each returning a typed outcome
//! - **Explicit No-Result**: empty or degenerate input never panics, it yields `None`
//! - **Deterministic**: identical input gives a bit-identical segment
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use seam::{Pipeline, ProbabilityMask};
//!
//! let masks: Vec<ProbabilityMask> = Vec::new(); // from the segmentation model
//! let pipeline = Pipeline::builder().build();
//!
//! match pipeline.detect(&masks)? {
//!     Some(segment) => println!("seam: {:?} -> {:?}", segment.start(), segment.end()),
//!     None => println!("no seam line"),
//! }
//! # Ok::<(), seam::SeamError>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use seam::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_threshold(0.6)
//!     .with_thinning_cap(256)
//!     .set_line_fitter(TotalLeastSquaresFitter { isotropy_tolerance: 1e-6 })
//!     .without_contour_fallback()
//!     .build();
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod config;
pub mod pipeline;

pub use error::{Result, SeamError};
pub use types::{
    BinaryMask, LineModel, MaskCandidate, PointOutcome, PointSet, PointSourceKind,
    ProbabilityMask, SeamDetection, Segment, MASK_ON, MIN_FIT_POINTS,
};
pub use traits::*;
pub use config::PipelineConfig;
pub use pipeline::{Pipeline, builder::PipelineBuilder};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{foreground_count, MorphologicalSkeletonizer};
    use image::Luma;

    fn probability_mask(width: u32, height: u32, on: impl Fn(u32, u32) -> bool) -> ProbabilityMask {
        ProbabilityMask::from_fn(width, height, |x, y| {
            if on(x, y) { Luma([1.0]) } else { Luma([0.0]) }
        })
    }

    fn angle_to_axis(line: &LineModel, axis_degrees: f64) -> f64 {
        let diff = (line.angle_degrees() - axis_degrees).rem_euclid(180.0);
        diff.min(180.0 - diff)
    }

    #[test]
    fn test_thin_horizontal_bar() {
        let mask = probability_mask(60, 30, |x, y| (10..50).contains(&x) && (14..16).contains(&y));

        let binary = MaskCandidate::from_probabilities(0, &mask, 0.5).mask;
        let skeleton = MorphologicalSkeletonizer::default().skeletonize(&binary).unwrap();
        assert_eq!(skeleton, binary);

        let detection = Pipeline::default().process(&[mask]).unwrap();
        assert_eq!(detection.source, PointSourceKind::Skeleton);
        assert_eq!(detection.point_count, 80);
        assert!(angle_to_axis(&detection.line, 0.0) < 2.0);
        assert_eq!(detection.segment, Segment::new([10, 15], [49, 15]));
    }

    #[test]
    fn test_one_pixel_vertical_line() {
        let mask = probability_mask(40, 50, |x, y| x == 20 && (5..45).contains(&y));

        let detection = Pipeline::default().process(&[mask]).unwrap();
        assert!(angle_to_axis(&detection.line, 90.0) < 2.0);
        assert_eq!(detection.segment, Segment::new([20, 5], [20, 44]));
    }

    #[test]
    fn test_thick_diagonal_stripe() {
        let mask = probability_mask(100, 100, |x, y| {
            (10..90).contains(&x) && (10..90).contains(&y) && (x as i32 - y as i32).abs() <= 3
        });

        let detection = Pipeline::default().process(&[mask]).unwrap();
        let [dx, dy] = detection.line.direction;
        assert!((dx.abs() - dy.abs()).abs() < 1e-6, "direction {dx}, {dy}");

        let near = |p: [i32; 2], q: [i32; 2]| (p[0] - q[0]).abs() <= 3 && (p[1] - q[1]).abs() <= 3;
        assert!(near(detection.segment.start(), [10, 10]), "{:?}", detection.segment);
        assert!(near(detection.segment.end(), [89, 89]), "{:?}", detection.segment);
    }

    #[test]
    fn test_empty_candidate_set() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.process(&[]).unwrap_err(), SeamError::NoCandidateMask);
        assert_eq!(pipeline.detect(&[]).unwrap(), None);
    }

    #[test]
    fn test_blank_masks() {
        let blank = probability_mask(16, 16, |_, _| false);
        assert_eq!(Pipeline::default().detect(&[blank.clone(), blank]).unwrap(), None);
    }

    #[test]
    fn test_single_pixel_has_no_line() {
        let mask = probability_mask(10, 10, |x, y| x == 5 && y == 5);
        let pipeline = Pipeline::default();

        assert_eq!(
            pipeline.process(&[mask.clone()]).unwrap_err(),
            SeamError::InsufficientContourPoints { found: 1 }
        );
        assert_eq!(pipeline.detect(&[mask]).unwrap(), None);
    }

    #[test]
    fn test_contour_fallback_for_degenerate_skeleton() {
        // A radius-1 plus erodes to its center pixel and the opening recovers the arms,
        // so the skeleton is a single pixel.
        let plus = probability_mask(9, 9, |x, y| {
            (x == 4 && (3..=5).contains(&y)) || (y == 4 && (3..=5).contains(&x))
        });

        let detection = Pipeline::default().process(&[plus.clone()]).unwrap();
        assert_eq!(detection.source, PointSourceKind::Contour);
        assert_eq!(detection.line.direction, [1.0, 0.0]);
        assert_eq!(detection.segment, Segment::new([3, 4], [5, 4]));

        let skeleton_only = Pipeline::builder().without_contour_fallback().build();
        assert_eq!(
            skeleton_only.process(&[plus]).unwrap_err(),
            SeamError::InsufficientSkeletonPoints { found: 1 }
        );
    }

    #[test]
    fn test_full_grid_mask_falls_back_to_contour() {
        let full = probability_mask(8, 6, |_, _| true);

        let detection = Pipeline::default().process(&[full]).unwrap();
        assert_eq!(detection.source, PointSourceKind::Contour);
        assert_eq!(detection.segment.x1, 0);
        assert_eq!(detection.segment.x2, 7);
        assert!((detection.segment.y1 - detection.segment.y2).abs() <= 1);
    }

    #[test]
    fn test_masks_touching_the_border_yield_a_line() {
        let all_but_corner = probability_mask(10, 6, |x, y| x != 0 || y != 0);
        assert!(Pipeline::default().detect(&[all_but_corner]).unwrap().is_some());

        let left_block = probability_mask(10, 10, |x, y| x < 6 && (4..6).contains(&y));
        let detection = Pipeline::default().process(&[left_block]).unwrap();
        assert_eq!(detection.segment.x1, 0);
        assert_eq!(detection.segment.x2, 5);
    }

    #[test]
    fn test_rerun_is_bit_identical() {
        let mask = probability_mask(80, 60, |x, y| {
            let (fx, fy) = (x as f32, y as f32);
            ((fy - 0.3 * fx - 12.0).abs() < 4.0 && (5..75).contains(&x)) || (x % 17 == 3 && y % 11 == 5)
        });
        let pipeline = Pipeline::default();

        let first = pipeline.process(&[mask.clone()]).unwrap();
        let second = pipeline.process(&[mask.clone()]).unwrap();
        let rebuilt = Pipeline::default().process(&[mask]).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, rebuilt);
    }

    #[test]
    fn test_disc_direction_is_stable() {
        let disc = probability_mask(101, 101, |x, y| {
            let dx = x as i32 - 50;
            let dy = y as i32 - 50;
            dx * dx + dy * dy <= 400
        });
        let pipeline = Pipeline::default();

        for _ in 0..3 {
            let detection = pipeline.process(&[disc.clone()]).unwrap();
            assert_eq!(detection.line.direction, [1.0, 0.0]);
            assert_eq!(detection.line.anchor, [50.0, 50.0]);
            assert_eq!(detection.segment.y1, 50);
            assert_eq!(detection.segment.y2, 50);
        }
    }

    #[test]
    fn test_largest_candidate_drives_the_line() {
        let small_vertical = probability_mask(50, 50, |x, y| x == 25 && (20..30).contains(&y));
        let long_horizontal = probability_mask(50, 50, |x, y| y == 10 && (5..45).contains(&x));

        let detection = Pipeline::default()
            .process(&[small_vertical, long_horizontal])
            .unwrap();
        assert_eq!(detection.candidate_index, 1);
        assert_eq!(detection.candidate_area, 40);
        assert_eq!(detection.segment, Segment::new([5, 10], [44, 10]));
        assert_eq!((detection.image_width, detection.image_height), (50, 50));
    }

    #[test]
    fn test_mismatched_candidates_are_an_input_error() {
        let a = probability_mask(20, 20, |x, _| x < 5);
        let b = probability_mask(20, 21, |x, _| x < 5);

        let err = Pipeline::default().detect(&[a, b]).unwrap_err();
        assert!(matches!(err, SeamError::DimensionMismatch { index: 1, .. }));
    }

    #[test]
    fn test_from_config() {
        let config = PipelineConfig {
            threshold: 0.9,
            contour_fallback: false,
            ..Default::default()
        };
        let pipeline = Pipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.info(), "Pipeline: point sources [skeleton]");

        // 0.8 is foreground at the default threshold but not at 0.9
        let faint = ProbabilityMask::from_fn(20, 20, |x, _| Luma([if x < 10 { 0.8 } else { 0.0 }]));
        assert_eq!(pipeline.detect(&[faint.clone()]).unwrap(), None);
        assert!(Pipeline::default().detect(&[faint]).unwrap().is_some());

        let invalid = PipelineConfig { threshold: 2.0, ..Default::default() };
        assert!(Pipeline::from_config(&invalid).is_err());
    }

    #[test]
    fn test_default_info() {
        assert_eq!(Pipeline::default().info(), "Pipeline: point sources [skeleton -> contour]");
    }

    #[test]
    fn test_shared_pipeline_across_threads() {
        let pipeline = Pipeline::default();
        let masks: Vec<ProbabilityMask> = (0..4u32)
            .map(|i| probability_mask(40, 40, move |x, y| y == 5 + i * 5 && (3..37).contains(&x)))
            .collect();

        let results: Vec<Option<Segment>> = std::thread::scope(|scope| {
            let handles: Vec<_> = masks
                .iter()
                .map(|mask| {
                    let pipeline = &pipeline;
                    scope.spawn(move || pipeline.detect(std::slice::from_ref(mask)).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (i, result) in results.into_iter().enumerate() {
            let y = 5 + 5 * i as i32;
            assert_eq!(result, Some(Segment::new([3, y], [36, y])));
        }
    }

    #[test]
    fn test_skeleton_never_leaves_the_mask() {
        let mask = probability_mask(64, 48, |x, y| {
            let (fx, fy) = (x as f32 - 30.0, y as f32 - 20.0);
            fx * fx / 400.0 + fy * fy / 64.0 <= 1.0 || (x > 50 && y > 30)
        });
        let binary = MaskCandidate::from_probabilities(0, &mask, 0.5).mask;
        let skeleton = MorphologicalSkeletonizer::default().skeletonize(&binary).unwrap();

        assert!(foreground_count(&skeleton) > 0);
        assert!(skeleton.iter().zip(binary.iter()).all(|(s, m)| *s == 0 || *m > 0));
    }
}
