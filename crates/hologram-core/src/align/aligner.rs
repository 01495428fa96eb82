use crate::config::AlignerConfig;
use crate::consts::{MIN_FEATURES_FOR_REFERENCE, MIN_MATCHES_FOR_HOMOGRAPHY, RANSAC_CONFIDENCE, RANSAC_MAX_ITERATIONS};
use crate::error::{HologramError, Result};
use crate::frame::Frame;

use super::features::{detect, Descriptor, KeyPoint};
use super::homography::{estimate_ransac, Homography};
use super::matcher::{match_descriptors, matched_points};
use super::warp::warp_frame;

/// Outcome of aligning one target frame against the reference.
#[derive(Clone, Debug)]
pub struct AlignmentResult {
    pub frame: Frame,
    pub homography: Homography,
    pub inlier_count: usize,
    pub match_count: usize,
}

/// Feature-based frame-to-reference aligner: detects keypoints, matches
/// them against a held reference set, estimates a homography via RANSAC,
/// and warps the target into the reference's coordinate frame.
///
/// Holds a reference frame and aligns each subsequent frame against it,
/// using feature-based projective alignment rather than translation-only
/// registration, since the tracked card can tilt and rotate between frames.
pub struct FrameAligner {
    config: AlignerConfig,
    reference_keypoints: Vec<KeyPoint>,
    reference_descriptors: Vec<Descriptor>,
    reference_height: usize,
    reference_width: usize,
    rng_seed: u64,
}

impl FrameAligner {
    /// Builds an aligner from a reference frame, detecting and caching its
    /// keypoints/descriptors. Fails if too few features are found to ever
    /// support a reliable homography.
    pub fn new(reference: &Frame, config: AlignerConfig, rng_seed: u64) -> Result<Self> {
        let (keypoints, descriptors) = detect(reference, config.detector, config.max_features);
        if keypoints.len() < MIN_FEATURES_FOR_REFERENCE {
            return Err(HologramError::InsufficientFeatures {
                found: keypoints.len(),
                required: MIN_FEATURES_FOR_REFERENCE,
            });
        }

        Ok(Self {
            config,
            reference_keypoints: keypoints,
            reference_descriptors: descriptors,
            reference_height: reference.height(),
            reference_width: reference.width(),
            rng_seed,
        })
    }

    /// Aligns `target` against the cached reference. Returns `None` (rather
    /// than erroring) when too few matches survive to attempt a homography
    /// — a common, expected outcome for a badly blurred or fully occluded
    /// frame, which the caller should skip rather than treat as fatal.
    pub fn align(&self, target: &Frame) -> Result<Option<AlignmentResult>> {
        if target.height() != self.reference_height || target.width() != self.reference_width {
            return Err(HologramError::DimensionMismatch {
                width: target.width(),
                height: target.height(),
                ref_width: self.reference_width,
                ref_height: self.reference_height,
            });
        }

        let (target_kps, target_descs) = detect(target, self.config.detector, self.config.max_features);
        if target_kps.len() < MIN_FEATURES_FOR_REFERENCE {
            return Ok(None);
        }

        let matches = match_descriptors(&self.reference_descriptors, &target_descs, self.config.lowe_ratio);
        if matches.len() < MIN_MATCHES_FOR_HOMOGRAPHY {
            return Ok(None);
        }

        let correspondences = matched_points(&self.reference_keypoints, &target_kps, &matches);

        let iterations = ransac_iterations_for(correspondences.len(), RANSAC_CONFIDENCE);
        let (homography, inliers) = match estimate_ransac(
            &correspondences,
            self.config.ransac_threshold,
            iterations.min(RANSAC_MAX_ITERATIONS),
            self.rng_seed,
        ) {
            Ok(r) => r,
            Err(_) => return Ok(None),
        };

        let warped = warp_frame(target, &homography, self.reference_height, self.reference_width);

        Ok(Some(AlignmentResult {
            frame: warped,
            homography,
            inlier_count: inliers.len(),
            match_count: matches.len(),
        }))
    }

    pub fn reference_feature_count(&self) -> usize {
        self.reference_keypoints.len()
    }
}

/// Adaptive RANSAC iteration count: `log(1 - p) / log(1 - w^4)` where `w` is
/// the assumed inlier ratio, capped by `RANSAC_MAX_ITERATIONS` by the
/// caller. Uses a conservative 50% assumed inlier ratio since the true
/// ratio isn't known up front.
fn ransac_iterations_for(num_matches: usize, confidence: f64) -> usize {
    if num_matches < 4 {
        return 0;
    }
    let w = 0.5_f64;
    let denom = (1.0 - w.powi(4)).ln();
    if denom >= 0.0 {
        return RANSAC_MAX_ITERATIONS;
    }
    let iters = ((1.0 - confidence).ln() / denom).ceil();
    iters.max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::features::synthetic_gray_grid;
    use ndarray::Array3;

    fn textured_frame(size: usize, seed: u64) -> Frame {
        let grid = synthetic_gray_grid(size as u32, seed);
        let mut data = Array3::<u8>::zeros((size, size, 3));
        for r in 0..size {
            for c in 0..size {
                let v = grid[[r, c]];
                data[[r, c, 0]] = v;
                data[[r, c, 1]] = v;
                data[[r, c, 2]] = v;
            }
        }
        Frame::new(data)
    }

    #[test]
    fn insufficient_reference_features_errors() {
        let blank = Frame::zeros(80, 80);
        let result = FrameAligner::new(&blank, AlignerConfig::default(), 1);
        assert!(result.is_err());
    }

    #[test]
    fn identical_frame_aligns_with_identity_like_homography() {
        let reference = textured_frame(128, 11);
        let aligner = FrameAligner::new(&reference, AlignerConfig::default(), 1).unwrap();
        let result = aligner.align(&reference).unwrap();
        assert!(result.is_some());
        let result = result.unwrap();
        assert!(result.inlier_count >= MIN_MATCHES_FOR_HOMOGRAPHY);
    }

    #[test]
    fn mismatched_dimensions_error() {
        let reference = textured_frame(128, 11);
        let aligner = FrameAligner::new(&reference, AlignerConfig::default(), 1).unwrap();
        let other = textured_frame(64, 12);
        assert!(aligner.align(&other).is_err());
    }
}
