use std::collections::VecDeque;

use ndarray::Array2;

use crate::align::features::frame_to_gray;
use crate::classifier::OnlineLogisticRegression;
use crate::config::VerifierConfig;
use crate::frame::{BBox, Frame};
use crate::hog::{extract_patch_gray, histogram_descriptor};

/// Verifies that a candidate region's appearance actually changes over
/// time, the way a structural-color hologram's sheen shifts with viewing
/// angle and lighting but a flat printed or plastic lookalike doesn't.
///
/// Maintains a rolling buffer of grayscale crops for the region and
/// compares each new frame against the running median background.
pub struct DynamicBehaviorVerifier {
    config: VerifierConfig,
    history: VecDeque<Array2<f32>>,
    classifier: Option<OnlineLogisticRegression>,
}

/// A patch's verification outcome: difference energy against the rolling
/// background, and an optional classifier confidence when enabled.
#[derive(Clone, Debug)]
pub struct VerificationOutcome {
    pub difference_energy: f32,
    pub classifier_confidence: Option<f32>,
    pub confidence: f32,
    pub is_dynamic: bool,
}

// 64px patch / 8px cells = 8x8 cell grid; 2x2-cell blocks slide to a 7x7
// grid of blocks; 7*7 * (2*2 cells) * 9 orientations = 1764.
const HOG_DESCRIPTOR_LEN: usize = 1764;

impl DynamicBehaviorVerifier {
    pub fn new(config: VerifierConfig) -> Self {
        let classifier = if config.use_classifier {
            Some(OnlineLogisticRegression::new(HOG_DESCRIPTOR_LEN, 0.05, 1e-4))
        } else {
            None
        };
        Self {
            config,
            history: VecDeque::with_capacity(config.background_frames),
            classifier,
        }
    }

    /// Crops `frame` to `bbox`, converts to grayscale, and evaluates it
    /// against the rolling background built from prior calls. The crop is
    /// then pushed into the rolling buffer for future frames.
    pub fn verify(&mut self, frame: &Frame, bbox: &BBox) -> VerificationOutcome {
        let gray = frame_to_gray(frame);
        let patch = extract_patch_gray(
            &gray,
            bbox.x + bbox.w / 2,
            bbox.y + bbox.h / 2,
            crate::consts::HOG_PATCH_SIZE,
        );

        let energy = if self.history.is_empty() {
            0.0
        } else {
            let background = self.rolling_median();
            difference_energy(&patch, &background)
        };

        self.push(patch.clone());

        let classifier_confidence = self.classifier.as_ref().map(|model| {
            let descriptor = histogram_descriptor(
                &patch,
                crate::consts::HOG_ORIENTATIONS,
                crate::consts::HOG_CELL_SIZE,
                crate::consts::HOG_BLOCK_CELLS,
            );
            model.predict_proba(&descriptor)
        });

        let confidence = match classifier_confidence {
            Some(c) => 0.5 * (energy / (energy + 1.0)) + 0.5 * c,
            None => energy / (energy + 1.0),
        };

        VerificationOutcome {
            difference_energy: energy,
            classifier_confidence,
            confidence,
            is_dynamic: energy >= self.config.hue_energy_threshold,
        }
    }

    fn push(&mut self, patch: Array2<f32>) {
        if self.history.len() >= self.config.background_frames {
            self.history.pop_front();
        }
        self.history.push_back(patch);
    }

    fn rolling_median(&self) -> Array2<f32> {
        let (h, w) = self.history[0].dim();
        let n = self.history.len();
        let mut result = Array2::<f32>::zeros((h, w));
        let mut values = vec![0.0_f32; n];

        for row in 0..h {
            for col in 0..w {
                for (i, patch) in self.history.iter().enumerate() {
                    values[i] = patch[[row, col]];
                }
                result[[row, col]] = median_of(&mut values);
            }
        }
        result
    }

    /// Trains the optional classifier on a labeled example; no-op if the
    /// classifier path wasn't enabled in config.
    pub fn train_classifier(&mut self, patch: &Array2<f32>, label: f32) {
        if let Some(model) = self.classifier.as_mut() {
            let descriptor = histogram_descriptor(
                patch,
                crate::consts::HOG_ORIENTATIONS,
                crate::consts::HOG_CELL_SIZE,
                crate::consts::HOG_BLOCK_CELLS,
            );
            model.partial_fit(&descriptor, label);
        }
    }
}

fn median_of(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 1 {
        return values[0];
    }
    if n % 2 == 1 {
        let mid = n / 2;
        *values
            .select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap())
            .1
    } else {
        let mid = n / 2;
        let (lower, upper, _) = values.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap());
        let upper_val = *upper;
        let lower_val = lower.iter().copied().fold(f32::MIN, f32::max);
        (lower_val + upper_val) / 2.0
    }
}

/// Mean squared pixel difference between a patch and the rolling
/// background, normalized to roughly `[0, 1]` by dividing by `255^2`.
fn difference_energy(patch: &Array2<f32>, background: &Array2<f32>) -> f32 {
    let n = patch.len() as f32;
    let sum_sq: f32 = patch
        .iter()
        .zip(background.iter())
        .map(|(p, b)| (p - b) * (p - b))
        .sum();
    (sum_sq / n) / (255.0 * 255.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn constant_frame(size: usize, value: u8) -> Frame {
        let data = Array3::<u8>::from_elem((size, size, 3), value);
        Frame::new(data)
    }

    #[test]
    fn static_patch_has_low_difference_energy() {
        let mut verifier = DynamicBehaviorVerifier::new(VerifierConfig::default());
        let frame = constant_frame(100, 128);
        let bbox = BBox::new(20, 20, 40, 40);
        let mut last = verifier.verify(&frame, &bbox);
        for _ in 0..10 {
            last = verifier.verify(&frame, &bbox);
        }
        assert!(last.difference_energy < 0.01);
        assert!(!last.is_dynamic);
    }

    #[test]
    fn flickering_patch_has_high_difference_energy() {
        let mut verifier = DynamicBehaviorVerifier::new(VerifierConfig::default());
        let bbox = BBox::new(20, 20, 40, 40);
        let mut last = verifier.verify(&constant_frame(100, 0), &bbox);
        for i in 0..10 {
            let value = if i % 2 == 0 { 255 } else { 0 };
            last = verifier.verify(&constant_frame(100, value), &bbox);
        }
        assert!(last.difference_energy > 0.1);
        assert!(last.is_dynamic);
    }
}
