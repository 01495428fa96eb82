use std::sync::Arc;

use tracing::{info, warn};

use crate::align::FrameAligner;
use crate::chroma::ChromaticityAccumulator;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::frame::{BBox, DetectionRecord, Frame};
use crate::selector::HsvRegionSelector;
use crate::verifier::DynamicBehaviorVerifier;

use super::types::{ClipAggregate, NoOpReporter, PipelineStage, PipelineState, ProgressReporter};

/// Drives the full per-clip pipeline across a sequence of frames: align each
/// frame to the first, accumulate chromaticity statistics, select candidate
/// regions per-frame via HSV thresholding, verify their dynamic behavior,
/// deduplicate overlapping detections with NMS, and gate by confidence.
pub struct Coordinator {
    config: PipelineConfig,
    state: PipelineState,
    aligner: Option<FrameAligner>,
    accumulator: Option<ChromaticityAccumulator>,
    selector: HsvRegionSelector,
    verifier: DynamicBehaviorVerifier,
    detections: Vec<DetectionRecord>,
    frames_processed: usize,
    rng_seed: u64,
}

impl Coordinator {
    pub fn new(config: PipelineConfig, rng_seed: u64) -> Self {
        let selector = HsvRegionSelector::new(config.selector.clone());
        let verifier = DynamicBehaviorVerifier::new(config.verifier.clone());
        Self {
            config,
            state: PipelineState::Uninitialized,
            aligner: None,
            accumulator: None,
            selector,
            verifier,
            detections: Vec::new(),
            frames_processed: 0,
            rng_seed,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Initializes the coordinator from the clip's first frame: this frame
    /// becomes the alignment reference and fixes the accumulator's
    /// dimensions. Transitions `Uninitialized -> Running`.
    pub fn initialize(&mut self, first_frame: &Frame) -> Result<()> {
        let aligner = FrameAligner::new(first_frame, self.config.aligner.clone(), self.rng_seed)?;
        self.accumulator = Some(ChromaticityAccumulator::new(
            first_frame.height(),
            first_frame.width(),
            self.config.accumulator.clone(),
        ));
        self.aligner = Some(aligner);
        self.state = PipelineState::Running;
        self.process_frame_inner(first_frame, &NoOpReporter)?;
        Ok(())
    }

    /// Processes one subsequent frame: aligns it to the reference, folds it
    /// into the chromaticity accumulator, runs region selection against the
    /// *aligned* frame, and verifies each surviving candidate's dynamic
    /// behavior.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<()> {
        self.process_frame_with_progress(frame, &NoOpReporter)
    }

    pub fn process_frame_with_progress(&mut self, frame: &Frame, reporter: &dyn ProgressReporter) -> Result<()> {
        if self.state != PipelineState::Running {
            return Err(crate::error::HologramError::Pipeline(
                "process_frame called before initialize()".into(),
            ));
        }
        self.process_frame_inner(frame, reporter)
    }

    fn process_frame_inner(&mut self, frame: &Frame, reporter: &dyn ProgressReporter) -> Result<()> {
        reporter.begin_stage(PipelineStage::Aligning, None);
        let aligner = self.aligner.as_ref().expect("initialized");
        let aligned = match aligner.align(frame)? {
            Some(result) => result.frame,
            None => {
                warn!(frame_index = self.frames_processed, "frame failed to align, skipping");
                reporter.finish_stage();
                self.frames_processed += 1;
                return Ok(());
            }
        };
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Accumulating, None);
        let accumulator = self.accumulator.as_mut().expect("initialized");
        accumulator.add(&aligned);
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Selecting, None);
        let mut candidates: Vec<BBox> = self.selector.select(&aligned).into_iter().map(|r| r.bbox).collect();
        let frame_number = self.frames_processed + 1;
        if frame_number % self.config.coordinator.update_interval == 0 {
            candidates.extend(accumulator.regions(crate::consts::ACCUMULATOR_REGION_THRESHOLD));
        }
        let candidates = dedupe_boxes(candidates, self.config.coordinator.nms_iou_threshold);
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Verifying, None);
        for bbox in &candidates {
            let outcome = self.verifier.verify(&aligned, bbox);
            if outcome.is_dynamic && outcome.confidence >= self.config.coordinator.confidence_threshold {
                self.detections.push(DetectionRecord {
                    bbox: *bbox,
                    confidence: outcome.confidence,
                    is_hologram: true,
                    frame_index: self.frames_processed,
                });
            }
        }
        reporter.finish_stage();

        self.frames_processed += 1;
        if self.frames_processed % self.config.coordinator.update_interval == 0 {
            info!(frames = self.frames_processed, detections = self.detections.len(), "pipeline progress");
        }

        Ok(())
    }

    /// Finalizes the clip: deduplicates overlapping detections across all
    /// frames via non-maximum suppression, and computes the aggregate
    /// confidence summary. Transitions `Running -> Finished`.
    pub fn finish(mut self) -> Result<ClipAggregate> {
        if self.frames_processed == 0 {
            return Err(crate::error::HologramError::EmptyInput);
        }

        let deduped = non_maximum_suppression(self.detections.clone(), self.config.coordinator.nms_iou_threshold);

        let confidences: Vec<f32> = deduped.iter().map(|d| d.confidence).collect();
        let avg_confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };
        let max_confidence = confidences.iter().copied().fold(None, |acc, c| {
            Some(acc.map_or(c, |m: f32| m.max(c)))
        });
        let any_hologram = deduped.iter().any(|d| d.is_hologram);

        self.state = PipelineState::Finished;

        Ok(ClipAggregate {
            frames_processed: self.frames_processed,
            detections: deduped,
            avg_confidence,
            max_confidence,
            any_hologram,
        })
    }
}

/// Greedy non-maximum suppression, matching `_merge_overlapping_regions`'s
/// approach in the source material: sort ascending by the box's bottom edge
/// (`y2`), repeatedly take the last (highest `y2`) box, drop every
/// remaining box whose IoU against it is `>= iou_threshold`.
pub fn non_maximum_suppression(mut detections: Vec<DetectionRecord>, iou_threshold: f32) -> Vec<DetectionRecord> {
    detections.sort_by_key(|d| d.bbox.y2());

    let mut kept = Vec::new();
    let mut remaining: Vec<DetectionRecord> = detections;

    while let Some(current) = remaining.pop() {
        remaining.retain(|d| current.bbox.iou(&d.bbox) < iou_threshold);
        kept.push(current);
    }

    kept
}

/// Same greedy sort-by-`y2`/suppress-by-IoU scheme as
/// [`non_maximum_suppression`], operating directly on candidate boxes before
/// they carry a verification outcome — used to merge the selector's
/// per-frame candidates with the accumulator's periodic regions.
fn dedupe_boxes(mut boxes: Vec<BBox>, iou_threshold: f32) -> Vec<BBox> {
    boxes.sort_by_key(|b| b.y2());

    let mut kept = Vec::new();
    let mut remaining = boxes;

    while let Some(current) = remaining.pop() {
        remaining.retain(|b| current.iou(b) < iou_threshold);
        kept.push(current);
    }

    kept
}

/// Convenience wrapper for running a full clip (directory-of-frames style
/// callers) to completion in one call.
pub fn run_clip(frames: &[Frame], config: PipelineConfig, rng_seed: u64, reporter: Arc<dyn ProgressReporter>) -> Result<ClipAggregate> {
    if frames.is_empty() {
        return Err(crate::error::HologramError::EmptyInput);
    }

    let mut coordinator = Coordinator::new(config, rng_seed);
    coordinator.initialize(&frames[0])?;

    reporter.advance(1);
    for (i, frame) in frames[1..].iter().enumerate() {
        coordinator.process_frame_with_progress(frame, reporter.as_ref())?;
        reporter.advance(i + 2);
    }

    reporter.begin_stage(PipelineStage::Aggregating, None);
    let aggregate = coordinator.finish();
    reporter.finish_stage();
    aggregate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox_at(x: u32, y: u32) -> BBox {
        BBox::new(x, y, 20, 20)
    }

    fn detection(x: u32, y: u32, confidence: f32) -> DetectionRecord {
        DetectionRecord {
            bbox: bbox_at(x, y),
            confidence,
            is_hologram: true,
            frame_index: 0,
        }
    }

    #[test]
    fn nms_collapses_overlapping_boxes() {
        let detections = vec![detection(0, 0, 0.8), detection(2, 2, 0.9)];
        let kept = non_maximum_suppression(detections, 0.3);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn nms_keeps_disjoint_boxes() {
        let detections = vec![detection(0, 0, 0.8), detection(500, 500, 0.9)];
        let kept = non_maximum_suppression(detections, 0.5);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn finish_before_any_frame_errors() {
        let coordinator = Coordinator::new(PipelineConfig::default(), 1);
        assert!(coordinator.finish().is_err());
    }
}
