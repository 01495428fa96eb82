use hologram_core::config::PipelineConfig;
use hologram_core::frame::Frame;
use hologram_core::pipeline::{run_clip, Coordinator, NoOpReporter};
use ndarray::Array3;
use std::sync::Arc;

/// A reproducible pseudo-random grayscale background, textured enough for
/// the aligner's feature detector to find keypoints.
fn textured_background(size: usize, seed: u64) -> Array3<u8> {
    use rand::Rng;
    use rand::SeedableRng;
    let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);
    Array3::from_shape_fn((size, size, 3), |_| rng.gen_range(0..=255u8))
}

fn hsv_to_bgr(h: f32, s: f32, v: f32) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r1, g1, b1) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };
    [
        (((b1 + m) * 255.0).round()) as u8,
        (((g1 + m) * 255.0).round()) as u8,
        (((r1 + m) * 255.0).round()) as u8,
    ]
}

/// Stamps a hue-cycling patch (the hologram stand-in used across this
/// pipeline's tests) at a fixed location, with a cycle that rotates a
/// little each frame to simulate the sheen shifting under motion.
fn stamp_hologram_patch(data: &mut Array3<u8>, top: usize, left: usize, size: usize, phase: f32) {
    for r in 0..size {
        for c in 0..size {
            let hue = ((c as f32 / size as f32) * 360.0 + phase) % 360.0;
            let [b, g, rr] = hsv_to_bgr(hue, 1.0, 1.0);
            data[[top + r, left + c, 0]] = b;
            data[[top + r, left + c, 1]] = g;
            data[[top + r, left + c, 2]] = rr;
        }
    }
}

fn make_clip(num_frames: usize) -> Vec<Frame> {
    let size = 160;
    (0..num_frames)
        .map(|i| {
            let mut data = textured_background(size, 7);
            stamp_hologram_patch(&mut data, 40, 40, 50, i as f32 * 17.0);
            Frame::new(data)
        })
        .collect()
}

#[test]
fn full_clip_with_hologram_patch_produces_detection() {
    let frames = make_clip(20);
    let mut config = PipelineConfig::default();
    config.selector.min_region_area = 50;
    config.accumulator.min_area = 50;

    let reporter = Arc::new(NoOpReporter);
    let aggregate = run_clip(&frames, config, 42, reporter).unwrap();

    assert_eq!(aggregate.frames_processed, frames.len());
    assert!(!aggregate.detections.is_empty(), "expected at least one surviving detection");
}

#[test]
fn empty_clip_errors() {
    let frames: Vec<Frame> = Vec::new();
    let reporter = Arc::new(NoOpReporter);
    let result = run_clip(&frames, PipelineConfig::default(), 1, reporter);
    assert!(result.is_err());
}

#[test]
fn coordinator_rejects_process_frame_before_initialize() {
    let mut coordinator = Coordinator::new(PipelineConfig::default(), 1);
    let frame = Frame::zeros(64, 64);
    assert!(coordinator.process_frame(&frame).is_err());
}

#[test]
fn coordinator_state_transitions_through_lifecycle() {
    use hologram_core::pipeline::PipelineState;

    let frames = make_clip(5);
    let mut coordinator = Coordinator::new(PipelineConfig::default(), 3);
    assert_eq!(coordinator.state(), PipelineState::Uninitialized);

    coordinator.initialize(&frames[0]).unwrap();
    assert_eq!(coordinator.state(), PipelineState::Running);

    for frame in &frames[1..] {
        coordinator.process_frame(frame).unwrap();
    }

    let aggregate = coordinator.finish().unwrap();
    assert_eq!(aggregate.frames_processed, frames.len());
}

#[test]
fn blank_clip_yields_no_detections() {
    let frames: Vec<Frame> = (0..5)
        .map(|_| {
            let mut data = textured_background(160, 99);
            // No hologram patch stamped — texture alone shouldn't survive
            // the hue-variance and highlight-accumulation gates.
            data.mapv_inplace(|v| v.min(30));
            Frame::new(data)
        })
        .collect();

    let reporter = Arc::new(NoOpReporter);
    let aggregate = run_clip(&frames, PipelineConfig::default(), 5, reporter).unwrap();
    assert!(aggregate.detections.is_empty());
}
