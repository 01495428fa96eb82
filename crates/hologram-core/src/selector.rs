use ndarray::Array2;

use crate::components::connected_components;
use crate::config::SelectorConfig;
use crate::consts::{MIN_HUE_SAMPLES, MIN_SATURATION_FLOOR, MIN_VALUE_FLOOR, SELECTOR_CLOSE_KERNEL, SELECTOR_OPEN_KERNEL};
use crate::frame::{BBox, Frame};
use crate::hsv::{circular_hue_variance, frame_to_hsv_planes, percentile};

/// A candidate region surfaced by single-frame HSV thresholding, still
/// subject to the hue-variance gate.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedRegion {
    pub bbox: BBox,
    pub hue_variance: f32,
}

/// Single-frame adaptive HSV thresholder: thresholds S and V at
/// percentile-derived floors (never below a hard floor), cleans up the mask
/// morphologically, then filters surviving components by hue-variance —
/// a hologram's structural-color sheen spreads hue broadly around the
/// circle, while flat colored plastic clusters tightly.
pub struct HsvRegionSelector {
    config: SelectorConfig,
}

impl HsvRegionSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn select(&self, frame: &Frame) -> Vec<SelectedRegion> {
        let (hue, sat, val) = frame_to_hsv_planes(frame);

        let s_floor = percentile(&sat, self.config.s_percentile).max(MIN_SATURATION_FLOOR / 255.0);
        let v_floor = percentile(&val, self.config.v_percentile).max(MIN_VALUE_FLOOR / 255.0);

        let mask = self.threshold_mask(&sat, &val, s_floor, v_floor);

        let closed = crate::morphology::closing(&mask, SELECTOR_CLOSE_KERNEL);
        let cleaned = crate::morphology::opening(&closed, SELECTOR_OPEN_KERNEL);

        connected_components(&cleaned)
            .into_iter()
            .filter(|c| c.area >= self.config.min_region_area)
            .filter_map(|c| {
                let bbox = c.to_bbox();
                let hues = self.region_hues(&hue, &cleaned, &bbox);
                if hues.len() < MIN_HUE_SAMPLES {
                    return None;
                }
                let variance = circular_hue_variance(&hues);
                if variance < self.config.hue_variance_threshold {
                    return None;
                }
                Some(SelectedRegion { bbox, hue_variance: variance })
            })
            .collect()
    }

    fn threshold_mask(&self, sat: &Array2<f32>, val: &Array2<f32>, s_floor: f32, v_floor: f32) -> Array2<bool> {
        let (h, w) = sat.dim();
        let mut mask = Array2::from_elem((h, w), false);
        for r in 0..h {
            for c in 0..w {
                mask[[r, c]] = sat[[r, c]] >= s_floor && val[[r, c]] >= v_floor;
            }
        }
        mask
    }

    fn region_hues(&self, hue: &Array2<f32>, mask: &Array2<bool>, bbox: &BBox) -> Vec<f32> {
        let mut hues = Vec::new();
        for row in bbox.y as usize..bbox.y2() as usize {
            for col in bbox.x as usize..bbox.x2() as usize {
                if mask[[row, col]] {
                    hues.push(hue[[row, col]]);
                }
            }
        }
        hues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn hue_cycling_patch(size: usize) -> Frame {
        // A patch whose hue cycles across its width, full saturation/value —
        // the canonical "hologram sheen" stand-in used across this pipeline's
        // tests.
        let mut data = Array3::<u8>::zeros((size, size, 3));
        for r in 0..size {
            for c in 0..size {
                let hue_deg = (c as f32 / size as f32) * 360.0;
                let (b, g, rr) = hsv_to_bgr(hue_deg, 1.0, 1.0);
                data[[r, c, 0]] = b;
                data[[r, c, 1]] = g;
                data[[r, c, 2]] = rr;
            }
        }
        Frame::new(data)
    }

    fn static_colored_patch(size: usize) -> Frame {
        let mut data = Array3::<u8>::zeros((size, size, 3));
        for r in 0..size {
            for c in 0..size {
                let (b, g, rr) = hsv_to_bgr(30.0, 1.0, 1.0);
                data[[r, c, 0]] = b;
                data[[r, c, 1]] = g;
                data[[r, c, 2]] = rr;
            }
        }
        Frame::new(data)
    }

    fn hsv_to_bgr(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
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
        (
            (((b1 + m) * 255.0).round()) as u8,
            (((g1 + m) * 255.0).round()) as u8,
            (((r1 + m) * 255.0).round()) as u8,
        )
    }

    #[test]
    fn hue_cycling_patch_survives_variance_gate() {
        let frame = hue_cycling_patch(40);
        let mut cfg = SelectorConfig::default();
        cfg.min_region_area = 10;
        let selector = HsvRegionSelector::new(cfg);
        let regions = selector.select(&frame);
        assert!(!regions.is_empty(), "hue-cycling patch should be selected");
    }

    #[test]
    fn static_colored_patch_is_rejected_by_variance_gate() {
        let frame = static_colored_patch(40);
        let mut cfg = SelectorConfig::default();
        cfg.min_region_area = 10;
        let selector = HsvRegionSelector::new(cfg);
        let regions = selector.select(&frame);
        assert!(regions.is_empty(), "flat color patch should not pass hue-variance gate");
    }

    #[test]
    fn blank_frame_has_no_regions() {
        let frame = Frame::zeros(40, 40);
        let selector = HsvRegionSelector::new(SelectorConfig::default());
        let regions = selector.select(&frame);
        assert!(regions.is_empty());
    }
}
