use ndarray::Array2;

use crate::components::connected_components;
use crate::config::AccumulatorConfig;
use crate::frame::{BBox, Frame};
use crate::hsv::luma;
use crate::morphology::{closing, opening};

/// Per-pixel chromaticity scalar `C` and saturation `S` for one BGR pixel.
///
/// `C` lands in the hexagonal hue ordering on `[0, 6)` via max-channel
/// branching; it is `0.0` (undefined) when `S` is negligible.
fn chromaticity(bgr: [u8; 3]) -> (f32, f32) {
    let b = bgr[0] as f32 / 255.0;
    let g = bgr[1] as f32 / 255.0;
    let r = bgr[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let s = if max > crate::consts::EPSILON {
        (max - min) / max
    } else {
        0.0
    };

    if s <= crate::consts::EPSILON {
        return (0.0, s);
    }

    let c = if max == r {
        (g - b) / s
    } else if max == g {
        (b - r) / s + 2.0
    } else {
        (r - g) / s + 4.0
    };

    (c, s)
}

/// Online accumulator of per-pixel chromaticity statistics: detects pixels
/// that are simultaneously highly saturated at some moment AND whose hue
/// varies strongly over time — the signature of diffractive holograms.
///
/// Statistics grow unbounded across the whole clip (no rolling decay);
/// callers reset a coordinator between clips rather than between windows.
#[derive(Clone, Debug)]
pub struct ChromaticityAccumulator {
    config: AccumulatorConfig,
    height: usize,
    width: usize,
    s_max: Array2<f32>,
    c_sum: Array2<f32>,
    n: Array2<u32>,
    frame_count: usize,
}

impl ChromaticityAccumulator {
    pub fn new(height: usize, width: usize, config: AccumulatorConfig) -> Self {
        Self {
            config,
            height,
            width,
            s_max: Array2::zeros((height, width)),
            c_sum: Array2::zeros((height, width)),
            n: Array2::zeros((height, width)),
            frame_count: 0,
        }
    }

    /// Accumulates statistics for one aligned frame. For every pixel:
    /// `S_max := max(S_max, S)`. Where `S > saturation_threshold` AND the
    /// pixel isn't a highlight (`luma < highlight_threshold`): `C_sum += C`,
    /// `N += 1`.
    pub fn add(&mut self, frame: &Frame) {
        debug_assert_eq!(frame.height(), self.height);
        debug_assert_eq!(frame.width(), self.width);

        for row in 0..self.height {
            for col in 0..self.width {
                let bgr = frame.pixel(row, col);
                let (c, s) = chromaticity(bgr);
                let gray = luma(bgr);

                if s > self.s_max[[row, col]] {
                    self.s_max[[row, col]] = s;
                }

                if s > self.config.saturation_threshold && (gray as u32) < self.config.highlight_threshold as u32 {
                    self.c_sum[[row, col]] += c;
                    self.n[[row, col]] += 1;
                }
            }
        }

        self.frame_count += 1;
    }

    /// Per-pixel hologram score: `mean_C = C_sum/(N+eps)`, `M = |mean_C|`
    /// normalized by its own max to `[0, 1]`, `score = S_max * (1 - M)`,
    /// zeroed where `N` is below `max(buffer_size/3, 5)` to suppress noise
    /// from rarely-observed pixels. `normalize` rescales the (already
    /// `[0, 1]`-bounded) score to 8-bit range.
    pub fn hologram_map(&self, normalize: bool) -> Array2<f32> {
        let floor = (self.config.buffer_size as f32 / 3.0).max(5.0);

        let mean_c = Array2::from_shape_fn((self.height, self.width), |(r, c)| {
            self.c_sum[[r, c]] / (self.n[[r, c]] as f32 + crate::consts::EPSILON)
        });
        let m = mean_c.mapv(f32::abs);
        let m_max = m.iter().copied().fold(0.0_f32, f32::max);

        let m_normalized = if m_max > crate::consts::EPSILON {
            m.mapv(|v| v / m_max)
        } else {
            Array2::zeros((self.height, self.width))
        };

        let mut score = Array2::<f32>::zeros((self.height, self.width));
        for row in 0..self.height {
            for col in 0..self.width {
                if (self.n[[row, col]] as f32) < floor {
                    continue;
                }
                score[[row, col]] = self.s_max[[row, col]] * (1.0 - m_normalized[[row, col]]);
            }
        }

        if normalize {
            score.mapv(|v| v * 255.0)
        } else {
            score
        }
    }

    /// Binarizes the hologram map at `max(threshold * max(score), 0.1)`,
    /// closes then opens with a 5x5 elliptical kernel, and labels the
    /// result, returning candidate bounding boxes with area >= `min_area`.
    pub fn regions(&self, threshold: f32) -> Vec<BBox> {
        let score = self.hologram_map(false);
        let max_score = score.iter().copied().fold(0.0_f32, f32::max);
        let cutoff = (threshold * max_score).max(crate::consts::MIN_REGION_THRESHOLD_FLOOR);

        let mask = score.mapv(|v| v >= cutoff);
        let closed = closing(&mask, crate::consts::ACCUMULATOR_MORPH_KERNEL);
        let cleaned = opening(&closed, crate::consts::ACCUMULATOR_MORPH_KERNEL);

        connected_components(&cleaned)
            .into_iter()
            .filter(|comp| comp.area >= self.config.min_area)
            .map(|comp| comp.to_bbox())
            .collect()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }
}
