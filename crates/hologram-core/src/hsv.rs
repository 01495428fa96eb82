use ndarray::Array2;

use crate::frame::Frame;

/// Per-pixel HSV triple, H in [0, 360), S and V in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

/// Converts one BGR triple (as stored in [`Frame`]) to HSV.
#[inline]
pub fn bgr_to_hsv(bgr: [u8; 3]) -> Hsv {
    let b = bgr[0] as f32 / 255.0;
    let g = bgr[1] as f32 / 255.0;
    let r = bgr[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta < crate::consts::EPSILON {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let s = if max < crate::consts::EPSILON { 0.0 } else { delta / max };
    let v = max;

    Hsv { h, s, v }
}

/// 8-bit luma from a BGR triple (Rec. 601 weighting), used to exclude
/// overexposed/highlight pixels from chromaticity accumulation.
#[inline]
pub fn luma(bgr: [u8; 3]) -> u8 {
    let b = bgr[0] as f32;
    let g = bgr[1] as f32;
    let r = bgr[2] as f32;
    (0.114 * b + 0.587 * g + 0.299 * r).round() as u8
}

/// Converts a full frame to three parallel planes: hue (degrees),
/// saturation, and value, each in `[0, 1]` except hue in `[0, 360)`.
pub fn frame_to_hsv_planes(frame: &Frame) -> (Array2<f32>, Array2<f32>, Array2<f32>) {
    let (h, w) = (frame.height(), frame.width());
    let mut hue = Array2::<f32>::zeros((h, w));
    let mut sat = Array2::<f32>::zeros((h, w));
    let mut val = Array2::<f32>::zeros((h, w));

    for row in 0..h {
        for col in 0..w {
            let hsv = bgr_to_hsv(frame.pixel(row, col));
            hue[[row, col]] = hsv.h;
            sat[[row, col]] = hsv.s;
            val[[row, col]] = hsv.v;
        }
    }

    (hue, sat, val)
}

/// Linear-interpolated percentile of a plane's values, matching
/// `numpy.percentile`'s default `linear` interpolation.
pub fn percentile(plane: &Array2<f32>, pct: f32) -> f32 {
    let mut values: Vec<f32> = plane.iter().copied().collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap());

    let n = values.len();
    if n == 1 {
        return values[0];
    }
    let rank = (pct / 100.0) * (n - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        values[lo]
    } else {
        let frac = rank - lo as f32;
        values[lo] * (1.0 - frac) + values[hi] * frac
    }
}

/// Circular variance of a set of hue samples (in degrees).
///
/// `R = sqrt(mean(sin theta)^2 + mean(cos theta)^2)`, variance `= 1 - R`.
/// Returns 0.0 (perfectly concentrated) for an empty sample set.
pub fn circular_hue_variance(hues_deg: &[f32]) -> f32 {
    if hues_deg.is_empty() {
        return 0.0;
    }
    let n = hues_deg.len() as f32;
    let (sum_sin, sum_cos) = hues_deg.iter().fold((0.0_f32, 0.0_f32), |(s, c), &h| {
        let rad = h.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    let mean_sin = sum_sin / n;
    let mean_cos = sum_cos / n;
    let r = (mean_sin * mean_sin + mean_cos * mean_cos).sqrt();
    1.0 - r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pure_red_bgr_converts_correctly() {
        let hsv = bgr_to_hsv([0, 0, 255]);
        assert_relative_eq!(hsv.h, 0.0, epsilon = 1e-3);
        assert_relative_eq!(hsv.s, 1.0, epsilon = 1e-3);
        assert_relative_eq!(hsv.v, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn gray_has_zero_saturation() {
        let hsv = bgr_to_hsv([128, 128, 128]);
        assert_relative_eq!(hsv.s, 0.0, epsilon = 1e-3);
    }

    #[test]
    fn percentile_matches_known_values() {
        let plane = Array2::from_shape_vec((1, 5), vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(percentile(&plane, 50.0), 3.0, epsilon = 1e-6);
        assert_relative_eq!(percentile(&plane, 0.0), 1.0, epsilon = 1e-6);
        assert_relative_eq!(percentile(&plane, 100.0), 5.0, epsilon = 1e-6);
    }

    #[test]
    fn identical_hues_have_zero_variance() {
        let hues = vec![45.0; 20];
        assert_relative_eq!(circular_hue_variance(&hues), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn uniformly_spread_hues_have_high_variance() {
        let hues: Vec<f32> = (0..360).step_by(10).map(|d| d as f32).collect();
        assert!(circular_hue_variance(&hues) > 0.9);
    }
}
