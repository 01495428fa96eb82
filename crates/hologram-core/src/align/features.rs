use image::{GrayImage, Luma};
use imageproc::corners::{corners_fast9, Corner};
use ndarray::Array2;

use crate::config::DetectorKind;
use crate::frame::Frame;

/// A detected keypoint with its response strength (used to rank when
/// `max_features` caps the candidate set).
#[derive(Clone, Copy, Debug)]
pub struct KeyPoint {
    pub x: u32,
    pub y: u32,
    pub response: f32,
}

/// A keypoint's local descriptor, either a fixed-length binary string
/// (ORB-like) or a float vector (SIFT-like HOG patch).
#[derive(Clone, Debug)]
pub enum Descriptor {
    Binary(Vec<u64>),
    Float(Vec<f32>),
}

impl Descriptor {
    /// Hamming distance between two binary descriptors. Panics if either
    /// side isn't [`Descriptor::Binary`] or lengths differ.
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        match (self, other) {
            (Descriptor::Binary(a), Descriptor::Binary(b)) => {
                debug_assert_eq!(a.len(), b.len());
                a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
            }
            _ => panic!("hamming distance requires two binary descriptors"),
        }
    }

    /// Squared Euclidean distance between two float descriptors.
    pub fn l2_squared(&self, other: &Descriptor) -> f32 {
        match (self, other) {
            (Descriptor::Float(a), Descriptor::Float(b)) => {
                debug_assert_eq!(a.len(), b.len());
                a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
            }
            _ => panic!("l2 distance requires two float descriptors"),
        }
    }
}

/// Converts a BGR [`Frame`] to an 8-bit grayscale `image::GrayImage`, the
/// format `imageproc`'s corner detectors expect.
pub fn frame_to_gray(frame: &Frame) -> GrayImage {
    let (h, w) = (frame.height(), frame.width());
    let mut img = GrayImage::new(w as u32, h as u32);
    for row in 0..h {
        for col in 0..w {
            let gray = crate::hsv::luma(frame.pixel(row, col));
            img.put_pixel(col as u32, row as u32, Luma([gray]));
        }
    }
    img
}

/// Detects up to `max_features` keypoints, ranked by FAST corner response,
/// then builds a descriptor for each according to `detector`.
///
/// ORB-like: a fixed sampling-pattern binary (BRIEF-style) descriptor around
/// each corner, intensity-centroid oriented so in-plane rotation doesn't
/// flip bit polarity. SIFT-like: a HOG-style gradient histogram patch
/// descriptor, scale-robust by running FAST at two image scales.
pub fn detect(frame: &Frame, detector: DetectorKind, max_features: usize) -> (Vec<KeyPoint>, Vec<Descriptor>) {
    let gray = frame_to_gray(frame);
    match detector {
        DetectorKind::Orb => detect_orb(&gray, max_features),
        DetectorKind::Sift => detect_sift(&gray, max_features),
    }
}

fn rank_and_cap(mut corners: Vec<Corner>, max_features: usize) -> Vec<Corner> {
    corners.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    corners.truncate(max_features);
    corners
}

fn detect_orb(gray: &GrayImage, max_features: usize) -> (Vec<KeyPoint>, Vec<Descriptor>) {
    let corners = rank_and_cap(corners_fast9(gray, 20), max_features);
    let pattern = brief_sampling_pattern();
    let (w, h) = gray.dimensions();

    let mut keypoints = Vec::with_capacity(corners.len());
    let mut descriptors = Vec::with_capacity(corners.len());

    for corner in &corners {
        let x = corner.x;
        let y = corner.y;
        if x < 15 || y < 15 || x + 15 >= w || y + 15 >= h {
            continue;
        }
        let theta = intensity_centroid_angle(gray, x, y);
        let desc = brief_descriptor(gray, x, y, theta, &pattern);
        keypoints.push(KeyPoint {
            x,
            y,
            response: corner.score as f32,
        });
        descriptors.push(Descriptor::Binary(desc));
    }

    (keypoints, descriptors)
}

fn detect_sift(gray: &GrayImage, max_features: usize) -> (Vec<KeyPoint>, Vec<Descriptor>) {
    let (w, h) = gray.dimensions();
    let half_scale = image::imageops::resize(
        gray,
        (w / 2).max(1),
        (h / 2).max(1),
        image::imageops::FilterType::Triangle,
    );

    let mut all_corners: Vec<(Corner, f32)> = corners_fast9(gray, 20)
        .into_iter()
        .map(|c| (c, 1.0))
        .collect();
    all_corners.extend(
        corners_fast9(&half_scale, 20)
            .into_iter()
            .map(|c| (Corner::new(c.x * 2, c.y * 2, c.score), 2.0)),
    );
    all_corners.sort_unstable_by(|a, b| b.0.score.partial_cmp(&a.0.score).unwrap());
    all_corners.truncate(max_features);

    let mut keypoints = Vec::with_capacity(all_corners.len());
    let mut descriptors = Vec::with_capacity(all_corners.len());

    for (corner, _scale) in &all_corners {
        let x = corner.x;
        let y = corner.y;
        if x < 32 || y < 32 || x + 32 >= w || y + 32 >= h {
            continue;
        }
        let patch = crate::hog::extract_patch_gray(gray, x, y, 64);
        let desc = crate::hog::histogram_descriptor(&patch, 9, 8, 2);
        keypoints.push(KeyPoint {
            x,
            y,
            response: corner.score as f32,
        });
        descriptors.push(Descriptor::Float(desc));
    }

    (keypoints, descriptors)
}

fn intensity_centroid_angle(gray: &GrayImage, cx: u32, cy: u32) -> f32 {
    let radius: i32 = 15;
    let mut m01 = 0.0_f32;
    let mut m10 = 0.0_f32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let x = cx as i32 + dx;
            let y = cy as i32 + dy;
            let intensity = gray.get_pixel(x as u32, y as u32)[0] as f32;
            m10 += dx as f32 * intensity;
            m01 += dy as f32 * intensity;
        }
    }
    m01.atan2(m10)
}

/// A fixed, deterministic 256-pair BRIEF sampling pattern (Gaussian-ish
/// spread within a 31x31 patch), generated once from a seeded PRNG so every
/// run (and every process) produces bit-identical descriptors.
fn brief_sampling_pattern() -> Vec<(i32, i32, i32, i32)> {
    use rand::Rng;
    use rand::SeedableRng;
    let mut rng = rand_pcg::Pcg64::seed_from_u64(0xB21EF_u64);
    (0..256)
        .map(|_| {
            let sample = |rng: &mut rand_pcg::Pcg64| -> i32 {
                rng.gen_range(-15..=15)
            };
            (sample(&mut rng), sample(&mut rng), sample(&mut rng), sample(&mut rng))
        })
        .collect()
}

fn brief_descriptor(gray: &GrayImage, cx: u32, cy: u32, theta: f32, pattern: &[(i32, i32, i32, i32)]) -> Vec<u64> {
    let (cos_t, sin_t) = (theta.cos(), theta.sin());
    let rotate = |dx: i32, dy: i32| -> (i32, i32) {
        let dxf = dx as f32;
        let dyf = dy as f32;
        (
            (dxf * cos_t - dyf * sin_t).round() as i32,
            (dxf * sin_t + dyf * cos_t).round() as i32,
        )
    };

    let sample = |dx: i32, dy: i32| -> u8 {
        let (rx, ry) = rotate(dx, dy);
        let x = (cx as i32 + rx).clamp(0, gray.width() as i32 - 1) as u32;
        let y = (cy as i32 + ry).clamp(0, gray.height() as i32 - 1) as u32;
        gray.get_pixel(x, y)[0]
    };

    let mut words = vec![0u64; 4];
    for (i, &(x1, y1, x2, y2)) in pattern.iter().enumerate() {
        let bit = (sample(x1, y1) < sample(x2, y2)) as u64;
        words[i / 64] |= bit << (i % 64);
    }
    words
}

/// Builds a dense disparity field placeholder array used by tests that need
/// a deterministic gray patch without going through the `image` crate.
#[cfg(test)]
pub(crate) fn synthetic_gray_grid(size: u32, seed: u64) -> Array2<u8> {
    use rand::Rng;
    use rand::SeedableRng;
    let mut rng = rand_pcg::Pcg64::seed_from_u64(seed);
    Array2::from_shape_fn((size as usize, size as usize), |_| rng.gen_range(0..=255))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn textured_frame(size: usize) -> Frame {
        let grid = synthetic_gray_grid(size as u32, 7);
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
    fn orb_detects_keypoints_on_textured_frame() {
        let frame = textured_frame(80);
        let (kps, descs) = detect(&frame, DetectorKind::Orb, 100);
        assert_eq!(kps.len(), descs.len());
        assert!(!kps.is_empty(), "expected some corners on textured noise");
    }

    #[test]
    fn blank_frame_has_no_orb_keypoints() {
        let frame = Frame::zeros(80, 80);
        let (kps, _) = detect(&frame, DetectorKind::Orb, 100);
        assert!(kps.is_empty());
    }

    #[test]
    fn sift_descriptor_is_float_kind() {
        let frame = textured_frame(128);
        let (_, descs) = detect(&frame, DetectorKind::Sift, 50);
        if let Some(d) = descs.first() {
            assert!(matches!(d, Descriptor::Float(_)));
        }
    }
}
