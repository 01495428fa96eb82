use nalgebra::{Matrix3, SVD};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::error::{HologramError, Result};

/// A 3x3 projective homography mapping target-frame coordinates onto the
/// reference frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Applies the homography to a point, returning `(x', y')` after the
    /// perspective division.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let p = self.0 * nalgebra::Vector3::new(x, y, 1.0);
        if p.z.abs() < 1e-12 {
            (f64::NAN, f64::NAN)
        } else {
            (p.x / p.z, p.y / p.z)
        }
    }
}

/// Normalizes points so their centroid is the origin and their average
/// distance from the origin is `sqrt(2)`, returning the normalized points
/// and the 3x3 normalization transform (Hartley's normalized DLT).
fn normalize(points: &[(f64, f64)]) -> (Vec<(f64, f64)>, Matrix3<f64>) {
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    let (cx, cy) = (sx / n, sy / n);

    let mean_dist = points
        .iter()
        .map(|&(x, y)| (((x - cx).powi(2) + (y - cy).powi(2)).sqrt()))
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-12 { 2.0_f64.sqrt() / mean_dist } else { 1.0 };

    let normalized: Vec<(f64, f64)> = points
        .iter()
        .map(|&(x, y)| (scale * (x - cx), scale * (y - cy)))
        .collect();

    #[rustfmt::skip]
    let t = Matrix3::new(
        scale, 0.0,   -scale * cx,
        0.0,   scale, -scale * cy,
        0.0,   0.0,   1.0,
    );

    (normalized, t)
}

/// Solves for the homography `H` such that `dst ~ H * src` (in homogeneous
/// coordinates) via normalized DLT + SVD, following the classic
/// Hartley-Zisserman construction.
pub fn estimate_dlt(correspondences: &[((f64, f64), (f64, f64))]) -> Result<Homography> {
    if correspondences.len() < 4 {
        return Err(HologramError::Pipeline(
            "at least 4 point correspondences are required to solve a homography".into(),
        ));
    }

    let src_pts: Vec<(f64, f64)> = correspondences.iter().map(|c| c.0).collect();
    let dst_pts: Vec<(f64, f64)> = correspondences.iter().map(|c| c.1).collect();

    let (src_norm, t_src) = normalize(&src_pts);
    let (dst_norm, t_dst) = normalize(&dst_pts);

    let n = correspondences.len();
    let mut a = nalgebra::DMatrix::<f64>::zeros(2 * n, 9);

    for i in 0..n {
        let (x, y) = src_norm[i];
        let (xp, yp) = dst_norm[i];

        a.set_row(2 * i, &nalgebra::RowDVector::from_vec(vec![
            -x, -y, -1.0, 0.0, 0.0, 0.0, xp * x, xp * y, xp,
        ]));
        a.set_row(2 * i + 1, &nalgebra::RowDVector::from_vec(vec![
            0.0, 0.0, 0.0, -x, -y, -1.0, yp * x, yp * y, yp,
        ]));
    }

    let svd = SVD::new(a, true, true);
    let v_t = svd
        .v_t
        .ok_or_else(|| HologramError::Pipeline("SVD failed to produce V^T".into()))?;
    // Solution is the right singular vector of smallest singular value,
    // i.e. the last row of V^T.
    let h_vec = v_t.row(v_t.nrows() - 1);

    #[rustfmt::skip]
    let h_norm = Matrix3::new(
        h_vec[0], h_vec[1], h_vec[2],
        h_vec[3], h_vec[4], h_vec[5],
        h_vec[6], h_vec[7], h_vec[8],
    );

    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HologramError::Pipeline("degenerate point normalization".into()))?;

    let h = t_dst_inv * h_norm * t_src;
    let h = if h[(2, 2)].abs() > 1e-12 { h / h[(2, 2)] } else { h };

    Ok(Homography(h))
}

/// Robustly estimates a homography with RANSAC: repeatedly samples minimal
/// 4-point subsets, counts inliers under `threshold` reprojection error, and
/// keeps the best-supported model, refined on its full inlier set.
///
/// Sampling uses a PCG64 RNG seeded from `seed` so results are reproducible
/// across runs given the same correspondences and seed.
pub fn estimate_ransac(
    correspondences: &[((f64, f64), (f64, f64))],
    threshold: f64,
    max_iterations: usize,
    seed: u64,
) -> Result<(Homography, Vec<usize>)> {
    if correspondences.len() < 4 {
        return Err(HologramError::Pipeline(
            "at least 4 point correspondences are required for RANSAC".into(),
        ));
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let indices: Vec<usize> = (0..correspondences.len()).collect();

    let mut best_inliers: Vec<usize> = Vec::new();
    let mut best_model: Option<Homography> = None;

    for _ in 0..max_iterations {
        let sample: Vec<usize> = indices
            .choose_multiple(&mut rng, 4)
            .copied()
            .collect();
        if sample.len() < 4 {
            continue;
        }
        let subset: Vec<((f64, f64), (f64, f64))> = sample.iter().map(|&i| correspondences[i]).collect();

        let model = match estimate_dlt(&subset) {
            Ok(m) => m,
            Err(_) => continue,
        };

        let inliers: Vec<usize> = correspondences
            .iter()
            .enumerate()
            .filter(|(_, &(src, dst))| {
                let (px, py) = model.apply(src.0, src.1);
                let err = ((px - dst.0).powi(2) + (py - dst.1).powi(2)).sqrt();
                err.is_finite() && err < threshold
            })
            .map(|(i, _)| i)
            .collect();

        if inliers.len() > best_inliers.len() {
            best_inliers = inliers;
            best_model = Some(model);
        }
    }

    let best_model = best_model.ok_or_else(|| {
        HologramError::Pipeline("RANSAC failed to find any consistent homography".into())
    })?;

    if best_inliers.len() < 4 {
        return Err(HologramError::Pipeline(
            "RANSAC could not find enough inliers to refine a homography".into(),
        ));
    }

    let refine_set: Vec<((f64, f64), (f64, f64))> =
        best_inliers.iter().map(|&i| correspondences[i]).collect();
    let refined = estimate_dlt(&refine_set).unwrap_or(best_model);

    Ok((refined, best_inliers))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pure_translation_correspondences(dx: f64, dy: f64) -> Vec<((f64, f64), (f64, f64))> {
        let src = [
            (10.0, 10.0),
            (100.0, 10.0),
            (100.0, 100.0),
            (10.0, 100.0),
            (50.0, 50.0),
            (30.0, 70.0),
        ];
        src.iter().map(|&(x, y)| ((x, y), (x + dx, y + dy))).collect()
    }

    #[test]
    fn dlt_recovers_pure_translation() {
        let corr = pure_translation_correspondences(5.0, -3.0);
        let h = estimate_dlt(&corr).unwrap();
        let (px, py) = h.apply(10.0, 10.0);
        assert!((px - 15.0).abs() < 1e-6);
        assert!((py - 7.0).abs() < 1e-6);
    }

    #[test]
    fn ransac_rejects_outliers() {
        let mut corr = pure_translation_correspondences(5.0, -3.0);
        // Inject an outlier correspondence that's wildly inconsistent.
        corr.push(((500.0, 500.0), (0.0, 0.0)));
        corr.push(((1.0, 1.0), (900.0, 900.0)));

        let (h, inliers) = estimate_ransac(&corr, 3.0, 200, 42).unwrap();
        assert!(inliers.len() >= 6);
        let (px, py) = h.apply(10.0, 10.0);
        assert!((px - 15.0).abs() < 1.0);
        assert!((py - 7.0).abs() < 1.0);
    }

    #[test]
    fn estimate_dlt_requires_minimum_points() {
        let corr = vec![((0.0, 0.0), (1.0, 1.0))];
        assert!(estimate_dlt(&corr).is_err());
    }
}
