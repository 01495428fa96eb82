use super::features::{Descriptor, KeyPoint};

/// A putative match between a reference keypoint and a target keypoint.
#[derive(Clone, Copy, Debug)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
}

/// For every reference descriptor, finds its two nearest neighbors in the
/// target set and keeps the match only if Lowe's ratio test passes:
/// `best_distance < ratio * second_best_distance`.
///
/// Uses Hamming distance for [`Descriptor::Binary`] pairs, squared L2 for
/// [`Descriptor::Float`] pairs.
pub fn match_descriptors(reference: &[Descriptor], target: &[Descriptor], ratio: f32) -> Vec<Match> {
    let mut matches = Vec::new();

    for (qi, q) in reference.iter().enumerate() {
        let mut best: Option<(usize, f64)> = None;
        let mut second: Option<f64> = None;

        for (ti, t) in target.iter().enumerate() {
            let dist = distance(q, t);
            match best {
                None => best = Some((ti, dist)),
                Some((_, best_dist)) if dist < best_dist => {
                    second = Some(best_dist);
                    best = Some((ti, dist));
                }
                Some(_) => {
                    if second.map_or(true, |s| dist < s) {
                        second = Some(dist);
                    }
                }
            }
        }

        if let (Some((ti, best_dist)), Some(second_dist)) = (best, second) {
            if best_dist < (ratio as f64) * second_dist {
                matches.push(Match {
                    query_idx: qi,
                    train_idx: ti,
                });
            }
        } else if let Some((ti, _)) = best {
            // Only one target descriptor total: nothing to rule it out with.
            matches.push(Match {
                query_idx: qi,
                train_idx: ti,
            });
        }
    }

    matches
}

fn distance(a: &Descriptor, b: &Descriptor) -> f64 {
    match (a, b) {
        (Descriptor::Binary(_), Descriptor::Binary(_)) => a.hamming(b) as f64,
        (Descriptor::Float(_), Descriptor::Float(_)) => a.l2_squared(b) as f64,
        _ => f64::INFINITY,
    }
}

/// Converts matched index pairs into coordinate pairs `(ref_pt, target_pt)`
/// ready for homography estimation.
pub fn matched_points(
    ref_kps: &[KeyPoint],
    target_kps: &[KeyPoint],
    matches: &[Match],
) -> Vec<((f64, f64), (f64, f64))> {
    matches
        .iter()
        .map(|m| {
            let r = ref_kps[m.query_idx];
            let t = target_kps[m.train_idx];
            ((r.x as f64, r.y as f64), (t.x as f64, t.y as f64))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_descriptors_match() {
        let a = vec![Descriptor::Binary(vec![1, 2, 3, 4])];
        let b = vec![
            Descriptor::Binary(vec![1, 2, 3, 4]),
            Descriptor::Binary(vec![u64::MAX; 4]),
        ];
        let matches = match_descriptors(&a, &b, 0.75);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].train_idx, 0);
    }

    #[test]
    fn ambiguous_match_is_rejected_by_ratio_test() {
        let a = vec![Descriptor::Binary(vec![0, 0, 0, 0])];
        let b = vec![
            Descriptor::Binary(vec![0b1, 0, 0, 0]),
            Descriptor::Binary(vec![0b11, 0, 0, 0]),
        ];
        let matches = match_descriptors(&a, &b, 0.75);
        assert!(matches.is_empty());
    }
}
